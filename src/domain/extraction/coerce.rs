//! JSON recovery for model replies.
//!
//! Replies rarely arrive as clean JSON. They come fenced in markdown,
//! padded with prose, or broken by literal control characters. This
//! module works through progressively more aggressive cleanup passes
//! until one of them parses.

use thiserror::Error;

/// Maximum allowed model response length (100KB).
pub const MAX_RESPONSE_LENGTH: usize = 100_000;

/// Errors that can occur while recovering JSON from a model reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoerceError {
    #[error("Response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("No parseable JSON in response: {reason}")]
    Unparseable { reason: String },
}

/// Recovers a JSON value from a raw model reply.
///
/// # Passes
/// 1. Strip markdown code fences
/// 2. Parse directly
/// 3. Collapse literal whitespace and reparse
/// 4. Extract the outermost balanced object or array and reparse
pub fn coerce_json(response: &str) -> Result<serde_json::Value, CoerceError> {
    if response.len() > MAX_RESPONSE_LENGTH {
        return Err(CoerceError::TooLong {
            max: MAX_RESPONSE_LENGTH,
            actual: response.len(),
        });
    }

    let trimmed = response.trim();
    let cleaned = strip_code_fences(trimmed).unwrap_or_else(|| trimmed.to_string());

    // Most replies parse as-is once fences are gone.
    let direct_err = match serde_json::from_str(&cleaned) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    // Raw newlines or tabs inside string literals are invalid JSON;
    // collapsing them to spaces often rescues the document.
    if let Ok(value) = serde_json::from_str(&normalize_whitespace(&cleaned)) {
        return Ok(value);
    }

    // Last resort: pull the outermost balanced object or array out of
    // surrounding prose and parse that.
    if let Some(span) = balanced_span(&cleaned) {
        if let Ok(value) = serde_json::from_str(span) {
            return Ok(value);
        }
        if let Ok(value) = serde_json::from_str(&normalize_whitespace(span)) {
            return Ok(value);
        }
    }

    Err(CoerceError::Unparseable {
        reason: direct_err.to_string(),
    })
}

/// Strips markdown code fences, returning the fenced body if one exists.
fn strip_code_fences(s: &str) -> Option<String> {
    // Look for ```json ... ``` or ``` ... ```
    let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for pattern in patterns {
        if let Some(start) = s.find(pattern) {
            let body_start = start + pattern.len();
            if let Some(end) = s[body_start..].find("```") {
                return Some(s[body_start..body_start + end].trim().to_string());
            }
        }
    }

    // Opener jammed against the payload, as in "```json{...}```".
    if s.contains("```") {
        return Some(s.replace("```json", "").replace("```", "").trim().to_string());
    }

    None
}

/// Replaces newlines and tabs with spaces and collapses runs of spaces.
fn normalize_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_space = false;

    for c in s.chars() {
        let c = match c {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        };
        if c == ' ' {
            if !last_was_space {
                result.push(' ');
            }
            last_was_space = true;
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result.trim().to_string()
}

/// Finds the outermost balanced `{...}` or `[...]` span, whichever opens
/// first, tracking string literals so braces inside values don't count.
fn balanced_span(s: &str) -> Option<&str> {
    let obj_start = s.find('{');
    let arr_start = s.find('[');

    let (start, open, close) = match (obj_start, arr_start) {
        (Some(o), Some(a)) if a < o => (a, '[', ']'),
        (Some(o), _) => (o, '{', '}'),
        (None, Some(a)) => (a, '[', ']'),
        (None, None) => return None,
    };

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
