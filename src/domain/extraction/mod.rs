//! Recovery and typing of model extraction output.

mod coerce;
mod values;

pub use coerce::{coerce_json, CoerceError, MAX_RESPONSE_LENGTH};
pub use values::{parse_extraction, ExtractedValue, SmartQuestion, CONFIDENCE_THRESHOLD};
