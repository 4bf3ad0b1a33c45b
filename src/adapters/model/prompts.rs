//! Prompt assembly for the extraction model.
//!
//! Every prompt demands raw JSON output. Models still wrap answers in
//! code fences often enough that the coercion layer cleans up after
//! them rather than trusting the instruction alone.

/// System prompt shared by question generation and extraction.
pub const JSON_ONLY_SYSTEM_PROMPT: &str = r#"You are a JSON-only conversational form assistant. You MUST ONLY return valid JSON responses. Never include explanatory text, comments, or conversational responses outside of JSON.

CRITICAL RULES:
1. ALWAYS return ONLY valid JSON, no other text
2. Never include explanations, comments, or conversational text
3. Never ask questions about the format, just return JSON
4. For questions: create natural, friendly questions that group related fields
5. For extraction: extract values accurately from user responses
6. Handle field types appropriately (text, number, boolean, choice, date, file)

NO OTHER TEXT ALLOWED, ONLY JSON."#;

const SMART_QUESTION_INTRO: &str = r#"You are a conversational assistant that creates natural questions to collect form data.
Your goal is to group related fields and ask for them in a friendly, conversational way.

Based on the JSON Schema of available fields below, create a question:

JSON Schema of available fields:
"#;

const SMART_QUESTION_RULES: &str = r#"

INSTRUCTIONS:
1. Examine the schema's "properties" to see the available fields.
2. ALL fields provided in the schema should be included in your question (up to 4 fields maximum).
3. Create a single, friendly, conversational message asking for ALL the provided fields.
4. Group the fields logically in your question (e.g., name+email+phone, address fields, preferences).
5. NEVER include field IDs, technical names, or enum values in the conversational question.
6. Use the field's description, placeholder, or label to create natural questions.
7. For enum fields, don't list the options in the question. The widget presents them.

FIELD TYPE GUIDELINES:
- Text fields: ask naturally ("What's your name?", "What's your email?")
- Number fields: be specific ("How old are you?", "How many guests are coming?")
- Boolean fields: ask yes/no questions ("Do you agree to the terms?")
- Choice fields: ask for a preference ("What's your preferred contact method?")
- Date fields: be specific about the date needed ("When were you born?")
- File fields: be clear about what to upload ("Please upload your resume")

GROUPING EXAMPLES (GOOD):
- "Let's start with your basic information. What's your full name, email address, and phone number?"
- "Tell me about your address. What's your street address, city, state, and zip code?"

EXAMPLES OF WHAT NOT TO DO (BAD):
- "Could you provide your first name (textinput-400472a990) and last name (textinput-5dba1787fa)?"
- "Please enter your name (firstName) and email (emailAddress)."
- "Choose from: email, phone, sms" (the widget shows the options)

CRITICAL: You MUST return ONLY a single, valid JSON object. No other text, explanations, or comments.

REQUIRED JSON FORMAT:
{
  "message": "A conversational question asking for the selected fields naturally.",
  "requestedFields": ["field_id_1", "field_id_2", "field_id_3"]
}

The "requestedFields" array must contain the actual field ids from the schema (the "id" values), not placeholder values.

IMPORTANT: Include ALL fields provided in the schema in your question and in the requestedFields array. Do not skip any fields.

Now create a question for ALL the provided fields and return the JSON."#;

const EXTRACTION_INTRO: &str = r#"You are an expert at extracting structured information from user input.
Your task is to extract values for the fields defined in the provided JSON schema from the user's content.
You must always answer with valid JSON as an array of objects.

User provided content:
---
"#;

const EXTRACTION_SCHEMA_HEADER: &str = r#"
---

JSON Schema of fields to extract:
---
"#;

const EXTRACTION_RULES: &str = r#"
---

INSTRUCTIONS:
For each field in the JSON schema, create a JSON object with the following properties:
1. `name`: the field name from the schema (e.g., "firstName", "email").
2. `value`: the data extracted from the user's content for that field.
3. `confidence`: a score from 0.0 (uncertain) to 1.0 (certain) of your confidence.
4. `reasoning`: a brief explanation of why you extracted that value or why it is missing.

EXTRACTION RULES BY FIELD TYPE:
- Text fields: extract the actual text value
- Number fields: extract numeric values, handle ranges and approximations
- Boolean fields: look for yes/no, true/false, agree/disagree patterns
- Choice fields: match user input to enum values, use the closest match
- Date fields: parse various date formats and output them as YYYY-MM-DD
- File fields: extract file names or descriptions mentioned

SPECIAL HANDLING:
- Explicit user refusal: if the user says "skip", "don't want to", "I won't say", or similar:
  - set `value` to null
  - set `confidence` to 1.0
  - set `reasoning` to "User explicitly refused to provide this information."
- Information not found: if a field is not mentioned:
  - set `value` to null
  - set `confidence` to 0.0
  - set `reasoning` to "Information not found in the provided content."
- For enum fields, choose the closest matching option from the enum list.
- For boolean fields, convert yes/no responses to true/false.

CRITICAL: Your final output must be a single JSON array containing an object for EACH field in the schema. Do not include any other text or explanations.

REQUIRED JSON FORMAT (EXAMPLE):
[
  {
    "name": "firstName",
    "value": "John",
    "confidence": 0.95,
    "reasoning": "The user said 'My name is John'."
  },
  {
    "name": "email",
    "value": "john@example.com",
    "confidence": 0.9,
    "reasoning": "The user provided their email address."
  },
  {
    "name": "agreement",
    "value": null,
    "confidence": 1.0,
    "reasoning": "User explicitly refused to provide this information."
  }
]"#;

/// Builds the question-generation prompt around a serialized field schema.
pub fn smart_question_prompt(schema_json: &str) -> String {
    format!(
        "{}{}{}",
        SMART_QUESTION_INTRO, schema_json, SMART_QUESTION_RULES
    )
}

/// Builds the extraction prompt around the user's content and the schema.
pub fn extraction_prompt(schema_json: &str, user_content: &str) -> String {
    format!(
        "{}{}{}{}{}",
        EXTRACTION_INTRO, user_content, EXTRACTION_SCHEMA_HEADER, schema_json, EXTRACTION_RULES
    )
}
