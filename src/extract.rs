//! Field extraction: document text in, structured [`CvFields`] out.
//!
//! The prompt pins the exact JSON schema and the parser fails open: a
//! response that is not valid JSON for that schema is logged and replaced
//! by a placeholder record so a flaky model never aborts an ingestion.
//! Only a failed call (transport, timeout) is a hard error.

use crate::error::AgentError;
use crate::llm::{strip_code_fences, LlmClient};
use crate::models::CvFields;

/// Ask the model for structured fields and parse the response fail-open.
pub async fn extract_fields(llm: &dyn LlmClient, text: &str) -> Result<CvFields, AgentError> {
    let prompt = extraction_prompt(text);
    let raw = llm
        .complete(&prompt)
        .await
        .map_err(|e| AgentError::Extraction(e.to_string()))?;
    Ok(parse_extraction(&raw))
}

/// Parse a raw model response into [`CvFields`].
///
/// Strips code fences first. On any parse failure, returns
/// [`CvFields::placeholder`] instead of an error (fail-open: data
/// completeness is traded for pipeline robustness).
pub fn parse_extraction(raw: &str) -> CvFields {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<CvFields>(&cleaned) {
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!(error = %e, "extraction response was not valid JSON; storing placeholder record");
            CvFields::placeholder()
        }
    }
}

fn extraction_prompt(text: &str) -> String {
    format!(
        r#"Analyze this resume and extract its information as STRICT JSON.

Resume content: {text}

You MUST return valid JSON with exactly this structure:
{{
    "name": "full name or empty",
    "email": "email or empty",
    "phone": "phone number or empty",
    "address": "full address or empty",
    "experiences": [
        {{"title": "job title", "organization": "employer name", "period": "time period", "description": "short description"}}
    ],
    "formations": [
        {{"credential": "degree or certificate", "institution": "school name", "year": "year"}}
    ],
    "competences": ["skill1", "skill2"],
    "languages": ["language1", "language2"],
    "summary": "one-sentence professional summary"
}}

IMPORTANT:
- Return ONLY the JSON, no explanation
- Use empty strings "" for missing fields
- Use empty arrays [] for missing lists"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLACEHOLDER_SUMMARY;

    #[test]
    fn valid_response_parses() {
        let raw = r#"{
            "name": "Jane Doe",
            "email": "jane@example.com",
            "experiences": [
                {"title": "Engineer", "organization": "Acme", "period": "2020-2024", "description": "Rust services"}
            ],
            "competences": ["Rust", "SQL"],
            "summary": "Systems engineer."
        }"#;
        let fields = parse_extraction(raw);
        assert_eq!(fields.name, "Jane Doe");
        assert_eq!(fields.experiences.len(), 1);
        assert_eq!(fields.experiences[0].organization, "Acme");
        assert_eq!(fields.competences, vec!["Rust", "SQL"]);
        // Fields the model omitted default to empty.
        assert_eq!(fields.phone, "");
        assert!(fields.formations.is_empty());
    }

    #[test]
    fn fenced_response_parses() {
        let raw = "```json\n{\"name\": \"Jane Doe\"}\n```";
        assert_eq!(parse_extraction(raw).name, "Jane Doe");
    }

    #[test]
    fn malformed_response_fails_open() {
        let fields = parse_extraction("I could not process this resume, sorry!");
        assert_eq!(fields.summary, PLACEHOLDER_SUMMARY);
        assert_eq!(fields.name, "");
        assert!(fields.experiences.is_empty());
        assert!(fields.competences.is_empty());
    }

    #[test]
    fn wrong_shape_fails_open() {
        // competences as a string instead of an array
        let fields = parse_extraction(r#"{"name": "Jane", "competences": "Rust"}"#);
        assert_eq!(fields.summary, PLACEHOLDER_SUMMARY);
    }

    #[test]
    fn prompt_pins_the_schema() {
        let prompt = extraction_prompt("some resume text");
        assert!(prompt.contains("some resume text"));
        assert!(prompt.contains("\"experiences\""));
        assert!(prompt.contains("\"formations\""));
        assert!(prompt.contains("ONLY the JSON"));
    }
}
