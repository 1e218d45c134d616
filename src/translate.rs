//! Natural-language to SQL translation.
//!
//! The prompt declares the exact `cv_records` schema, restricts output to
//! a single SELECT with a fixed row cap, and forbids markup. The raw
//! response is still treated as untrusted: fences and stray quotes are
//! stripped, a terminator is appended, and the statement shape is
//! validated: anything but a single SELECT is rejected before it ever
//! reaches the executor.

use crate::error::AgentError;
use crate::llm::{strip_code_fences, LlmClient};

/// Translate `query` into a validated single-SELECT statement.
pub async fn generate_sql(
    llm: &dyn LlmClient,
    query: &str,
    row_cap: i64,
) -> Result<String, AgentError> {
    let prompt = translation_prompt(query, row_cap);
    let raw = llm
        .complete(&prompt)
        .await
        .map_err(|e| AgentError::Translation(e.to_string()))?;

    let sql = normalize_sql(&raw);
    ensure_single_select(&sql)?;
    Ok(sql)
}

/// Clean up raw model output: strip code fences, strip one pair of
/// surrounding quotes, and make sure the statement ends with `;`.
pub fn normalize_sql(raw: &str) -> String {
    let mut sql = strip_code_fences(raw);

    for quote in ['"', '\''] {
        if sql.len() >= 2 && sql.starts_with(quote) && sql.ends_with(quote) {
            sql = sql[1..sql.len() - 1].to_string();
            break;
        }
    }

    let mut sql = sql.trim().to_string();
    if !sql.ends_with(';') {
        sql.push(';');
    }
    sql
}

/// Reject anything that is not a single SELECT statement.
pub fn ensure_single_select(sql: &str) -> Result<(), AgentError> {
    let body = sql.trim().trim_end_matches(';').trim();

    if body.is_empty() {
        return Err(AgentError::UnsafeQueryRejected(
            "empty statement".to_string(),
        ));
    }
    if body.contains(';') {
        return Err(AgentError::UnsafeQueryRejected(
            "multiple statements".to_string(),
        ));
    }

    let first_word = body.split_whitespace().next().unwrap_or("");
    if !first_word.eq_ignore_ascii_case("select") {
        return Err(AgentError::UnsafeQueryRejected(format!(
            "only SELECT is allowed, got '{}'",
            first_word
        )));
    }

    Ok(())
}

fn translation_prompt(query: &str, row_cap: i64) -> String {
    format!(
        r#"You are an SQL expert. Convert this request into a SQLite query.

SCHEMA OF TABLE cv_records:
- id (TEXT)
- fingerprint (TEXT)
- filename (TEXT)
- ingested_at (INTEGER, unix timestamp)
- name (TEXT)
- email (TEXT)
- phone (TEXT)
- address (TEXT)
- experiences (TEXT, JSON array of objects with title, organization, period, description)
- formations (TEXT, JSON array of objects with credential, institution, year)
- competences (TEXT, JSON array of strings)
- languages (TEXT, JSON array of strings)
- summary (TEXT)
- full_text (TEXT)

REQUEST: {query}

STRICT RULES:
1. Use ONLY a single SELECT statement
2. To search inside JSON arrays use: EXISTS (SELECT 1 FROM json_each(competences) WHERE json_each.value LIKE '%skill%')
3. For free-text matching use LIKE with %
4. Cap results with LIMIT {row_cap}
5. Return ONLY the SQL query, no explanation and no formatting
6. Do not wrap the query in quotes or code fences
7. Make sure the SQL syntax is valid SQLite

CORRECT EXAMPLES:
- "resumes with Python" -> SELECT * FROM cv_records WHERE EXISTS (SELECT 1 FROM json_each(competences) WHERE json_each.value LIKE '%Python%') LIMIT {row_cap};
- "senior profiles" -> SELECT * FROM cv_records WHERE summary LIKE '%senior%' LIMIT {row_cap};

SQL:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_fence_and_adds_terminator() {
        let raw = "```sql\nSELECT * FROM cv_records LIMIT 10\n```";
        assert_eq!(normalize_sql(raw), "SELECT * FROM cv_records LIMIT 10;");
    }

    #[test]
    fn normalize_strips_one_pair_of_quotes() {
        assert_eq!(
            normalize_sql("\"SELECT name FROM cv_records;\""),
            "SELECT name FROM cv_records;"
        );
        assert_eq!(
            normalize_sql("'SELECT name FROM cv_records'"),
            "SELECT name FROM cv_records;"
        );
    }

    #[test]
    fn normalize_keeps_interior_quotes() {
        let raw = "SELECT * FROM cv_records WHERE name LIKE '%Doe%'";
        assert_eq!(
            normalize_sql(raw),
            "SELECT * FROM cv_records WHERE name LIKE '%Doe%';"
        );
    }

    #[test]
    fn select_passes_validation() {
        ensure_single_select("SELECT * FROM cv_records LIMIT 10;").unwrap();
        ensure_single_select("select name from cv_records;").unwrap();
    }

    #[test]
    fn non_select_is_rejected() {
        for sql in [
            "DROP TABLE cv_records;",
            "DELETE FROM cv_records;",
            "UPDATE cv_records SET name = 'x';",
            "INSERT INTO cv_records DEFAULT VALUES;",
            "PRAGMA journal_mode = DELETE;",
        ] {
            let err = ensure_single_select(sql).unwrap_err();
            assert!(
                matches!(err, AgentError::UnsafeQueryRejected(_)),
                "{sql} should be rejected"
            );
        }
    }

    #[test]
    fn stacked_statements_are_rejected() {
        let err =
            ensure_single_select("SELECT 1; DROP TABLE cv_records;").unwrap_err();
        assert!(matches!(err, AgentError::UnsafeQueryRejected(_)));
    }

    #[test]
    fn empty_statement_is_rejected() {
        assert!(matches!(
            ensure_single_select(";"),
            Err(AgentError::UnsafeQueryRejected(_))
        ));
    }

    #[test]
    fn prompt_declares_schema_and_cap() {
        let prompt = translation_prompt("developers who know python", 10);
        assert!(prompt.contains("developers who know python"));
        assert!(prompt.contains("competences"));
        assert!(prompt.contains("LIMIT 10"));
        assert!(prompt.contains("single SELECT"));
    }
}
