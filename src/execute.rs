//! Query executor: runs a translated SELECT and normalizes the rows.
//!
//! Every row becomes an ordered column-name → value mapping, with the
//! JSON-typed columns decoded into native arrays. Any database error
//! (syntax, permission, timeout) surfaces as `Execution`, reported rather
//! than retried, and never "repaired".

use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool};

use crate::error::AgentError;
use crate::models::ResultRow;

/// Columns stored as JSON text that callers expect as native values.
const JSON_COLUMNS: [&str; 4] = ["experiences", "formations", "competences", "languages"];

/// Execute `sql` and return one ordered mapping per row.
pub async fn run_query(pool: &SqlitePool, sql: &str) -> Result<Vec<ResultRow>, AgentError> {
    let rows = sqlx::query(sql)
        .fetch_all(pool)
        .await
        .map_err(|e| AgentError::Execution(e.to_string()))?;

    Ok(rows.iter().map(row_to_map).collect())
}

fn row_to_map(row: &SqliteRow) -> ResultRow {
    let mut map = ResultRow::new();
    for column in row.columns() {
        let name = column.name().to_string();
        let mut value = decode_value(row, column.ordinal());

        // Decode JSON-typed columns into native lists/objects.
        if JSON_COLUMNS.contains(&name.as_str()) {
            if let Value::String(ref s) = value {
                if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                    value = parsed;
                }
            }
        }

        map.insert(name, value);
    }
    map
}

/// Best-effort dynamic decode: SQLite values are integers, reals, text,
/// blobs, or NULL; expression columns carry no declared type.
fn decode_value(row: &SqliteRow, ordinal: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(ordinal) {
        return match v {
            Some(n) => Value::from(n),
            None => Value::Null,
        };
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(ordinal) {
        return match v {
            Some(n) => Value::from(n),
            None => Value::Null,
        };
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(ordinal) {
        return match v {
            Some(s) => Value::String(s),
            None => Value::Null,
        };
    }
    // Blobs (embeddings) have no JSON shape worth rendering.
    Value::Null
}
