//! Core data models used throughout the CV agent.
//!
//! These types represent the conversation log, the structured fields
//! extracted from a resume, and the outcomes that flow through the
//! ingestion and query pipeline.

use serde::{Deserialize, Serialize};

/// Who authored a conversation entry. Resolved once at construction,
/// never re-derived from the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single entry in the request's conversation log.
///
/// The log is append-only; the final user-facing reply is the last
/// assistant-authored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Classification of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryKind {
    #[default]
    Unclassified,
    /// The request is a path to a resume document to ingest.
    FilePath,
    /// The request is free text to answer against the structured store.
    NaturalLanguage,
}

/// One professional experience entry extracted from a resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub description: String,
}

/// One education entry extracted from a resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: String,
}

/// Structured fields extracted from a resume by the language model.
///
/// Every field defaults to empty so a partial model response still
/// deserializes. [`CvFields::placeholder`] is the fail-open sentinel
/// stored when the response is not parseable at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub formations: Vec<Formation>,
    #[serde(default)]
    pub competences: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// Summary text stored when the extraction response could not be parsed.
pub const PLACEHOLDER_SUMMARY: &str = "processing in progress";

impl CvFields {
    /// Default record substituted when extraction fails open.
    pub fn placeholder() -> Self {
        Self {
            summary: PLACEHOLDER_SUMMARY.to_string(),
            ..Self::default()
        }
    }
}

/// Identity of a record found by the existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    pub id: String,
    pub filename: String,
}

/// Result of persisting one resume.
///
/// `json_stored` reports the structured half; a failed embedding pass
/// downgrades to `chunks_stored = 0` plus a warning instead of failing
/// the whole operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome {
    pub record_id: String,
    pub chunks_stored: u64,
    pub json_stored: bool,
    pub warning: Option<String>,
}

/// One result row from the query executor: an ordered mapping from
/// column name to value, in the column order of the statement.
pub type ResultRow = serde_json::Map<String, serde_json::Value>;
