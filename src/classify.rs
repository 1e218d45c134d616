//! Request classifier: file path or natural language.
//!
//! A heuristic, not a parser: the trimmed, lower-cased request is a file
//! path when it ends in `.pdf` AND either contains a path separator or
//! names an existing filesystem entry. Everything else is treated as a
//! natural-language query.
//!
//! Known edge case, kept on purpose: a bare filename with no separator
//! that happens to exist in the working directory classifies as a file
//! path, while natural language merely containing ".pdf" does not.

use std::path::Path;

use crate::models::QueryKind;

pub fn classify(query: &str) -> QueryKind {
    let trimmed = query.trim();
    let lowered = trimmed.to_lowercase();

    if lowered.ends_with(".pdf")
        && (trimmed.contains('/') || trimmed.contains('\\') || Path::new(trimmed).exists())
    {
        QueryKind::FilePath
    } else {
        QueryKind::NaturalLanguage
    }
}
