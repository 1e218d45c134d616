//! Content loader: reads a resume from disk, normalizes its text, and
//! computes the content fingerprint used as the dedupe key.
//!
//! `.pdf` files go through `pdf-extract`; any other extension is read as
//! UTF-8 plain text. Normalization strips control characters (keeping
//! ordinary whitespace), collapses whitespace runs to single spaces, and
//! trims, so byte-identical content always fingerprints the same no
//! matter which path it came from.

use md5::{Digest, Md5};
use std::path::Path;

use crate::error::AgentError;

/// Normalized document ready for the pipeline.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub text: String,
    pub fingerprint: String,
    pub filename: String,
}

/// Load and normalize a document from `path`.
pub fn load_document(path: &Path) -> Result<LoadedDocument, AgentError> {
    if !path.exists() {
        return Err(AgentError::NotFound(path.display().to_string()));
    }

    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let raw = if is_pdf {
        pdf_extract::extract_text(path).map_err(|e| AgentError::Load(e.to_string()))?
    } else {
        std::fs::read_to_string(path).map_err(|e| AgentError::Load(e.to_string()))?
    };

    let text = clean_text(&raw);
    let fingerprint = fingerprint(&text);
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown.pdf".to_string());

    Ok(LoadedDocument {
        text,
        fingerprint,
        filename,
    })
}

/// Strip non-printable characters and collapse whitespace runs.
pub fn clean_text(raw: &str) -> String {
    let printable: String = raw
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic 128-bit digest of the normalized text, hex-encoded
/// (32 chars, the fixed-length dedupe key in the schema).
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn clean_text_strips_control_chars() {
        let raw = "Jane\u{0}\u{1} Doe\u{7f}";
        assert_eq!(clean_text(raw), "Jane Doe");
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        let raw = "  Jane\n\nDoe\t\tEngineer  ";
        assert_eq!(clean_text(raw), "Jane Doe Engineer");
    }

    #[test]
    fn fingerprint_is_stable_and_hex() {
        let a = fingerprint("Jane Doe Engineer");
        let b = fingerprint("Jane Doe Engineer");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_changes_with_content() {
        assert_ne!(fingerprint("Jane Doe"), fingerprint("John Doe"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_document(Path::new("/definitely/not/here.pdf")).unwrap_err();
        match err {
            AgentError::NotFound(path) => assert!(path.contains("not/here.pdf")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_load_normalizes_and_fingerprints() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("resume.txt");
        fs::write(&path, "Jane Doe\n\nSenior   Rust Engineer\u{0}").unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.text, "Jane Doe Senior Rust Engineer");
        assert_eq!(doc.fingerprint, fingerprint("Jane Doe Senior Rust Engineer"));
        assert_eq!(doc.filename, "resume.txt");
    }

    #[test]
    fn identical_content_from_two_paths_shares_a_fingerprint() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("subdir");
        fs::create_dir_all(&b).unwrap();
        let b = b.join("b.txt");
        fs::write(&a, "Same resume body").unwrap();
        fs::write(&b, "Same resume body").unwrap();

        let doc_a = load_document(&a).unwrap();
        let doc_b = load_document(&b).unwrap();
        assert_eq!(doc_a.fingerprint, doc_b.fingerprint);
        assert_ne!(doc_a.filename, doc_b.filename);
    }
}
