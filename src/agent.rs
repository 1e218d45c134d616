//! The agent orchestrator: a small state machine that decides, per
//! request, whether it is a file-ingestion job or a query job, and
//! sequences the pipeline with error short-circuiting at each step.
//!
//! ```text
//! classify ──▶ load ──▶ check_existence ──▶ extract ──▶ store ──▶ done
//!     │                      │
//!     │                      └──▶ already_exists ──▶ done
//!     └──▶ translate ──▶ execute ──▶ done
//!
//! any step that sets an error ──▶ fail ──▶ done
//! ```
//!
//! The transition function [`next_step`] is pure: it looks only at the
//! step that just completed and the resulting state. Once `error` is set
//! it routes to [`Step::Fail`] no matter what else the state says, and no
//! later step writes anything.
//!
//! State is an owned [`AgentState`] passed by value into each step and
//! returned, never shared or aliased. The final user-facing message is
//! the last assistant-authored entry in the conversation log.

use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::classify::classify;
use crate::config::Config;
use crate::db;
use crate::embedding::{create_embedder, Embedder};
use crate::error::AgentError;
use crate::execute::run_query;
use crate::extract::extract_fields;
use crate::llm::{create_llm, LlmClient};
use crate::loader::load_document;
use crate::migrate::run_migrations;
use crate::models::{CvFields, ExistingRecord, Message, QueryKind, ResultRow, StoreOutcome};
use crate::store::{find_by_fingerprint, persist};
use crate::translate::generate_sql;

/// Mutable request state threaded through the pipeline, owned by exactly
/// one step at a time.
#[derive(Debug, Default)]
pub struct AgentState {
    /// Append-only conversation log; the reply is its last assistant entry.
    pub messages: Vec<Message>,
    /// Raw user input.
    pub query: String,
    pub query_kind: QueryKind,
    pub file_path: Option<PathBuf>,
    pub document_text: Option<String>,
    pub fingerprint: Option<String>,
    pub filename: Option<String>,
    pub already_exists: bool,
    /// Identity of the matching record when `already_exists` is true.
    pub existing: Option<ExistingRecord>,
    pub extracted: Option<CvFields>,
    pub generated_sql: Option<String>,
    pub rows: Option<Vec<ResultRow>>,
    pub stored: Option<StoreOutcome>,
    /// Once set, every remaining transition routes to the error step.
    pub error: Option<AgentError>,
}

impl AgentState {
    pub fn new(request: &str) -> Self {
        Self {
            messages: vec![Message::user(request)],
            query: request.to_string(),
            ..Self::default()
        }
    }
}

/// Pipeline steps. `Fail` renders the error message; `Done` is the
/// single terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Classify,
    Load,
    CheckExistence,
    Extract,
    Store,
    AlreadyExists,
    Translate,
    Execute,
    Fail,
    Done,
}

/// Decide the step after `completed`, given the state it produced.
///
/// The error check comes first: once `error` is non-empty, everything
/// routes to `Fail` regardless of other state.
pub fn next_step(completed: Step, state: &AgentState) -> Step {
    if state.error.is_some() && completed != Step::Fail {
        return Step::Fail;
    }

    match completed {
        Step::Classify => match state.query_kind {
            QueryKind::FilePath => Step::Load,
            _ => Step::Translate,
        },
        Step::Load => Step::CheckExistence,
        Step::CheckExistence => {
            if state.already_exists {
                Step::AlreadyExists
            } else {
                Step::Extract
            }
        }
        Step::Extract => Step::Store,
        // Translation that produced no statement already answered (the
        // no-provider fallback); only a real statement goes to the executor.
        Step::Translate => {
            if state.generated_sql.is_some() {
                Step::Execute
            } else {
                Step::Done
            }
        }
        Step::Store | Step::Execute | Step::AlreadyExists | Step::Fail | Step::Done => Step::Done,
    }
}

/// Entry-contract reply: one human-readable message plus a success flag
/// for programmatic callers.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub message: String,
    pub ok: bool,
}

/// The CV agent. One instance serves many independent requests; the only
/// state shared between them is the database itself.
pub struct Agent {
    pool: SqlitePool,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
    config: Config,
}

impl Agent {
    /// Connect to the store (running migrations) and build the configured
    /// LLM and embedding clients.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        run_migrations(&pool).await?;
        let llm = create_llm(&config.llm)?;
        let embedder = create_embedder(&config.embedding)?;
        Ok(Self {
            pool,
            llm,
            embedder,
            config,
        })
    }

    /// Build an agent over explicit collaborators. Used by tests to
    /// substitute scripted LLM/embedding services.
    pub fn with_services(
        pool: SqlitePool,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn Embedder>,
        config: Config,
    ) -> Self {
        Self {
            pool,
            llm,
            embedder,
            config,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Handle a raw request string: classify, then run the pipeline.
    pub async fn ask(&self, request: &str) -> AgentReply {
        let state = self.run(AgentState::new(request), Step::Classify).await;
        reply_from(state)
    }

    /// Ingest a known file path, skipping classification.
    pub async fn ingest(&self, path: &std::path::Path) -> AgentReply {
        let mut state = AgentState::new(&format!("Add CV: {}", path.display()));
        state.query_kind = QueryKind::FilePath;
        state.file_path = Some(path.to_path_buf());
        let state = self.run(state, Step::Load).await;
        reply_from(state)
    }

    /// Run a natural-language query directly, skipping classification.
    pub async fn search(&self, query: &str) -> AgentReply {
        let mut state = AgentState::new(query);
        state.query_kind = QueryKind::NaturalLanguage;
        let state = self.run(state, Step::Translate).await;
        reply_from(state)
    }

    /// Free-form chat fallback: no retrieval, just the capability prompt.
    /// Without a configured provider it answers with the canned
    /// capabilities reply instead of erroring.
    pub async fn chat(&self, message: &str) -> anyhow::Result<String> {
        if !self.config.llm.is_enabled() {
            return Ok(capabilities_reply());
        }
        let prompt = format!(
            "You are an assistant specialized in resume (CV) management.\n\n\
             Question: {message}\n\n\
             Answer helpfully, explaining what you can do:\n\
             - store resumes (structured fields plus embeddings)\n\
             - search the resume base with natural-language queries\n\
             - analyze skills and profiles"
        );
        self.llm.complete(&prompt).await
    }

    /// Drive the state machine from `step` until terminal.
    pub async fn run(&self, mut state: AgentState, mut step: Step) -> AgentState {
        loop {
            state = self.run_step(step, state).await;
            let next = next_step(step, &state);
            if next == Step::Done {
                return state;
            }
            step = next;
        }
    }

    async fn run_step(&self, step: Step, mut state: AgentState) -> AgentState {
        match step {
            Step::Classify => {
                state.query_kind = classify(&state.query);
                if state.query_kind == QueryKind::FilePath {
                    state.file_path = Some(PathBuf::from(state.query.trim()));
                }
            }
            Step::Load => match &state.file_path {
                Some(path) => match load_document(path) {
                    Ok(doc) => {
                        state.document_text = Some(doc.text);
                        state.fingerprint = Some(doc.fingerprint);
                        state.filename = Some(doc.filename);
                    }
                    Err(e) => state.error = Some(e),
                },
                None => {
                    state.error = Some(AgentError::Load("no file path in request".to_string()));
                }
            },
            Step::CheckExistence => {
                let fingerprint = state.fingerprint.as_deref().unwrap_or_default();
                match find_by_fingerprint(&self.pool, fingerprint).await {
                    Ok(Some(existing)) => {
                        state.already_exists = true;
                        state.existing = Some(existing);
                    }
                    Ok(None) => state.already_exists = false,
                    Err(e) => state.error = Some(e),
                }
            }
            Step::Extract => {
                let text = state.document_text.as_deref().unwrap_or_default();
                match extract_fields(self.llm.as_ref(), text).await {
                    Ok(fields) => state.extracted = Some(fields),
                    Err(e) => state.error = Some(e),
                }
            }
            Step::Store => {
                let fields = state.extracted.clone().unwrap_or_default();
                let fingerprint = state.fingerprint.clone().unwrap_or_default();
                let filename = state
                    .filename
                    .clone()
                    .unwrap_or_else(|| "unknown.pdf".to_string());
                let text = state.document_text.clone().unwrap_or_default();

                match persist(
                    &self.pool,
                    self.embedder.as_ref(),
                    &self.config.chunking,
                    &fields,
                    &fingerprint,
                    &filename,
                    &text,
                )
                .await
                {
                    Ok(outcome) => {
                        let mut content = format!(
                            "CV stored successfully. id: {}, chunks: {}",
                            outcome.record_id, outcome.chunks_stored
                        );
                        if let Some(warning) = &outcome.warning {
                            content.push_str(&format!(" (warning: {warning})"));
                        }
                        state.messages.push(Message::assistant(content));
                        state.stored = Some(outcome);
                    }
                    Err(e) => state.error = Some(e),
                }
            }
            Step::AlreadyExists => {
                let content = match &state.existing {
                    Some(existing) => format!(
                        "This CV is already in the database (stored as {}).",
                        existing.filename
                    ),
                    None => "This CV is already in the database.".to_string(),
                };
                state.messages.push(Message::assistant(content));
            }
            Step::Translate => {
                if !self.config.llm.is_enabled() {
                    // No translator configured: answer with the canned
                    // capabilities reply instead of a hard error.
                    state.messages.push(Message::assistant(capabilities_reply()));
                } else {
                    match generate_sql(self.llm.as_ref(), &state.query, self.config.search.row_cap)
                        .await
                    {
                        Ok(sql) => state.generated_sql = Some(sql),
                        Err(e) => state.error = Some(e),
                    }
                }
            }
            Step::Execute => {
                let sql = state.generated_sql.as_deref().unwrap_or_default();
                match run_query(&self.pool, sql).await {
                    Ok(rows) => {
                        state.messages.push(Message::assistant(format_results(
                            &rows,
                            self.config.search.display_limit,
                        )));
                        state.rows = Some(rows);
                    }
                    Err(e) => state.error = Some(e),
                }
            }
            Step::Fail => {
                let content = match &state.error {
                    Some(e) => format!("Error: {e}"),
                    None => "Error: unknown failure".to_string(),
                };
                state.messages.push(Message::assistant(content));
            }
            Step::Done => {}
        }
        state
    }
}

/// What the agent can do, answered locally when no language model is
/// configured to translate or chat.
fn capabilities_reply() -> String {
    "No language model is configured, so I cannot translate this request \
     into a query. Once a provider is set under [llm] in the configuration \
     I can:\n\
     - store resumes (structured fields plus embeddings)\n\
     - search the resume base with natural-language queries\n\
     - analyze skills and profiles"
        .to_string()
}

/// Build the entry-contract reply from a terminal state.
fn reply_from(state: AgentState) -> AgentReply {
    let message = state
        .messages
        .iter()
        .rev()
        .find(|m| m.role == crate::models::Role::Assistant)
        .map(|m| m.content.clone())
        .unwrap_or_else(|| "No response generated.".to_string());

    AgentReply {
        message,
        ok: state.error.is_none(),
    }
}

/// Render query results: up to `limit` candidates with name, a few
/// competences, and a truncated summary; a fallback line when empty.
pub fn format_results(rows: &[ResultRow], limit: usize) -> String {
    if rows.is_empty() {
        return "No results found for your search.".to_string();
    }

    let mut out = format!("Found {} result(s):\n\n", rows.len());
    for (i, row) in rows.iter().take(limit).enumerate() {
        let name = row
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("(unknown)");
        out.push_str(&format!("{}. {}\n", i + 1, name));

        if let Some(competences) = row.get("competences").and_then(|v| v.as_array()) {
            let shown: Vec<&str> = competences
                .iter()
                .filter_map(|v| v.as_str())
                .take(3)
                .collect();
            if !shown.is_empty() {
                out.push_str(&format!("   Skills: {}\n", shown.join(", ")));
            }
        }

        if let Some(summary) = row.get("summary").and_then(|v| v.as_str()) {
            if !summary.is_empty() {
                let truncated: String = summary.chars().take(100).collect();
                let suffix = if summary.chars().count() > 100 { "..." } else { "" };
                out.push_str(&format!("   Summary: {truncated}{suffix}\n"));
            }
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_with(kind: QueryKind) -> AgentState {
        let mut state = AgentState::new("request");
        state.query_kind = kind;
        state
    }

    #[test]
    fn classify_routes_by_kind() {
        assert_eq!(
            next_step(Step::Classify, &state_with(QueryKind::FilePath)),
            Step::Load
        );
        assert_eq!(
            next_step(Step::Classify, &state_with(QueryKind::NaturalLanguage)),
            Step::Translate
        );
    }

    #[test]
    fn existence_check_branches_on_duplicate() {
        let mut state = state_with(QueryKind::FilePath);
        state.already_exists = true;
        assert_eq!(next_step(Step::CheckExistence, &state), Step::AlreadyExists);

        state.already_exists = false;
        assert_eq!(next_step(Step::CheckExistence, &state), Step::Extract);
    }

    #[test]
    fn happy_paths_reach_done() {
        let mut state = state_with(QueryKind::NaturalLanguage);
        state.generated_sql = Some("SELECT 1;".to_string());
        assert_eq!(next_step(Step::Translate, &state), Step::Execute);
        assert_eq!(next_step(Step::Execute, &state), Step::Done);

        let state = state_with(QueryKind::FilePath);
        assert_eq!(next_step(Step::Load, &state), Step::CheckExistence);
        assert_eq!(next_step(Step::Extract, &state), Step::Store);
        assert_eq!(next_step(Step::Store, &state), Step::Done);
        assert_eq!(next_step(Step::AlreadyExists, &state), Step::Done);
    }

    #[test]
    fn translation_without_a_statement_terminates() {
        // The no-provider fallback answers during the translate step and
        // must not fall through to the executor.
        let state = state_with(QueryKind::NaturalLanguage);
        assert_eq!(next_step(Step::Translate, &state), Step::Done);
    }

    #[test]
    fn error_short_circuits_every_step() {
        let mut state = state_with(QueryKind::FilePath);
        state.already_exists = true; // would otherwise route to AlreadyExists
        state.error = Some(AgentError::NotFound("/tmp/x.pdf".to_string()));

        for completed in [
            Step::Classify,
            Step::Load,
            Step::CheckExistence,
            Step::Extract,
            Step::Translate,
            Step::Execute,
            Step::Store,
        ] {
            assert_eq!(next_step(completed, &state), Step::Fail);
        }
        // The fail step itself terminates instead of looping.
        assert_eq!(next_step(Step::Fail, &state), Step::Done);
    }

    #[test]
    fn format_results_lists_up_to_three_candidates() {
        let row = |name: &str| {
            let mut m = ResultRow::new();
            m.insert("name".to_string(), json!(name));
            m.insert("competences".to_string(), json!(["Rust", "SQL", "Python", "Go"]));
            m.insert("summary".to_string(), json!("A very experienced engineer."));
            m
        };
        let rows = vec![row("A"), row("B"), row("C"), row("D")];

        let text = format_results(&rows, 3);
        assert!(text.contains("Found 4 result(s)"));
        assert!(text.contains("1. A"));
        assert!(text.contains("3. C"));
        assert!(!text.contains("4. D"));
        // Only the first three competences are shown.
        assert!(text.contains("Rust, SQL, Python"));
        assert!(!text.contains("Go"));
    }

    #[test]
    fn format_results_empty_fallback() {
        assert_eq!(
            format_results(&[], 3),
            "No results found for your search."
        );
    }

    #[test]
    fn format_results_truncates_long_summaries() {
        let mut m = ResultRow::new();
        m.insert("name".to_string(), json!("Jane"));
        m.insert("summary".to_string(), json!("x".repeat(250)));
        let text = format_results(&[m], 3);
        assert!(text.contains(&format!("{}...", "x".repeat(100))));
    }
}
