//! # CV Agent CLI (`cva`)
//!
//! The `cva` binary is the interface to the resume agent. Every data
//! command accepts a `--config` flag pointing to a TOML configuration
//! file; API keys come from the environment (a `.env` file is honored).
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cva init` | Create the SQLite database and run schema migrations |
//! | `cva ask "<request>"` | Route a request: ingest a path or answer a question |
//! | `cva ingest <path>` | Ingest one resume file |
//! | `cva search "<query>"` | Natural-language query over the structured store |
//! | `cva semantic "<query>"` | Rank stored chunks by embedding similarity |
//! | `cva chat "<message>"` | Free-form chat about what the agent can do |
//! | `cva repl` | Interactive session |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use cv_agent::agent::Agent;
use cv_agent::config;
use cv_agent::store;

/// CV Agent: resume ingestion and natural-language querying.
#[derive(Parser)]
#[command(
    name = "cva",
    about = "CV Agent: ingest PDF resumes and query them in natural language",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./cva.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Handle a single request string: a path to a resume ingests it,
    /// anything else is answered as a natural-language query.
    Ask {
        /// The request: a file path or a free-text question.
        request: String,
    },

    /// Ingest one resume file.
    Ingest {
        /// Path to the resume (PDF or plain text).
        path: PathBuf,
    },

    /// Query the structured store in natural language (translated to SQL).
    Search {
        /// The question, e.g. "developers who know python".
        query: String,
    },

    /// Rank stored resume chunks by embedding similarity to the query.
    Semantic {
        query: String,

        /// Maximum chunks to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Free-form chat about the agent's capabilities.
    Chat { message: String },

    /// Interactive session; type 'quit' to leave.
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = cv_agent::db::connect(&cfg).await?;
            cv_agent::migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Ask { request } => {
            let agent = Agent::connect(cfg).await?;
            finish(agent.ask(&request).await);
        }
        Commands::Ingest { path } => {
            let agent = Agent::connect(cfg).await?;
            finish(agent.ingest(&path).await);
        }
        Commands::Search { query } => {
            let agent = Agent::connect(cfg).await?;
            finish(agent.search(&query).await);
        }
        Commands::Semantic { query, limit } => {
            let limit = limit.unwrap_or(cfg.search.semantic_limit);
            let agent = Agent::connect(cfg).await?;
            let hits = store::semantic_search(agent.pool(), agent.embedder(), &query, limit).await?;
            if hits.is_empty() {
                println!("No results.");
            } else {
                for hit in hits {
                    println!(
                        "{:.3}  {} (chunk {})\n      {}",
                        hit.score, hit.filename, hit.chunk_index, hit.snippet
                    );
                }
            }
        }
        Commands::Chat { message } => {
            let agent = Agent::connect(cfg).await?;
            println!("{}", agent.chat(&message).await?);
        }
        Commands::Repl => {
            let agent = Agent::connect(cfg).await?;
            run_repl(&agent).await?;
        }
    }

    Ok(())
}

/// Print the reply and exit non-zero on error, so scripts can tell the
/// two apart without parsing the message.
fn finish(reply: cv_agent::agent::AgentReply) -> ! {
    println!("{}", reply.message);
    std::process::exit(if reply.ok { 0 } else { 1 });
}

async fn run_repl(agent: &Agent) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    println!("cva interactive session (type 'quit' to leave)");
    loop {
        print!("\n> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit" | "q") {
            break;
        }

        let reply = agent.ask(line).await;
        println!("{}", reply.message);
    }

    println!("Bye.");
    Ok(())
}
