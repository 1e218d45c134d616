//! # CV Agent
//!
//! A resume ingestion and natural-language query agent. Point it at a PDF
//! resume and it extracts structured fields with an LLM, stores them in
//! SQLite alongside the full text and chunk embeddings, and answers
//! free-text questions by translating them to SQL or ranking chunks by
//! semantic similarity.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────────────────┐    ┌───────────┐
//! │   request   │──▶ │   agent (state machine)  │──▶ │  SQLite   │
//! │  (one str)  │    │ classify → load → dedupe │    │ FTS5+BLOB │
//! └─────────────┘    │  → extract → store       │    └───────────┘
//!                    │ classify → translate     │
//!                    │  → execute               │         ▲
//!                    └──────┬───────────┬───────┘         │
//!                           ▼           ▼                 │
//!                      ┌────────┐  ┌──────────┐           │
//!                      │  LLM   │  │ embedder │───────────┘
//!                      │ (HTTP) │  │  (HTTP)  │
//!                      └────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cva init                          # create database
//! cva ingest ./cv/jane_doe.pdf      # extract + store one resume
//! cva ask "find senior rust devs"   # natural-language query
//! cva semantic "distributed systems experience"
//! cva repl                          # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Domain error kinds |
//! | [`loader`] | PDF/text loading, normalization, fingerprinting |
//! | [`chunk`] | Fixed-size overlapping text chunking |
//! | [`classify`] | File-path vs. natural-language routing heuristic |
//! | [`extract`] | LLM field extraction (fail-open) |
//! | [`translate`] | Natural-language → SQL with SELECT-only validation |
//! | [`execute`] | Query execution and row normalization |
//! | [`store`] | Upsert, chunks, semantic search |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Chat-completion client abstraction |
//! | [`agent`] | The request state machine |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod agent;
pub mod chunk;
pub mod classify;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod execute;
pub mod extract;
pub mod llm;
pub mod loader;
pub mod migrate;
pub mod models;
pub mod store;
pub mod translate;
