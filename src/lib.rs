//! # Edu Assistant
//!
//! A retrieval-augmented question-answering assistant for an education
//! services company.
//!
//! Course documents (txt, pdf, docx, xlsx/xls, csv) are split into
//! overlapping chunks, embedded, and stored in a local SQLite collection.
//! A question retrieves the closest chunks, which are folded into a
//! persona prompt and answered by an OpenAI-compatible chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────┐
//! │  Loader  │──▶│ Chunk+Embed  │──▶│  SQLite  │
//! │ data/*   │   │              │   │ vectors  │
//! └──────────┘   └──────────────┘   └────┬─────┘
//!                                        │ top-k
//!                                  ┌─────▼─────┐   ┌───────────┐
//!                                  │ Pipeline  │──▶│ ChatModel │
//!                                  └─────┬─────┘   └───────────┘
//!                          ┌─────────────┤
//!                          ▼             ▼
//!                     ┌─────────┐   ┌─────────┐
//!                     │   CLI   │   │  HTTP   │
//!                     │ (edu)   │   │  /chat  │
//!                     └─────────┘   └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! edu init                  # create the collection
//! edu ingest                # load data/ into it
//! edu ask "파이썬 과정 수강료가 얼마인가요?"
//! edu chat                  # interactive session
//! edu serve                 # web chat on :5000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Typed errors at component seams |
//! | [`models`] | Core data types |
//! | [`extract`] | Text extraction per file format |
//! | [`loader`] | Folder scan and per-file loading |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store trait, SQLite and in-memory backends |
//! | [`ingest`] | Loader → chunker → store orchestration |
//! | [`llm`] | Chat-completion model boundary |
//! | [`prompt`] | Context block and system instruction |
//! | [`history`] | Bounded conversation memory |
//! | [`pipeline`] | Retrieval-augmented answering |
//! | [`repl`] | Interactive terminal loop |
//! | [`server`] | HTTP chat surface |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod history;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod repl;
pub mod server;
pub mod store;
