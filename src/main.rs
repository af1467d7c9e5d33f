//! # Edu Assistant CLI (`edu`)
//!
//! ## Usage
//!
//! ```bash
//! edu --config ./config/edu.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `edu init` | Create the collection database and schema |
//! | `edu ingest [PATHS...]` | Load, chunk, and store documents |
//! | `edu chat` | Interactive question loop with conversation history |
//! | `edu ask "<q>"` | Answer one question |
//! | `edu search "<q>"` | Show the raw retrieved chunks and distances |
//! | `edu stats` | Collection name, size, and location |
//! | `edu clear` | Delete every stored chunk |
//! | `edu serve` | Start the HTTP chat server |
//!
//! Logs go to stderr (`RUST_LOG` overrides the level); command output goes
//! to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use edu_assistant::config::{self, Config};
use edu_assistant::embedding::{self, DisabledEmbedder, Embedder};
use edu_assistant::ingest;
use edu_assistant::llm::OpenAiChatModel;
use edu_assistant::pipeline::Pipeline;
use edu_assistant::repl;
use edu_assistant::server;
use edu_assistant::store::{SqliteStore, VectorStore};

/// Education-services course assistant: ask questions about course
/// documents and get grounded answers.
#[derive(Parser)]
#[command(
    name = "edu",
    about = "Retrieval-augmented course consultation assistant",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/edu.toml`; built-in defaults are used when it
    /// does not exist.
    #[arg(long, global = true, default_value = "./config/edu.toml")]
    config: PathBuf,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the collection database and schema. Idempotent.
    Init,

    /// Load documents, split them into chunks, and add them to the collection.
    ///
    /// Without paths, every supported file in `[loader].folder` is loaded.
    Ingest {
        /// Files to ingest instead of scanning the folder.
        paths: Vec<PathBuf>,

        /// Empty the collection first.
        #[arg(long)]
        clear: bool,
    },

    /// Interactive consultation. Type `quit`, `exit`, or `종료` to leave.
    Chat,

    /// Answer a single question without history.
    Ask {
        /// The question.
        query: String,
    },

    /// Show the chunks retrieved for a query, closest first.
    Search {
        /// The query text.
        query: String,

        /// Number of chunks to show (defaults to `[retrieval].top_k`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show collection name, stored chunk count, and location.
    Stats,

    /// Delete every chunk from the collection.
    Clear,

    /// Start the HTTP chat server on `[server].bind`.
    Serve,

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "edu_assistant=debug,edu=debug"
    } else {
        "edu_assistant=info,edu=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "edu", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = open_store(&cfg, Arc::new(DisabledEmbedder)).await?;
            let info = store.info().await?;
            println!("Collection '{}' ready at {}", info.collection_name, info.location);
        }
        Commands::Ingest { paths, clear } => {
            let store = open_store(&cfg, embedding::create_embedder(&cfg.embedding)?).await?;
            ingest::run_ingest(&cfg, store.as_ref(), &paths, clear).await?;
        }
        Commands::Chat => {
            let pipeline = build_pipeline(&cfg).await?;
            repl::run_chat(pipeline).await?;
        }
        Commands::Ask { query } => {
            let pipeline = build_pipeline(&cfg).await?;
            let answer = pipeline.respond(&query, None).await;
            println!("{}", answer);
        }
        Commands::Search { query, limit } => {
            let pipeline = build_pipeline(&cfg).await?;
            let limit = limit.unwrap_or(cfg.retrieval.top_k);
            let matches = pipeline.relevant_documents_limit(&query, limit).await?;
            if matches.is_empty() {
                println!("No results.");
            }
            for (i, m) in matches.iter().enumerate() {
                println!(
                    "{}. [{:.4}] {} (chunk {}/{})",
                    i + 1,
                    m.distance,
                    m.metadata.file_path,
                    m.metadata.chunk_index + 1,
                    m.metadata.total_chunks
                );
                println!("    {}", snippet(&m.content, 160));
            }
        }
        Commands::Stats => {
            let store = open_store(&cfg, Arc::new(DisabledEmbedder)).await?;
            let info = store.info().await?;
            println!("collection: {}", info.collection_name);
            println!("chunks: {}", info.document_count);
            println!("location: {}", info.location);
        }
        Commands::Clear => {
            let store = open_store(&cfg, Arc::new(DisabledEmbedder)).await?;
            store.clear().await?;
            println!("Collection '{}' cleared.", cfg.db.collection);
        }
        Commands::Serve => {
            let pipeline = build_pipeline(&cfg).await?;
            server::run_server(&cfg, pipeline).await?;
        }
        // Handled before the config is loaded.
        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn open_store(cfg: &Config, embedder: Arc<dyn Embedder>) -> Result<Arc<dyn VectorStore>> {
    let store = SqliteStore::open(cfg, embedder).await?;
    Ok(Arc::new(store))
}

async fn build_pipeline(cfg: &Config) -> Result<Arc<Pipeline>> {
    let store = open_store(cfg, embedding::create_embedder(&cfg.embedding)?).await?;
    let model = Arc::new(OpenAiChatModel::new(&cfg.llm)?);
    Ok(Arc::new(Pipeline::new(cfg, store, model)))
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
