//! # Career Chat CLI (`cchat`)
//!
//! The `cchat` binary hosts the retrieval-augmented candidate chatbot. It
//! provides commands for building the vector store, asking one-off
//! questions, an interactive chat loop, index maintenance, and an HTTP
//! server for web chat widgets.
//!
//! ## Usage
//!
//! ```bash
//! cchat --config ./config/cchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cchat init` | Build the vector store from the documents directory |
//! | `cchat ask "<question>"` | Answer a single question |
//! | `cchat chat` | Interactive question/answer loop |
//! | `cchat add [--path <dir>]` | Index additional documents |
//! | `cchat reindex` | Reset and rebuild the vector store |
//! | `cchat stats` | Show engine stats |
//! | `cchat serve` | Start the HTTP chat API |

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use career_chat::config::load_config;
use career_chat::engine::RagEngine;
use career_chat::{server, telemetry};

/// Career Chat — a retrieval-augmented chatbot that answers recruiter
/// questions about a job candidate.
#[derive(Parser)]
#[command(
    name = "cchat",
    about = "Career Chat — a retrieval-augmented candidate chatbot",
    version,
    long_about = "Career Chat answers natural-language questions about a job candidate. \
    Markdown biography/resume documents are chunked, embedded, and indexed in a local \
    vector store; at query time the closest passages are retrieved and a language model \
    generates a grounded, first-person answer."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Missing file means built-in defaults: documents in ./docs, vector
    /// store in ./vector_store.
    #[arg(long, global = true, default_value = "./config/cchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector store from the documents directory.
    ///
    /// Idempotent: a populated collection is left as-is. Use `reindex` to
    /// force a rebuild.
    Init,

    /// Answer a single question and exit.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Interactive question/answer loop. Type `quit` to exit.
    Chat,

    /// Index additional markdown documents.
    Add {
        /// Directory to load from (defaults to the configured documents dir).
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Delete the collection and rebuild it from the documents directory.
    Reindex,

    /// Show engine stats (chunks indexed, collection, model).
    Stats,

    /// Start the HTTP chat API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let _guard = telemetry::init(&config.logging)?;

    match cli.command {
        Commands::Init => {
            let engine = RagEngine::new(config).await?;
            let stats = engine.get_stats().await?;
            println!("ok");
            println!("  chunks indexed: {}", stats.documents_loaded);
            println!("  collection:     {}", stats.collection_name);
            println!("  model:          {}", stats.model);
        }
        Commands::Ask { question } => {
            let engine = RagEngine::new(config).await?;
            println!("{}", engine.query(&question).await);
        }
        Commands::Chat => {
            let engine = RagEngine::new(config).await?;
            run_chat_loop(&engine).await?;
        }
        Commands::Add { path } => {
            let engine = RagEngine::new(config).await?;
            let added = engine.add_documents(path.as_deref()).await?;
            println!("added {added} chunks");
        }
        Commands::Reindex => {
            let engine = RagEngine::new(config).await?;
            if engine.reset_vector_store().await {
                let stats = engine.get_stats().await?;
                println!("reindexed: {} chunks", stats.documents_loaded);
            } else {
                eprintln!("reindex failed");
                std::process::exit(1);
            }
        }
        Commands::Stats => {
            let engine = RagEngine::new(config).await?;
            match engine.get_stats().await {
                Ok(stats) => {
                    println!("  chunks indexed: {}", stats.documents_loaded);
                    println!("  collection:     {}", stats.collection_name);
                    println!("  model:          {}", stats.model);
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Serve => {
            let bind = config.server.bind.clone();
            let engine = RagEngine::new(config).await?;
            server::run_server(engine, &bind).await?;
        }
    }

    Ok(())
}

/// Read questions from stdin until EOF or `quit`, printing each answer.
async fn run_chat_loop(engine: &RagEngine) -> anyhow::Result<()> {
    println!("Career Chat — ask about the candidate's experience.");
    println!("Type 'quit' to exit.\n");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("you: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        let answer = engine.query(question).await;
        println!("\nbot: {answer}\n");
    }

    println!("Goodbye!");
    Ok(())
}
