//! # docchat CLI
//!
//! Interactive retrieval-augmented chat over a local document directory.
//!
//! ```bash
//! docchat --config ./config/docchat.toml
//! ```
//!
//! API keys are read from the environment (a `.env` file is honored):
//! `OPENAI_API_KEY` for gpt-* models, `GEMINI_API_KEY` otherwise. With no
//! config file, `DOCCHAT_DOCS_DIR` selects the documents directory and all
//! other settings take their defaults. Type the exit word (default `sair`)
//! to leave the chat.

use clap::Parser;
use std::path::PathBuf;

use docchat::chat::run_chat_loop;
use docchat::config;
use docchat::rag::Rag;

/// docchat — chat with your local documents.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "Chat with your local documents through a hosted LLM",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, default_value = "./config/docchat.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up API keys from a .env file, if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let mut rag = Rag::new(&cfg).await?;

    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout();
    run_chat_loop(stdin, stdout.lock(), &mut rag, &cfg.chat.exit_word).await?;

    Ok(())
}
