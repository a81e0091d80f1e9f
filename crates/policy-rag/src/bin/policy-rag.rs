//! policy-rag command line
//!
//! Run with: cargo run -p policy-rag -- serve

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use policy_rag::{providers::OpenAiClient, server::RagServer, RagConfig, RagPipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "policy-rag", version, about = "Grounded, cited answers to policy questions")]
struct Cli {
    /// Optional TOML configuration file; environment variables override it
    #[arg(long, global = true, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the vector index from the document roots
    Rebuild,
    /// Start the HTTP server
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env never overrides variables already set
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_rag=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Rebuild => {
            let client = Arc::new(OpenAiClient::new(&config)?);
            let report = RagPipeline::rebuild(&config, client).await?;
            println!(
                "Vector store rebuilt at {} ({} documents, {} chunks)",
                report.index_dir.display(),
                report.documents,
                report.chunks
            );
        }
        Command::Serve => {
            tracing::info!("Configuration loaded");
            tracing::info!("  - Embedding model: {}", config.embeddings.model);
            tracing::info!("  - Generation model: {}", config.llm.generate_model);
            tracing::info!(
                "  - Chunking: {} / {} overlap",
                config.chunking.chunk_size,
                config.chunking.chunk_overlap
            );

            let server = RagServer::new(config).await?;

            println!("\nServer starting...");
            println!("  API: http://{}", server.address());
            println!("  Health: http://{}/health", server.address());
            println!("  API Info: http://{}/api/info", server.address());
            println!("\nPress Ctrl+C to stop\n");

            server.start().await?;
        }
    }

    Ok(())
}
