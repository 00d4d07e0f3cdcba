use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use topicmap::config::Config;
use topicmap::corpus::CorpusPaths;
use topicmap::embeddings::download;
use topicmap::embeddings::sentence::SentenceEmbedder;

/// Topicmap: topic maps for a file of short documents.
///
/// Embeds every line of `<name>.txt`, projects the embeddings to 2D, groups
/// them into topics and writes an interactive scatter plot, a topic
/// dendrogram and a static datamap next to the input.
#[derive(Parser)]
#[command(name = "topicmap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the topic map for a corpus file (the default command)
    Run {
        /// Base name: reads <name>.txt (default: titles)
        #[arg(long)]
        name: Option<String>,
    },

    /// Download the sentence embedding model (~90 MB)
    DownloadModel,
}

fn main() -> Result<()> {
    // Before anything can start a native thread pool
    topicmap::runtime::cap_thread_pools();

    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("topicmap=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { name: None }) {
        Commands::Run { name } => {
            let config = Config::load()?.with_file_name(name);
            let paths = CorpusPaths::from_base(&config.file_name);
            info!(input = %paths.input.display(), "Starting topic map run");

            let model_dir = download::ensure_embedding_model(&config.model_dir)?;
            let embedder = SentenceEmbedder::load(&model_dir)?;

            let summary = topicmap::pipeline::run(&config, &paths, &embedder)?;
            info!(
                documents = summary.documents,
                topics = summary.topic_count,
                saved = summary.saved.len(),
                failed = summary.failed.len(),
                "Run complete"
            );

            println!(
                "{}",
                "Open the files in your browser to view the interactive visualizations.".dimmed()
            );
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", model_dir.display());

            download::ensure_embedding_model(model_dir)?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `topicmap` next to a titles.txt file.");
        }
    }

    Ok(())
}
