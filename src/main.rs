use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mathchat::batch::BatchOutputFormat;
use mathchat::similarity::MetricKind;

mod cli;

use cli::EngineArgs;

#[derive(Parser)]
#[command(name = "mathchat")]
#[command(about = "Route messages to chat replies or arithmetic", long_about = None)]
struct Cli {
    /// Knowledge base JSON (defaults to config, then the built-in corpus)
    #[arg(long, global = true)]
    knowledge_base: Option<PathBuf>,

    /// Minimum similarity for a conversational match (0-1]
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Similarity metric: bigram or levenshtein
    #[arg(long, global = true)]
    metric: Option<MetricKind>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single message
    Resolve {
        /// Message to resolve
        message: String,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
        /// Seed for reply selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Start interactive chat mode
    Chat {
        /// Seed for reply selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Resolve every message in a file
    Batch {
        /// Plain text, JSON or JSONL file with one message per line
        file: PathBuf,
        /// Output format (text or jsonl)
        #[arg(long)]
        format: Option<String>,
        /// Messages resolved concurrently
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Validate a knowledge base and print a summary
    Check {
        /// Knowledge base to check (defaults to the configured one)
        path: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.log_json);

    let args = EngineArgs {
        knowledge_base: cli.knowledge_base,
        threshold: cli.threshold,
        metric: cli.metric,
    };

    match cli.command {
        Some(Commands::Version) | None => {
            println!("mathchat {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Resolve {
            message,
            json,
            seed,
        }) => {
            cli::chat::cmd_resolve(&args, &message, json, seed)?;
        }
        Some(Commands::Chat { seed }) => {
            cli::chat::cmd_chat(&args, seed)?;
        }
        Some(Commands::Batch {
            file,
            format,
            concurrency,
        }) => {
            let format = match format.as_deref() {
                None => None,
                Some("text") => Some(BatchOutputFormat::Text),
                Some("jsonl") => Some(BatchOutputFormat::Jsonl),
                Some(other) => anyhow::bail!("Unknown batch format '{}': use text or jsonl", other),
            };
            cli::batch::cmd_batch(&args, &file, format, concurrency).await?;
        }
        Some(Commands::Check { path }) => {
            cli::cmd_check(&args, path)?;
        }
    }

    Ok(())
}
