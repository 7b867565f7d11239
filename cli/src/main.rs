use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use env_logger::Env;

mod search_cmd;

use search_cmd::{SearchArgs, StatsArgs};

/// Hybrid keyword, BM25 and semantic search over code chunks
#[derive(Debug, Parser)]
#[command(name = "codeseek", version)]
struct Cli {
    /// Log pipeline stages at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index a chunk file and run one query against it
    Search(SearchArgs),

    /// Index a chunk file and print index statistics
    Stats(StatsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Command::Search(args) => search_cmd::run_search(args).await,
        Command::Stats(args) => search_cmd::run_stats(args).await,
    }
}
