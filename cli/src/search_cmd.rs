use anyhow::{Context, Result};
use clap::Parser;
use codeseek_chunk_model::Chunk;
use codeseek_hybrid_search::{HybridSearchEngine, HybridSearchOptions};
use log::info;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// JSON file holding an array of chunks
    #[arg(value_name = "CHUNKS")]
    pub chunks: PathBuf,

    /// Search query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// JSON file with search options; defaults to the lexical-only preset
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Show how each score was assembled
    #[arg(long)]
    pub explain: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// JSON file holding an array of chunks
    #[arg(value_name = "CHUNKS")]
    pub chunks: PathBuf,
}

pub async fn run_search(args: SearchArgs) -> Result<()> {
    let mut options = load_options(args.options.as_deref())?;
    if let Some(limit) = args.limit {
        options.max_results = limit;
    }
    options
        .validate()
        .map_err(|err| anyhow::anyhow!("Invalid search options: {err}"))?;

    let engine = build_engine(&args.chunks).await?;
    let results = engine
        .hybrid_search(&args.query, &options)
        .await
        .context("Search failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No results found", "✗".bright_red());
        return Ok(());
    }

    println!(
        "{} Found {} results in {}ms\n",
        "✓".bright_green(),
        results.len(),
        results.stats.total_time_ms
    );

    for (i, result) in results.results.iter().enumerate() {
        let name = result
            .chunk
            .as_ref()
            .map_or(result.chunk_id.as_str(), Chunk::display_name);
        println!(
            "{}. {} {}",
            (i + 1).to_string().bright_yellow(),
            name.bright_cyan(),
            format!("{:.3}", result.combined_score).bright_green()
        );

        if args.explain {
            println!(
                "   {} semantic={:.2} keyword={:.2} bm25={:.2} context={:.2} diversity={:.2}",
                "Scores:".bright_black(),
                result.semantic_score,
                result.keyword_score,
                result.bm25_score,
                result.context_relevance,
                result.diversity_bonus
            );
            println!("   {} {}", "Why:".bright_black(), result.explanation);
        }
    }

    if args.explain {
        let stats = &results.stats;
        println!("\n{}", "Search Statistics:".bright_blue());
        println!(
            "  Keyword: {}ms ({} results)",
            stats.keyword_time_ms, stats.keyword_count
        );
        println!("  BM25: {}ms ({} results)", stats.bm25_time_ms, stats.bm25_count);
        println!(
            "  Semantic: {}ms ({} results)",
            stats.semantic_time_ms, stats.semantic_count
        );
        println!("  Fusion: {}ms", stats.fusion_time_ms);
        println!("  Post-processing: {}ms", stats.post_process_time_ms);
        println!("  Expanded terms: {}", stats.expanded_terms);
        if let Some(error) = &stats.semantic_error {
            println!("  {} Semantic degraded: {error}", "!".bright_yellow());
        }
    }

    Ok(())
}

pub async fn run_stats(args: StatsArgs) -> Result<()> {
    let engine = build_engine(&args.chunks).await?;
    let stats = engine.get_index_stats().await;

    println!("{} Index Statistics", "▶".bright_blue());
    println!("  Chunks: {}", stats.total_chunks);
    println!("  Terms: {}", stats.total_terms);
    println!("  Phrases: {}", stats.total_phrases);
    println!("  Average length: {:.1} chars", stats.avg_doc_length);

    Ok(())
}

async fn build_engine(chunks_path: &Path) -> Result<HybridSearchEngine> {
    let chunks = load_chunks(chunks_path)?;
    info!("Loaded {} chunks from {}", chunks.len(), chunks_path.display());

    let engine = HybridSearchEngine::lexical_only();
    engine
        .index_chunks(chunks)
        .await
        .context("Failed to index chunks")?;
    Ok(engine)
}

fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chunk file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse chunk file {}", path.display()))
}

fn load_options(path: Option<&Path>) -> Result<HybridSearchOptions> {
    let Some(path) = path else {
        return Ok(HybridSearchOptions::lexical_only());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse options file {}", path.display()))
}
