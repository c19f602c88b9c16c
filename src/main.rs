use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexrag::config::Config;
use lexrag::embedder::Embedder;
use lexrag::embedder::download::download_model_files;
use lexrag::embedder::onnx::OnnxEmbedder;
use lexrag::index::VectorIndex;
use lexrag::ingest::IndexBuilder;
use lexrag::retriever::Retriever;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lexrag", version, about = "Regulatory reference-retrieval engine")]
struct Cli {
    /// Path to the JSON config file (defaults to ./config.json)
    #[arg(short, long, default_value = "")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the vector index from the reference directory
    Index,
    /// Retrieve citations for a query
    Query {
        text: String,

        /// Maximum number of citations to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Emit citations as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Show index statistics
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Command::Index => {
            let embedder = load_embedder(&config)?;
            let mut index = VectorIndex::open(
                &config.db_path,
                &config.model.name,
                config.model.dimensions,
            )?;
            let summary = IndexBuilder::new(&mut index, embedder.as_ref(), &config).build()?;
            println!("{summary}");
        }
        Command::Query { text, top_k, json } => {
            let embedder = load_embedder(&config)?;
            let index = VectorIndex::open(
                &config.db_path,
                &config.model.name,
                config.model.dimensions,
            )?;
            let retriever = Retriever::new(&index, embedder.as_ref());
            let citations = retriever.retrieve(&text, top_k.unwrap_or(config.search_top_k))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&citations)?);
            } else if citations.is_empty() {
                println!("No matching references.");
            } else {
                for (i, c) in citations.iter().enumerate() {
                    let score = c
                        .score
                        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.4}"));
                    println!("{}. {} [{} / {}] (distance {score})", i + 1, c.source_file, c.category, c.doc_type);
                    println!("   {}", c.text.trim());
                    if !c.url.is_empty() {
                        println!("   {}", c.url);
                    }
                }
            }
        }
        Command::Stats => {
            let index = VectorIndex::open(
                &config.db_path,
                &config.model.name,
                config.model.dimensions,
            )?;
            println!("{} chunks indexed", index.count()?);
            for (source_file, chunks) in index.source_stats()? {
                println!("  {source_file}: {chunks}");
            }
        }
    }

    Ok(())
}

/// Load the ONNX embedder, downloading model files on first use.
fn load_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    let model_dir = Path::new(&config.model.dir);
    download_model_files(model_dir)?;
    let embedder = OnnxEmbedder::new(model_dir, config.model.dimensions)?;
    Ok(Box::new(embedder))
}
