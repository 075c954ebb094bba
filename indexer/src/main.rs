use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};
use vitrine_core::persist::{load_index, save_index, IndexPaths};
use vitrine_core::{SearchConfig, SearchIndex};

mod dataset;
mod evaluate;
mod repl;

use evaluate::EvalCase;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, query and evaluate the product catalog index", long_about = None)]
struct Cli {
    /// Rank candidates on the rayon pool when there are enough of them
    #[arg(long, global = true, default_value_t = false)]
    parallel: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from CSV/JSON/JSONL files or a directory of them
    Build {
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: String,
    },
    /// Run one query against a built index
    Search {
        #[arg(long)]
        index: String,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Predicate as key=value; repeatable
        #[arg(long = "filter")]
        filters: Vec<String>,
    },
    /// Interactive query loop on stdin
    Repl {
        #[arg(long)]
        index: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Replay sampled historical queries and report position error
    Evaluate {
        #[arg(long)]
        index: String,
        /// Dataset carrying query, search_page and position columns
        #[arg(long)]
        dataset: String,
        #[arg(long, default_value_t = 500)]
        queries: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1000)]
        limit: usize,
        #[arg(long, default_value_t = 10)]
        bins: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = SearchConfig { parallel: cli.parallel, ..SearchConfig::default() };

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output, config),
        Commands::Search { index, query, limit, filters } => {
            let index = open(&index, config)?;
            let pairs = filters
                .iter()
                .map(|f| f.split_once('=').ok_or_else(|| anyhow!("filter {f:?} is not key=value")))
                .collect::<Result<Vec<_>>>()?;
            let ids = index.search(&query, limit, pairs)?;
            println!("{}", serde_json::to_string(&ids)?);
            Ok(())
        }
        Commands::Repl { index, limit } => {
            let index = open(&index, config)?;
            repl::run(&index, limit, std::io::stdin().lock(), std::io::stdout())
        }
        Commands::Evaluate { index, dataset, queries, seed, limit, bins } => {
            let index = open(&index, config)?;
            let cases: Vec<EvalCase> = dataset::load_rows(Path::new(&dataset))?
                .iter()
                .filter_map(EvalCase::from_row)
                .collect();
            tracing::info!(cases = cases.len(), queries, seed, "starting evaluation");
            let report = evaluate::run(&index, &cases, queries, seed, limit)?;
            print!("{}", evaluate::render(&report, bins));
            Ok(())
        }
    }
}

fn open(dir: &str, config: SearchConfig) -> Result<SearchIndex> {
    let paths = IndexPaths::new(dir);
    if !paths.exists() {
        anyhow::bail!("no index at {dir}; run `indexer build` first");
    }
    Ok(load_index(&paths, config)?)
}

fn build_index(input: &str, output: &str, config: SearchConfig) -> Result<()> {
    let rows = dataset::load_rows(Path::new(input))?;
    let documents = rows.iter().map(|r| r.to_document());
    let index = SearchIndex::build(documents, config)?;

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    let meta = save_index(&IndexPaths::new(output), &index, &created_at)?;
    tracing::info!(output, num_docs = meta.num_docs, vocabulary = meta.vocabulary_size, "index build complete");
    Ok(())
}
