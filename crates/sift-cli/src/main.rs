//! CLI entry point for Sift: ingest a document and ask it questions.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use sift_core::{
    app_data_dir, chunk_text, load_config, load_document, save_config, status, watch_document,
    Config, Embedder, HashEmbedder, Hit, IngestSummary, OllamaClient, RetrievalService,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Sift: ask questions of a document by nearest-fragment retrieval")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Clone, Copy)]
struct EmbedArgs {
    /// Use the offline hash embedder with this many dimensions instead of Ollama.
    #[arg(long, value_name = "DIM")]
    hash_dim: Option<usize>,

    /// Words per fragment (defaults to the configured value).
    #[arg(long, value_name = "N")]
    words: Option<usize>,

    /// Number of fragments to return (defaults to the configured value).
    #[arg(short, value_name = "K")]
    k: Option<usize>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status.
    Status,
    /// Show where Sift stores its config (app data directory).
    DataDir,
    /// Show the effective config; any option given is saved first.
    Config {
        #[arg(long)]
        ollama_url: Option<String>,
        #[arg(long)]
        embed_model: Option<String>,
        #[arg(long)]
        words_per_chunk: Option<usize>,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Split a document into fragments and list them.
    Chunk {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Words per fragment.
        #[arg(long, value_name = "N")]
        words: Option<usize>,
    },
    /// Ingest a document and print the fragments nearest to QUERY.
    Ask {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "QUERY")]
        query: String,
        #[command(flatten)]
        embed: EmbedArgs,
        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Ingest a document, re-ingest it whenever it changes, and answer one query per stdin line.
    Watch {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[command(flatten)]
        embed: EmbedArgs,
    },
}

#[derive(Serialize)]
struct AskOutput<'a> {
    ingest: IngestSummary,
    query: &'a str,
    hits: &'a [Hit],
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config();
    let result = match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            println!("Sift backend");
            println!("  core: {}", status());
            Ok(())
        }
        Commands::DataDir => {
            match app_data_dir() {
                Some(p) => println!("{}", p.display()),
                None => eprintln!("Could not determine app data directory."),
            }
            Ok(())
        }
        Commands::Config {
            ollama_url,
            embed_model,
            words_per_chunk,
            top_k,
        } => update_config(config, ollama_url, embed_model, words_per_chunk, top_k),
        Commands::Chunk { path, words } => chunk(&config, &path, words),
        Commands::Ask {
            path,
            query,
            embed,
            json,
        } => ask(&config, &path, &query, embed, json).await,
        Commands::Watch { path, embed } => watch(&config, &path, embed).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn,sift=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn update_config(
    mut config: Config,
    ollama_url: Option<String>,
    embed_model: Option<String>,
    words_per_chunk: Option<usize>,
    top_k: Option<usize>,
) -> CliResult {
    let changed = ollama_url.is_some()
        || embed_model.is_some()
        || words_per_chunk.is_some()
        || top_k.is_some();
    if let Some(url) = ollama_url {
        config.ollama_url = url;
    }
    if let Some(model) = embed_model {
        config.embed_model = model;
    }
    if let Some(words) = words_per_chunk {
        config.words_per_chunk = words;
    }
    if let Some(k) = top_k {
        config.top_k = k;
    }
    if changed {
        save_config(&config)?;
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn chunk(config: &Config, path: &Path, words: Option<usize>) -> CliResult {
    let text = load_document(path)?;
    let mut options = config.chunk_options();
    if let Some(words) = words {
        options.words_per_chunk = words;
    }
    let fragments = chunk_text(&text, &options);
    println!("{} fragment(s) from {}", fragments.len(), path.display());
    for (i, f) in fragments.iter().enumerate() {
        println!("  [{}] {}", i, preview(f));
    }
    Ok(())
}

async fn ask(config: &Config, path: &Path, query: &str, args: EmbedArgs, json: bool) -> CliResult {
    let service = RetrievalService::new(make_embedder(config, args)?);
    let summary = ingest_file(&service, config, path, args).await?;
    let hits = service.query(query, args.k.unwrap_or(config.top_k)).await?;

    if json {
        let out = AskOutput {
            ingest: summary,
            query,
            hits: &hits,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Indexed {} fragment(s) ({} dims) from {}",
            summary.fragments,
            summary.dimension,
            path.display()
        );
        print_hits(&hits);
    }
    Ok(())
}

async fn watch(config: &Config, path: &Path, args: EmbedArgs) -> CliResult {
    let service = Arc::new(RetrievalService::new(make_embedder(config, args)?));
    let summary = ingest_file(&service, config, path, args).await?;
    println!(
        "Indexed {} fragment(s) from {} (generation {}). Type a query per line; Ctrl+D to quit.",
        summary.fragments,
        path.display(),
        summary.generation
    );

    let options = chunk_options(config, args);
    let runtime = tokio::runtime::Handle::current();
    let reload_service = service.clone();
    let _watcher = watch_document(path, move |text| {
        let text = match text {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "reload skipped");
                return;
            }
        };
        match runtime.block_on(reload_service.ingest_text(&text, &options)) {
            Ok(s) => tracing::info!(
                fragments = s.fragments,
                generation = s.generation,
                "reloaded document"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "reload failed; still serving the previous version"
            ),
        }
    })?;

    let k = args.k.unwrap_or(config.top_k);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        match service.query(query, k).await {
            Ok(hits) => print_hits(&hits),
            Err(e) => tracing::error!(error = %e, query, "query failed"),
        }
    }
    Ok(())
}

fn make_embedder(
    config: &Config,
    args: EmbedArgs,
) -> Result<Arc<dyn Embedder>, Box<dyn Error>> {
    Ok(match args.hash_dim {
        Some(dim) => Arc::new(HashEmbedder::new(dim)),
        None => {
            let client = OllamaClient::from_url(&config.ollama_url)?;
            Arc::new(client.with_embed_model(config.embed_model.clone()))
        }
    })
}

fn chunk_options(config: &Config, args: EmbedArgs) -> sift_core::ChunkOptions {
    let mut options = config.chunk_options();
    if let Some(words) = args.words {
        options.words_per_chunk = words;
    }
    options
}

async fn ingest_file(
    service: &RetrievalService,
    config: &Config,
    path: &Path,
    args: EmbedArgs,
) -> Result<IngestSummary, Box<dyn Error>> {
    let text = load_document(path)?;
    Ok(service
        .ingest_text(&text, &chunk_options(config, args))
        .await?)
}

fn print_hits(hits: &[Hit]) {
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>2}. [{}] d={:.4}  {}",
            rank + 1,
            hit.handle,
            hit.distance,
            preview(&hit.fragment)
        );
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 100;
    match text.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
