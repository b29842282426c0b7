use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sift_core::{FieldSchema, FileStore, Record, SearchIndex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Build and query a field-weighted BM25 search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from JSON/JSONL documents
    Build {
        /// Input path (a .json/.jsonl file, or a directory of them)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Indexed field as name:weight[:html]; repeatable.
        /// Defaults to title:1.5:html and content:1.0:html.
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    /// Run a query against an existing index
    Search {
        /// Index directory
        #[arg(long)]
        index: PathBuf,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Number of results
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        /// Treat the query string as HTML
        #[arg(long, default_value_t = false)]
        html: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            fields,
        } => build(&input, &output, &fields),
        Commands::Search {
            index,
            query,
            k,
            html,
        } => run_query(&index, &query, k, html),
    }
}

fn parse_schema(specs: &[String]) -> Result<FieldSchema> {
    let mut builder = FieldSchema::builder();
    if specs.is_empty() {
        builder = builder.field("title", 1.5, true).field("content", 1.0, true);
    } else {
        for spec in specs {
            let mut parts = spec.splitn(3, ':');
            let name = parts.next().unwrap_or_default().to_string();
            let weight: f32 = parts
                .next()
                .unwrap_or("1.0")
                .parse()
                .with_context(|| format!("bad weight in field spec '{spec}'"))?;
            let is_html = match parts.next() {
                None => false,
                Some("html") => true,
                Some(other) => bail!("unknown field flag '{other}' in '{spec}' (expected 'html')"),
            };
            builder = builder.field(name, weight, is_html);
        }
    }
    Ok(builder.build()?)
}

fn collect_input_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input path {} does not exist", input.display());
    }
    Ok(files)
}

fn push_record(file: &Path, value: &serde_json::Value, docs: &mut Vec<Record>, skipped: &mut usize) {
    match Record::from_json(value) {
        Ok(record) => docs.push(record),
        Err(err) => {
            tracing::warn!(file = %file.display(), error = %err, "record skipped");
            *skipped += 1;
        }
    }
}

/// Read documents from a file, skipping records that fail to parse and
/// counting them, so one bad record never sinks a batch.
fn read_documents(file: &Path, docs: &mut Vec<Record>, skipped: &mut usize) -> Result<()> {
    let is_jsonl = file.extension().and_then(|s| s.to_str()) == Some("jsonl");
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);

    if is_jsonl {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(&line) {
                Ok(value) => push_record(file, &value, docs, skipped),
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "line skipped");
                    *skipped += 1;
                }
            }
        }
    } else {
        let json: serde_json::Value = serde_json::from_reader(reader)
            .with_context(|| format!("parsing {}", file.display()))?;
        match json {
            serde_json::Value::Array(items) => {
                for item in &items {
                    push_record(file, item, docs, skipped);
                }
            }
            value @ serde_json::Value::Object(_) => push_record(file, &value, docs, skipped),
            _ => bail!("{} is neither a JSON object nor an array", file.display()),
        }
    }
    Ok(())
}

fn build(input: &Path, output: &Path, fields: &[String]) -> Result<()> {
    let schema = parse_schema(fields)?;
    let files = collect_input_files(input)?;
    if files.is_empty() {
        bail!("no .json or .jsonl files under {}", input.display());
    }

    let mut docs: Vec<Record> = Vec::new();
    let mut skipped = 0usize;
    for file in &files {
        read_documents(file, &mut docs, &mut skipped)?;
    }
    tracing::info!(
        files = files.len(),
        documents = docs.len(),
        skipped,
        "documents loaded"
    );

    // reuse an existing index directory: rebuild swaps atomically, so a
    // failed build leaves the previous index intact
    let index = SearchIndex::new(schema, FileStore::open_or_create(output)?);
    let start = Instant::now();
    let summary = index.rebuild_index(&docs)?;
    let took = start.elapsed();

    for (doc, reason) in &summary.failed {
        tracing::warn!(doc = %doc, reason = %reason, "not indexed");
    }
    tracing::info!(
        indexed = summary.indexed,
        failed = summary.failed.len(),
        took_s = took.as_secs_f64(),
        output = %output.display(),
        "index build complete"
    );
    println!(
        "indexed {} documents ({} failed, {} unreadable) in {:.3}s -> {}",
        summary.indexed,
        summary.failed.len(),
        skipped,
        took.as_secs_f64(),
        output.display()
    );
    Ok(())
}

fn run_query(index_dir: &Path, query: &str, k: usize, html: bool) -> Result<()> {
    // the schema only matters at indexing time; queries need the analyzer
    // and the stored entries
    let index = SearchIndex::new(FieldSchema::default(), FileStore::open(index_dir)?);

    let start = Instant::now();
    let results = index.search(query, html, k)?;
    let took = start.elapsed();

    tracing::info!(hits = results.len(), took_s = took.as_secs_f64(), "query done");
    if results.is_empty() {
        println!("no results for '{query}'");
        return Ok(());
    }
    for (rank, (doc_id, score)) in results.iter().enumerate() {
        println!("{:>3}. {score:>9.4}  {doc_id}", rank + 1);
    }
    Ok(())
}
