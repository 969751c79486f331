use anyhow::{Context, Result};
use boolret_core::persist::{save_documents, save_meta, DocStore, MetaFile, StorePaths, StoredDocument, STORE_VERSION};
use boolret_core::search::BatchResult;
use boolret_core::{Analyzer, Grammar, QueryOptions, Searcher, TermResolution, DEFAULT_MAX_RESULTS, EXAMPLE_QUERIES};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

mod corpus;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Ingest a corpus into a document store and run Boolean queries against it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read JSON/JSONL records from a file or directory and write a document store
    Ingest {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output store directory
        #[arg(long)]
        output: String,
        /// Store normalized text instead of the raw contents
        #[arg(long, default_value_t = false)]
        preprocess: bool,
        /// Skip term vectors; the index is then built by re-normalizing contents
        #[arg(long, default_value_t = false)]
        no_vectors: bool,
        /// Apply NFKC normalization before lowercasing
        #[arg(long, default_value_t = false)]
        nfkc: bool,
    },
    /// Write a JSONL copy of the corpus with normalized contents
    Preprocess {
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: String,
    },
    /// Run one Boolean query
    Query {
        query: String,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Run the example query list and print one JSON line per query
    Batch {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Document store directory
    #[arg(long, default_value = "./store")]
    store: String,
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,
    /// reference | extended
    #[arg(long, default_value = "reference")]
    grammar: Grammar,
    /// normalized | stem-only
    #[arg(long, default_value = "normalized")]
    terms: TermResolution,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { input, output, preprocess, no_vectors, nfkc } => {
            ingest(&input, &output, preprocess, !no_vectors, nfkc)
        }
        Commands::Preprocess { input, output } => preprocess_corpus(&input, &output),
        Commands::Query { query, search } => {
            let searcher = open_searcher(&search)?;
            let results = searcher.search(&query, search.max_results);
            println!("{}", serde_json::to_string(&BatchResult { query, results })?);
            Ok(())
        }
        Commands::Batch { search } => {
            let searcher = open_searcher(&search)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for result in searcher.run_batch(EXAMPLE_QUERIES, search.max_results) {
                writeln!(out, "{}", serde_json::to_string(&result)?)?;
            }
            Ok(())
        }
    }
}

fn open_searcher(args: &SearchArgs) -> Result<Searcher> {
    let store = DocStore::open(&args.store).with_context(|| format!("opening document store {}", args.store))?;
    let options = QueryOptions { grammar: args.grammar, terms: args.terms };
    Ok(Searcher::from_source(&store, store.analyzer(), options))
}

fn ingest(input: &str, output: &str, preprocess: bool, vectors: bool, nfkc: bool) -> Result<()> {
    let analyzer = Analyzer::default().with_nfkc(nfkc);
    let docs: Vec<StoredDocument> = corpus::read_corpus(Path::new(input))?
        .into_iter()
        .map(|doc| doc.into_stored(&analyzer, preprocess, vectors))
        .collect();

    let paths = StorePaths::new(output);
    save_documents(&paths, &docs)?;
    let meta = MetaFile {
        num_docs: u32::try_from(docs.len()).context("too many documents for one store")?,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: STORE_VERSION,
        preprocessed: preprocess,
        nfkc,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, documents = docs.len(), "document store written");
    Ok(())
}

fn preprocess_corpus(input: &str, output: &str) -> Result<()> {
    let analyzer = Analyzer::default();
    let docs = corpus::read_corpus(Path::new(input))?;
    let mut out = BufWriter::new(File::create(output).with_context(|| format!("creating {output}"))?);
    for doc in &docs {
        let contents = analyzer.preprocess(doc.contents.as_deref().unwrap_or(""));
        writeln!(out, "{}", serde_json::json!({ "id": doc.id, "contents": contents }))?;
    }
    out.flush()?;
    tracing::info!(output, documents = docs.len(), "preprocessed corpus written");
    Ok(())
}
