use anyhow::Result;
use axum::Router;
use boolret_core::{Grammar, QueryOptions, TermResolution};
use clap::Parser;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Document store directory
    #[arg(long, default_value = "./store")]
    store: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Default grammar: reference | extended
    #[arg(long, default_value = "reference")]
    grammar: Grammar,
    /// Default term resolution: normalized | stem-only
    #[arg(long, default_value = "normalized")]
    terms: TermResolution,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let options = QueryOptions { grammar: args.grammar, terms: args.terms };
    let app: Router = build_app(ServerConfig::from_env(&args.store, options))?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
