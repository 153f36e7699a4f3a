//! kvsearch HTTP server
//!
//! Serves boolean term searches over an index laid out as key-value blobs in
//! a local directory, one file per key.
//!
//! # Endpoints
//!
//! - `<any method> /search?q=...` - run a query
//! - `OPTIONS <any path>` - CORS preflight
//!
//! # Example
//!
//! ```bash
//! kvsearch-httpd \
//!   --config /srv/index/config.json \
//!   --data-dir /srv/index/kv \
//!   --listen 0.0.0.0:8080
//! ```

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use kvsearch_engine::{EnginePool, NativeEngine, QueryEngine};
use kvsearch_kvstore::{KvStore, LocalFsKvStore};
use kvsearch_query::{SearchConfig, SearchService};
use tracing::info;

mod routes;

#[derive(Parser, Debug)]
#[command(name = "kvsearch-httpd")]
#[command(about = "HTTP server for kvsearch term queries")]
#[command(version)]
struct Args {
    /// Service configuration emitted by the index build
    #[arg(long, env = "KVSEARCH_CONFIG")]
    config: PathBuf,

    /// Directory holding one file per store key
    #[arg(long, env = "KVSEARCH_DATA_DIR")]
    data_dir: PathBuf,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8080", env = "KVSEARCH_LISTEN")]
    listen: SocketAddr,

    /// Number of query engines, i.e. queries executing at once
    #[arg(long, default_value = "4", env = "KVSEARCH_ENGINES")]
    engines: usize,

    /// Linear memory of each query engine, in MiB
    #[arg(long, default_value = "16", env = "KVSEARCH_ENGINE_MEMORY_MIB")]
    engine_memory_mib: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kvsearch=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let args = Args::parse();
    info!(
        config = %args.config.display(),
        data_dir = %args.data_dir.display(),
        listen = %args.listen,
        engines = args.engines,
        "Starting kvsearch HTTP server"
    );

    let config = SearchConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let store: Arc<dyn KvStore> = Arc::new(LocalFsKvStore::new(&args.data_dir)?);

    let options = config.engine_options(args.engine_memory_mib * 1024 * 1024);
    let engines = EnginePool::with_factory(args.engines, || {
        Ok(Box::new(NativeEngine::new(options.clone())?) as Box<dyn QueryEngine>)
    })?;
    let service = SearchService::new(config, store, engines)?;

    let app = routes::router(Arc::new(routes::AppState { service }));
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    info!(address = %args.listen, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
