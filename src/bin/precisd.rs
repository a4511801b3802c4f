//! precisd: Precis summarization daemon.
//!
//! Serves the [`Summarizer`](precis::Summarizer) over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use precis::server::config::{Config, Secrets, StoreBackend};
use precis::server::{ApiKeys, AppState, build_router, cors_layer};
use precis::{CacheConfig, KvStore, MemoryStore, PrecisError, RateLimitConfig, Summarizer};

/// Precis daemon: LLM summarization with extractive fallback.
#[derive(Parser)]
#[command(name = "precisd")]
#[command(version)]
#[command(about = "Precis summarization daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "PRECIS_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    init_tracing(&config);

    let api_keys = ApiKeys::new(secrets.allowed_api_keys()?);
    let summarizer = build_summarizer(&config, &secrets)?;

    // Parse address
    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| PrecisError::Configuration(format!("Invalid address: {e}")))?;

    let state = AppState {
        summarizer: Arc::new(summarizer),
        api_keys: Arc::new(api_keys),
        max_text_length: config.server.max_text_length,
        default_language: config.lang_default()?,
        request_timeout: config.request_timeout(),
    };
    let router = build_router(state, cors_layer(&config.cors_origins())?);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        model = %config.openai.model,
        llm_timeout_ms = config.openai.timeout_ms,
        store_enabled = config.store.enabled,
        "precisd starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("precisd stopped");
    Ok(())
}

/// JSON log lines, filtered by `RUST_LOG` or the configured level.
fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter_directive()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Build the [`Summarizer`] from configuration.
fn build_summarizer(config: &Config, secrets: &Secrets) -> Result<Summarizer, PrecisError> {
    let mut builder = Summarizer::builder()
        .openai(secrets.openai_api_key()?)
        .openai_base_url(&config.openai.base_url)
        .model(&config.openai.model)
        .llm_timeout(config.llm_timeout())
        .retry(config.retry())
        .primary_budget(config.primary_budget())
        .cache_config(CacheConfig::new().ttl(Duration::from_secs(config.cache.ttl_seconds)))
        .rate_limit(
            RateLimitConfig::new()
                .max_requests(config.rate_limit.requests)
                .window(Duration::from_secs(config.rate_limit.window_seconds)),
        );

    if let Some(store) = build_store(config)? {
        builder = builder.store(store);
    } else {
        warn!("shared store disabled, caching and rate limiting are off");
    }

    builder.build()
}

fn build_store(config: &Config) -> Result<Option<Arc<dyn KvStore>>, PrecisError> {
    if !config.store.enabled {
        return Ok(None);
    }
    match config.store.backend {
        StoreBackend::Memory => Ok(Some(Arc::new(MemoryStore::new()))),
        #[cfg(feature = "redis")]
        StoreBackend::Redis => {
            let store = precis::RedisStore::open(&config.store.redis_url)?
                .op_timeout(Duration::from_millis(config.store.op_timeout_ms));
            Ok(Some(Arc::new(store)))
        }
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis => {
            warn!("built without the redis feature, using the in-memory store");
            Ok(Some(Arc::new(MemoryStore::new())))
        }
    }
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
