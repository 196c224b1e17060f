use anyhow::{Context, Result};
use clap::Parser;
use memory_augment_composer::{
    config::{parse_list, DEFAULT_BIND_ADDR, DEFAULT_MAX_BLOCK_LENGTH, DEFAULT_RESULT_LIMIT},
    router, AppState, AugmentConfig, AugmentPipeline,
};
use memory_augment_retrieval::{RetryPolicy, ServiceConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Webhook receiver that augments agent memory with knowledge-graph,
/// event-data and paper-index context.
#[derive(Debug, Parser)]
#[command(name = "memory-augment", version)]
struct Args {
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    #[arg(long, env = "GRAPH_SERVICE_URL", default_value = "http://127.0.0.1:8000")]
    graph_url: String,

    #[arg(long, env = "GRAPH_GROUP_FILTER", default_value = "")]
    graph_group_filter: String,

    #[arg(long, env = "EVENTS_SERVICE_URL", default_value = "http://127.0.0.1:8001")]
    events_url: String,

    #[arg(long, env = "PAPERS_SERVICE_URL", default_value = "http://127.0.0.1:8002")]
    papers_url: String,

    #[arg(long, env = "MEMORY_STORE_URL", default_value = "http://127.0.0.1:8283")]
    store_url: String,

    #[arg(long, env = "MEMORY_STORE_API_KEY")]
    store_api_key: Option<String>,

    /// Per-call timeout for every collaborator
    #[arg(long, env = "RETRIEVAL_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, env = "RETRIEVAL_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    #[arg(long, env = "MAX_BLOCK_LENGTH", default_value_t = DEFAULT_MAX_BLOCK_LENGTH)]
    max_block_length: usize,

    #[arg(long, env = "RESULT_LIMIT", default_value_t = DEFAULT_RESULT_LIMIT)]
    result_limit: usize,
}

impl Args {
    fn into_config(self) -> AugmentConfig {
        let mut store = ServiceConfig::new(self.store_url);
        if let Some(key) = self.store_api_key {
            store = store.with_api_key(key);
        }

        AugmentConfig {
            graph: ServiceConfig::new(self.graph_url),
            events: ServiceConfig::new(self.events_url),
            papers: ServiceConfig::new(self.papers_url),
            store,
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            },
            max_block_length: self.max_block_length,
            result_limit: self.result_limit,
            group_filter: parse_list(&self.graph_group_filter),
            bind_addr: self.bind_addr,
        }
        .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Memory Augment Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Args::parse().into_config();
    config.validate().context("invalid configuration")?;

    info!(
        "Collaborators: graph={} events={} papers={} store={}",
        config.graph.base_url, config.events.base_url, config.papers.base_url, config.store.base_url
    );

    let pipeline = AugmentPipeline::from_config(&config)?;
    let app = router(AppState {
        pipeline: Arc::new(pipeline),
    });

    info!("Starting HTTP server on http://{}", config.bind_addr);
    info!("Webhook endpoint: http://{}/v1/webhook/message", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
