//! Debate Orchestrator server entry point.
//!
//! Wires the Room Registry with concrete LLM/RAG/persistence backends and
//! serves the room-control HTTP/WebSocket surface (spec.md §6.4-6.5).
//! Grounded on the teacher's `main.rs`: layered config load, `init_tracing`,
//! a periodic sweep task spawned alongside the axum server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use debate_config::{load_settings, PhilosopherCatalogue, Settings, StrategyConfig};
use debate_core::RagTimeoutPolicy;
use debate_llm::{HttpLlmClient, HttpLlmConfig, ModelResolver};
use debate_persistence::InMemoryPersistence;
use debate_rag::{RagGatewayImpl, WebSearchBackend, VectorSearchBackend, PhilosopherSearchBackend};
use debate_registry::{Deps, ModelPlan, Registry, RoomTimeouts};
use debate_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("DEBATE_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("Loaded configuration (env: {})", env.as_deref().unwrap_or("default"));
            settings
        }
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Debate Orchestrator server");
    tracing::info!(environment = ?config.environment, "configuration loaded");

    init_metrics();
    tracing::info!("initialized Prometheus metrics at /metrics");

    let philosophers = PhilosopherCatalogue::load(&config.catalogues.philosophers).map_err(|e| {
        tracing::error!(error = %e, "CONFIG_INVALID: fatal philosopher catalogue load failure, aborting startup");
        e
    })?;
    let strategies = StrategyConfig::load(&config.catalogues.strategies).map_err(|e| {
        tracing::error!(error = %e, "CONFIG_INVALID: fatal strategy catalogue load failure, aborting startup");
        e
    })?;

    let deps = build_deps(&config, philosophers, strategies);
    let caps = config.caps.caps_for(config.environment);
    let timeouts = RoomTimeouts {
        llm: config.timeouts.llm_timeout(),
        rag: RagTimeoutPolicy {
            per_source: config.timeouts.rag_per_source_timeout(),
            combined: config.timeouts.rag_combined_timeout(),
        },
        user_turn: config.timeouts.user_turn_timeout(),
    };
    let registry = Registry::new(deps, caps.max_active_rooms, caps.max_memory_usage_gb, timeouts, caps.subscriber_buffer);

    spawn_memory_sweep(registry.clone(), Duration::from_secs(caps.memory_check_interval_mins.max(1) * 60));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(config.clone(), registry, env);
    let app = create_router(state);

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.observability.log_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if config.observability.json_logs {
        let layer = tracing_subscriber::fmt::layer().json().with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    } else {
        let layer = tracing_subscriber::fmt::layer().with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    }
}

/// Builds the shared [`Deps`] the Registry hands to every room task
/// (spec.md §6.1/§6.2/§6.3). The LLM backend talks to a real endpoint; the
/// RAG sub-sources are out of scope for this core (spec.md §1) so the
/// default wiring is the gateway's mock backends until a deployment swaps
/// in real web/vector/philosopher-corpus search adapters behind the same
/// traits.
fn build_deps(config: &Settings, philosophers: PhilosopherCatalogue, strategies: StrategyConfig) -> Deps {
    let endpoint = std::env::var("DEBATE_LLM_ENDPOINT").unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string());
    let api_key = std::env::var("DEBATE_LLM_API_KEY").unwrap_or_default();
    let llm = HttpLlmClient::new(HttpLlmConfig { endpoint, api_key, resolver: ModelResolver::default() });

    let web: Arc<dyn WebSearchBackend> = Arc::new(debate_rag::MockSearchBackend::empty(debate_core::RagSourceKind::Web));
    let vector: Arc<dyn VectorSearchBackend> = Arc::new(debate_rag::MockSearchBackend::empty(debate_core::RagSourceKind::Vector));
    let philosopher_search: Arc<dyn PhilosopherSearchBackend> =
        Arc::new(debate_rag::MockSearchBackend::empty(debate_core::RagSourceKind::Philosopher));
    let rag = RagGatewayImpl::new(web, vector, philosopher_search);

    Deps {
        llm: Arc::new(llm),
        rag: Arc::new(rag),
        persistence: InMemoryPersistence::shared(),
        philosophers: Arc::new(philosophers),
        strategies: Arc::new(strategies),
        models: ModelPlan::default(),
    }
}

/// Periodic `max_memory_usage_gb` sweep (spec.md §4.7/§5:
/// `memory_check_interval` minutes), grounded on the teacher's sweep task
/// spawned alongside the server in `main.rs`.
fn spawn_memory_sweep(registry: Arc<Registry>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            registry.run_memory_sweep().await;
        }
    });
}
