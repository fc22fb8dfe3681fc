//! Policy Mind Map Server
//!
//! Serves the policy review dashboard: a pre-generated mind map of policy
//! documents and a table of facts extracted from them. Provides REST API
//! endpoints for:
//!
//! - Loading, regenerating and downloading the mind map outline
//! - Reviewing, uploading and exporting facts
//! - Jumping from a fact to its source sentence
//!
//! ## Architecture
//!
//! All content comes from flat files read fresh on every request. The only
//! mutable state is the per-session screen, loaded outline, uploaded facts
//! and last search result, held in memory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use policy_engine::patterns::DEFAULT_CONTEXT_RADIUS;
use policy_engine::{AssetPaths, PolicyEngine};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod session;

use api::{
    handle_clear_search, handle_create_session, handle_download_markdown,
    handle_download_outline_json, handle_export_facts, handle_export_sources,
    handle_facts_overview, handle_health, handle_list_sources, handle_load_mindmap,
    handle_locate, handle_parse_outline, handle_regenerate, handle_render_session,
    handle_search, handle_upload_facts, handle_view_event,
};
use session::{SessionStore, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS};

/// Command-line arguments for the policymap server
#[derive(Parser, Debug)]
#[command(name = "policymap-server")]
#[command(about = "Policy mind map and fact review dashboard server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "POLICYMAP_PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "POLICYMAP_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Mind map outline markdown
    #[arg(long, env = "POLICYMAP_OUTLINE", default_value = "mindmap.md")]
    outline: PathBuf,

    /// Fact index JSON
    #[arg(long, env = "POLICYMAP_FACTS", default_value = "factIndex.json")]
    facts: PathBuf,

    /// Source documents JSON (file name -> document)
    #[arg(long, env = "POLICYMAP_SOURCES", default_value = "source_documents.json")]
    sources: PathBuf,

    /// Directory of policy markdown files, used when the sources JSON is absent
    #[arg(long, env = "POLICYMAP_POLICIES_DIR", default_value = "policies")]
    policies_dir: PathBuf,

    /// Characters of context shown around a located sentence
    #[arg(long, env = "POLICYMAP_CONTEXT_RADIUS", default_value_t = DEFAULT_CONTEXT_RADIUS)]
    context_radius: usize,

    /// Maximum concurrent sessions; the least recently seen is evicted
    #[arg(long, env = "POLICYMAP_MAX_SESSIONS", default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,

    /// Seconds of inactivity before a session is dropped
    #[arg(long, env = "POLICYMAP_SESSION_IDLE_SECS", default_value_t = DEFAULT_IDLE_TIMEOUT.as_secs())]
    session_idle_secs: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "POLICYMAP_RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PolicyEngine>,
    pub sessions: SessionStore,
    /// Default context radius for sentence search
    pub context_radius: usize,
}

/// Router with every endpoint, without rate limiting
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // Sessions and screens
        .route("/api/sessions", post(handle_create_session))
        .route("/api/sessions/:id", get(handle_render_session))
        .route("/api/sessions/:id/view", post(handle_view_event))
        // Mind map
        .route("/api/sessions/:id/mindmap", post(handle_load_mindmap))
        .route(
            "/api/sessions/:id/mindmap/regenerate",
            post(handle_regenerate),
        )
        .route(
            "/api/sessions/:id/mindmap/markdown",
            get(handle_download_markdown),
        )
        .route(
            "/api/sessions/:id/mindmap/json",
            get(handle_download_outline_json),
        )
        // Facts
        .route(
            "/api/sessions/:id/facts",
            get(handle_facts_overview).post(handle_upload_facts),
        )
        .route("/api/sessions/:id/facts/export", get(handle_export_facts))
        // Search
        .route(
            "/api/sessions/:id/search",
            post(handle_search).delete(handle_clear_search),
        )
        // Source documents
        .route("/api/sources", get(handle_list_sources))
        .route("/api/sources/export", get(handle_export_sources))
        // Stateless tools
        .route("/api/locate", post(handle_locate))
        .route("/api/outline/parse", post(handle_parse_outline))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting policymap server on {}:{}", args.host, args.port);

    let paths = AssetPaths {
        outline: args.outline,
        facts: args.facts,
        sources: args.sources,
        policies_dir: args.policies_dir,
    };
    info!(
        "Assets: outline={}, facts={}, sources={}, policies={}",
        paths.outline.display(),
        paths.facts.display(),
        paths.sources.display(),
        paths.policies_dir.display()
    );

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let state = AppState {
        engine: Arc::new(PolicyEngine::new(paths)),
        sessions: SessionStore::new(
            args.max_sessions,
            Duration::from_secs(args.session_idle_secs),
        ),
        context_radius: args.context_radius,
    };

    let app = build_router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!(
        "Sessions: at most {}, idle timeout {}s",
        args.max_sessions, args.session_idle_secs
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
