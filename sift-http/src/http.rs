use axum::{
    routing::{get, post},
    Router,
};
use sift_llm::SearchModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::apis::search::{handle_follow_up, handle_not_found, handle_search};
use crate::session::{SessionManager, SessionManagerConfig};

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the HTTP server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1:5000")
    pub address: String,
    /// Session manager configuration
    pub session_manager: SessionManagerConfig,
    /// Upper bound on a single model round-trip
    pub upstream_timeout: Duration,
    /// Built browser UI to serve next to the API
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Create a new server config with the given address and default session manager config
    pub fn new(address: String) -> Self {
        Self {
            address,
            session_manager: SessionManagerConfig::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            static_dir: None,
        }
    }

    /// Set the maximum number of stored sessions
    pub fn with_max_sessions(mut self, max_sessions: Option<usize>) -> Self {
        self.session_manager.max_sessions = max_sessions;
        self
    }

    /// Expire sessions idle for longer than `ttl`
    pub fn with_idle_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_manager.idle_ttl = ttl;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }
}

/// Server state holding the session manager and the model
#[derive(Clone)]
pub struct ServerState {
    pub session_manager: Arc<SessionManager>,
    pub model: Arc<dyn SearchModel>,
    pub upstream_timeout: Duration,
}

impl ServerState {
    pub fn new(model: Arc<dyn SearchModel>, session_manager: SessionManager, upstream_timeout: Duration) -> Self {
        Self {
            session_manager: Arc::new(session_manager),
            model,
            upstream_timeout,
        }
    }
}

fn api_routes() -> Router<ServerState> {
    Router::new()
        .route("/search", get(handle_search).fallback(handle_not_found))
        .route("/follow-up", post(handle_follow_up).fallback(handle_not_found))
}

/// Build the application router
/// The API is served at the root and under `/api`; with a static dir, unknown
/// non-API paths fall back to the UI's index.html
pub fn build_router(state: ServerState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .merge(api_routes())
        .nest("/api", api_routes().fallback(handle_not_found));

    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router.fallback(handle_not_found),
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    config: ServerConfig,
    model: Arc<dyn SearchModel>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &config.static_dir {
        if !dir.join("index.html").is_file() {
            return Err(format!(
                "Could not find the build directory: {}, make sure to build the client first",
                dir.display()
            )
            .into());
        }
    }

    let session_manager = SessionManager::new(config.session_manager.clone());

    println!("✓ Session manager initialized");
    if let Some(max) = config.session_manager.max_sessions {
        println!("  Max sessions: \x1b[1m{}\x1b[0m", max);
    } else {
        println!("  Max sessions: \x1b[1munlimited\x1b[0m");
    }
    match config.session_manager.idle_ttl {
        Some(ttl) => println!("  Idle expiry:  \x1b[1m{}s\x1b[0m", ttl.as_secs()),
        None => println!("  Idle expiry:  \x1b[1mnever\x1b[0m"),
    }
    println!("  Model timeout: \x1b[1m{}s\x1b[0m", config.upstream_timeout.as_secs());
    println!();

    let state = ServerState::new(model, session_manager, config.upstream_timeout);
    let app = build_router(state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.address).await?;

    println!("Server starting on \x1b[1mhttp://{}\x1b[0m", config.address);
    println!("\nAvailable endpoints:");
    println!("  \x1b[1mGET  /search?q=<query>\x1b[0m   - Start a grounded web search");
    println!("  \x1b[1mPOST /follow-up\x1b[0m          - Continue a search session");
    println!("  (also mounted under \x1b[1m/api\x1b[0m)");
    if let Some(dir) = &config.static_dir {
        println!("\nServing UI from \x1b[2m{}\x1b[0m", dir.display());
    }

    println!("\nPress Ctrl+C to stop\n");

    info!("HTTP server listening on {}", config.address);

    axum::serve(listener, app).await?;
    Ok(())
}
