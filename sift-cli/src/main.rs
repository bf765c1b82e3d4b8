use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use sift_http::{start_server, ServerConfig};
use sift_llm::{GeminiClient, GeminiConfig, GenerationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Grounded web search assistant backed by Gemini
#[derive(Parser, Debug)]
#[command(name = "sift", version, about)]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, env = "SIFT_ADDRESS", default_value = "127.0.0.1:5000")]
    address: String,

    /// Google AI Studio API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Gemini model name
    #[arg(long, env = "SIFT_MODEL", default_value = sift_llm::gemini::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.9)]
    temperature: f32,

    /// Maximum tokens per answer
    #[arg(long, default_value_t = 2048)]
    max_output_tokens: u32,

    /// Maximum number of stored sessions, least recently used evicted first (unset = unlimited)
    #[arg(long, env = "SIFT_MAX_SESSIONS")]
    max_sessions: Option<usize>,

    /// Expire sessions idle for this many seconds (unset = never)
    #[arg(long, env = "SIFT_SESSION_TTL_SECS")]
    session_ttl_secs: Option<u64>,

    /// Give up on a model request after this many seconds
    #[arg(long, env = "SIFT_UPSTREAM_TIMEOUT_SECS", default_value_t = 60)]
    upstream_timeout_secs: u64,

    /// Directory holding the built browser UI
    #[arg(long, env = "SIFT_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    validate(&args)?;

    let gemini = GeminiConfig::new(args.api_key.trim())
        .with_model(&args.model)
        .with_generation(GenerationConfig {
            temperature: args.temperature,
            max_output_tokens: args.max_output_tokens,
            ..GenerationConfig::default()
        });
    info!("Using model {}", gemini.model);
    let model = Arc::new(GeminiClient::new(gemini));

    let config = ServerConfig::new(args.address)
        .with_max_sessions(args.max_sessions)
        .with_idle_ttl(args.session_ttl_secs.map(Duration::from_secs))
        .with_upstream_timeout(Duration::from_secs(args.upstream_timeout_secs))
        .with_static_dir(args.static_dir);

    start_server(config, model)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}

/// Reject settings clap accepts but the server cannot run with
fn validate(args: &Args) -> Result<()> {
    if args.api_key.trim().is_empty() {
        bail!("GOOGLE_API_KEY must not be empty");
    }
    if args.upstream_timeout_secs == 0 {
        bail!("--upstream-timeout-secs must be greater than zero");
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
