//! Probaquiz · Probability Trainer Backend
//!
//! - Axum HTTP API under /api/v1
//! - OpenAI-backed question generation (enabled by OPENAI_API_KEY)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   OPENAI_API_KEY    : enables OpenAI integration if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_MODEL      : default "gpt-4o"
//!   BATCH_TTL_SECS    : question-batch lifetime (default 1800)
//!   AGENT_CONFIG_PATH : path to TOML config (prompt overrides)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use probaquiz_backend::routes::build_router;
use probaquiz_backend::state::AppState;
use probaquiz_backend::telemetry;

fn listen_addr() -> SocketAddr {
  let port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(3000);
  SocketAddr::from(([0, 0, 0, 0], port))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state: question store, provider, prompts.
  let state = Arc::new(AppState::new());
  let app = build_router(state);

  let addr = listen_addr();
  let listener = TcpListener::bind(addr).await?;
  info!(target: "probaquiz_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
