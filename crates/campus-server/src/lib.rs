//! Server configuration and application wiring for the campus community
//! engine.

use std::path::PathBuf;

use axum::Router;
use campus_core::membership::AutomationActor;
use campus_sync::{Backend, CommunityEngine};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings read from `config.toml` and `CAMPUS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Identity installed as admin of every auto-provisioned community.
  #[serde(default)]
  pub automation_actor_id:   Uuid,
  #[serde(default = "default_actor_name")]
  pub automation_actor_name: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_actor_name() -> String { AutomationActor::default().display_name }

impl ServerConfig {
  pub fn automation_actor(&self) -> AutomationActor {
    AutomationActor {
      actor_id:     self.automation_actor_id,
      display_name: self.automation_actor_name.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API under `/api`, with request tracing.
pub fn app<S: Backend>(store: S) -> Router {
  Router::new()
    .nest("/api", campus_api::api_router(CommunityEngine::new(store)))
    .layer(TraceLayer::new_for_http())
}
