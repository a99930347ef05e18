//! Handlers for per-user endpoints and assignment checks.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/:id/communities` | With the user's role in each |
//! | `POST` | `/users/:id/reconcile` | Body: `{"old":{…},"new":{…}}`; always 200 with a report |
//! | `POST` | `/assignments/validate` | Body: an academic triple; 204 if consistent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use campus_core::{academic::AcademicTriple, membership::UserCommunity};
use campus_sync::{Backend, CommunityEngine, ReconciliationReport};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /users/:id/communities`
pub async fn communities<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserCommunity>>, ApiError> {
  Ok(Json(engine.ledger.communities_for_user(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReconcileBody {
  #[serde(default)]
  pub old: AcademicTriple,
  pub new: AcademicTriple,
}

/// `POST /users/:id/reconcile`
pub async fn reconcile<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ReconcileBody>,
) -> Json<ReconciliationReport> {
  Json(engine.reconciler.reconcile(id, body.old, body.new).await)
}

/// `POST /assignments/validate`
pub async fn validate<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Json(triple): Json<AcademicTriple>,
) -> Result<StatusCode, ApiError> {
  engine.reconciler.validate_assignment(triple).await?;
  Ok(StatusCode::NO_CONTENT)
}
