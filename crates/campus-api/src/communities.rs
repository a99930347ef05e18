//! Handlers for `/communities` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/communities` | Body: [`CreateBody`]; creates a department, returns 201 |
//! | `GET`    | `/communities/:id` | 404 if missing or inactive |
//! | `PATCH`  | `/communities/:id` | Body: [`CommunityPatch`]; departments only |
//! | `DELETE` | `/communities/:id` | Cascades to memberships; departments only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::community::{Community, CommunityPatch, NewDepartment};
use campus_sync::{Backend, CommunityEngine};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Becomes the first admin.
  pub creator_id: Uuid,
  #[serde(flatten)]
  pub department: NewDepartment,
}

/// `POST /communities`, body: `{"creator_id":"…","name":"Library"}`
pub async fn create<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let community = engine
    .provisioner
    .create_department(body.creator_id, body.department)
    .await?;
  Ok((StatusCode::CREATED, Json(community)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /communities/:id`
pub async fn get_one<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Community>, ApiError> {
  Ok(Json(engine.lifecycle.get(id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /communities/:id`
pub async fn update<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<CommunityPatch>,
) -> Result<Json<Community>, ApiError> {
  Ok(Json(engine.lifecycle.update(id, patch).await?))
}

// ─── Deactivate ───────────────────────────────────────────────────────────────

/// `DELETE /communities/:id`
pub async fn deactivate<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  engine.lifecycle.deactivate(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
