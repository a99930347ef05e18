//! Handlers for `/communities/:id/members` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/communities/:id/members` | Admins, then moderators, then members |
//! | `POST`   | `/communities/:id/members` | Body: `{"user_id":"…"}`; returns 201 |
//! | `DELETE` | `/communities/:id/members/:user_id` | 400 for the sole admin |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::membership::MemberEntry;
use campus_sync::{Backend, CommunityEngine};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /communities/:id/members`
pub async fn list<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<MemberEntry>>, ApiError> {
  Ok(Json(engine.ledger.list_members(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
  pub user_id: Uuid,
}

/// `POST /communities/:id/members`
pub async fn join<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<JoinBody>,
) -> Result<impl IntoResponse, ApiError> {
  let membership = engine.ledger.join(id, body.user_id).await?;
  Ok((StatusCode::CREATED, Json(membership)))
}

/// `DELETE /communities/:id/members/:user_id`
pub async fn leave<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  engine.ledger.leave(id, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
