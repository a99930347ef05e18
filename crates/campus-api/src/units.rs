//! Handlers for `/units` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/units/:kind/:id/community` | Get-or-create; `kind` is `faculty\|course\|group` |
//! | `DELETE` | `/units/:kind/:id/community` | Only once the unit is gone from the hierarchy |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use campus_core::{academic::UnitKind, community::Community};
use campus_sync::{Backend, CommunityEngine};
use uuid::Uuid;

use crate::error::ApiError;

/// `POST /units/:kind/:id/community`
pub async fn provision<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path((kind, id)): Path<(UnitKind, Uuid)>,
) -> Result<Json<Community>, ApiError> {
  let community = engine.provisioner.provision_for_unit(kind, id).await?;
  Ok(Json(community))
}

/// `DELETE /units/:kind/:id/community`
pub async fn retire<S: Backend>(
  State(engine): State<Arc<CommunityEngine<S>>>,
  Path((kind, id)): Path<(UnitKind, Uuid)>,
) -> Result<StatusCode, ApiError> {
  engine.lifecycle.retire_unit_community(kind, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
