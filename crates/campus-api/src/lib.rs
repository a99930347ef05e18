//! JSON REST API for the campus community engine.
//!
//! Exposes an axum [`Router`] backed by any [`campus_sync::Backend`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", campus_api::api_router(CommunityEngine::new(store)))
//! ```

pub mod communities;
pub mod error;
pub mod members;
pub mod units;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use campus_sync::{Backend, CommunityEngine};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Backend>(engine: CommunityEngine<S>) -> Router<()> {
  Router::new()
    // Academic units
    .route(
      "/units/{kind}/{id}/community",
      post(units::provision::<S>).delete(units::retire::<S>),
    )
    // Communities
    .route("/communities", post(communities::create::<S>))
    .route(
      "/communities/{id}",
      get(communities::get_one::<S>)
        .patch(communities::update::<S>)
        .delete(communities::deactivate::<S>),
    )
    // Members
    .route(
      "/communities/{id}/members",
      get(members::list::<S>).post(members::join::<S>),
    )
    .route("/communities/{id}/members/{user_id}", delete(members::leave::<S>))
    // Users
    .route("/users/{id}/communities", get(users::communities::<S>))
    .route("/users/{id}/reconcile", post(users::reconcile::<S>))
    .route("/assignments/validate", post(users::validate::<S>))
    .with_state(Arc::new(engine))
}

#[cfg(test)]
mod tests;
