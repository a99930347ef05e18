//! Collaborator traits consumed by the engine.
//!
//! Implemented by storage backends (e.g. `campus-store-sqlite`). The engine
//! depends on these abstractions, never on a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  academic::{AcademicUnit, UnitKind},
  community::{Community, CommunityKind},
  membership::{
    AutomationActor, Departed, Departure, Membership, Principal, UserCommunity,
  },
};

/// Result of an insert guarded by a uniqueness constraint.
///
/// Losing a uniqueness race is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted<T> {
  Created(T),
  /// A conflicting row already exists; nothing was written.
  Duplicate,
  /// The row this one belongs to is missing or inactive; nothing was written.
  Gone,
}

// ─── Academic hierarchy ──────────────────────────────────────────────────────

/// Read-only lookups into the academic hierarchy.
pub trait AcademicDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up a unit of the given kind. Inactive units are returned with
  /// `active == false`; `None` means no unit of that kind has this id.
  fn get_unit(
    &self,
    kind: UnitKind,
    unit_id: Uuid,
  ) -> impl Future<Output = Result<Option<AcademicUnit>, Self::Error>> + Send + '_;
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Read-only lookups into the account system.
pub trait IdentityDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn user_exists(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Human-readable name for listings. `None` if the user is unknown.
  fn display_name(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// The identity installed as admin of auto-provisioned communities.
  fn automation_actor(&self) -> &AutomationActor;
}

// ─── Persistence ─────────────────────────────────────────────────────────────

/// Persistence for communities and memberships.
///
/// Backends must enforce two uniqueness constraints:
/// - at most one *active* community per `(kind, bound_unit_id)`;
/// - at most one membership row per `(community_id, principal)`.
pub trait CommunityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Communities ───────────────────────────────────────────────────────

  /// Insert a community together with its founding membership, atomically.
  /// Returns [`Inserted::Duplicate`] if an active community is already bound
  /// to the same unit.
  fn insert_community(
    &self,
    community: Community,
    founder: Membership,
  ) -> impl Future<Output = Result<Inserted<Community>, Self::Error>> + Send + '_;

  /// Fetch a community by id regardless of its active flag.
  fn get_community(
    &self,
    community_id: Uuid,
  ) -> impl Future<Output = Result<Option<Community>, Self::Error>> + Send + '_;

  /// The active community bound to `unit_id`, if any.
  fn find_active_for_unit(
    &self,
    kind: CommunityKind,
    unit_id: Uuid,
  ) -> impl Future<Output = Result<Option<Community>, Self::Error>> + Send + '_;

  /// Persist the mutable fields of an active community. Returns `false` if
  /// the community is missing or no longer active.
  fn update_community(
    &self,
    community: Community,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark a community inactive and deactivate all of its active memberships
  /// in one step, stamping `at` on both. Returns the number of memberships
  /// deactivated, or `None` if the community was not active.
  fn deactivate_community(
    &self,
    community_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<usize>, Self::Error>> + Send + '_;

  // ── Memberships ───────────────────────────────────────────────────────

  /// Insert a membership row. Returns [`Inserted::Duplicate`] if a row for
  /// the same `(community, principal)` already exists, and [`Inserted::Gone`]
  /// if the community is not active at the moment of the write.
  fn insert_membership(
    &self,
    membership: Membership,
  ) -> impl Future<Output = Result<Inserted<Membership>, Self::Error>> + Send + '_;

  /// The membership row for `principal` in a community, active or not.
  fn find_membership(
    &self,
    community_id: Uuid,
    principal: Principal,
  ) -> impl Future<Output = Result<Option<Membership>, Self::Error>> + Send + '_;

  /// Reactivate an inactive row: set active, clear `left_at`, set
  /// `joined_at`. Returns `false` if the row is missing, already active, or
  /// belongs to a community that is no longer active.
  fn reactivate_membership(
    &self,
    membership_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Retire an active row. The last-admin check and the write happen
  /// atomically: an admin row is only retired while another active admin
  /// exists in the same community.
  fn depart_membership(
    &self,
    membership_id: Uuid,
    departure: Departure,
  ) -> impl Future<Output = Result<Departed, Self::Error>> + Send + '_;

  /// All active memberships of a community, in no particular order.
  fn list_active_memberships(
    &self,
    community_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Membership>, Self::Error>> + Send + '_;

  /// Active communities in which `principal` holds an active membership.
  fn communities_for_principal(
    &self,
    principal: Principal,
  ) -> impl Future<Output = Result<Vec<UserCommunity>, Self::Error>> + Send + '_;
}
