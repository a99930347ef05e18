//! Memberships and the principals that hold them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::community::Community;

// ─── Roles ───────────────────────────────────────────────────────────────────

/// A member's role. Ordered by privilege: `Member < Moderator < Admin`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Member,
  Moderator,
  Admin,
}

// ─── Principals ──────────────────────────────────────────────────────────────

/// The non-human identity installed as the first admin of every
/// auto-provisioned community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationActor {
  pub actor_id:     Uuid,
  pub display_name: String,
}

impl AutomationActor {
  pub fn principal(&self) -> Principal { Principal::Automation(self.actor_id) }
}

impl Default for AutomationActor {
  fn default() -> Self {
    Self {
      actor_id:     Uuid::nil(),
      display_name: "Campus Automation".to_owned(),
    }
  }
}

/// Who holds a membership.
///
/// The discriminant is persisted with the id, so an automation actor can
/// never alias a real account even if the ids coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Principal {
  User(Uuid),
  Automation(Uuid),
}

impl Principal {
  pub fn id(&self) -> Uuid {
    match self {
      Self::User(id) | Self::Automation(id) => *id,
    }
  }
}

impl fmt::Display for Principal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::User(id) => write!(f, "user:{id}"),
      Self::Automation(id) => write!(f, "automation:{id}"),
    }
  }
}

// ─── Membership ──────────────────────────────────────────────────────────────

/// One row of the (community, principal, role) relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub membership_id: Uuid,
  pub community_id:  Uuid,
  pub principal:     Principal,
  pub role:          Role,
  pub active:        bool,
  pub joined_at:     DateTime<Utc>,
  pub left_at:       Option<DateTime<Utc>>,
}

impl Membership {
  pub fn new(
    community_id: Uuid,
    principal: Principal,
    role: Role,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      membership_id: Uuid::new_v4(),
      community_id,
      principal,
      role,
      active: true,
      joined_at: now,
      left_at: None,
    }
  }
}

/// How a departing member's row is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
  /// Keep the row, mark it inactive and stamp `left_at`.
  Deactivate { at: DateTime<Utc> },
  /// Remove the row entirely.
  Delete,
}

/// Outcome of a departure attempt, decided atomically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departed {
  Left,
  /// The row is an admin row and no other active admin exists.
  LastAdmin,
  /// The row is missing or already inactive.
  NotActive,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A member listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEntry {
  pub membership:   Membership,
  pub display_name: String,
}

/// A community the user belongs to, with the user's role there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCommunity {
  pub community: Community,
  pub role:      Role,
}
