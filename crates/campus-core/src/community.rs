//! Communities: discussion spaces, most of them bound to an academic unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::academic::UnitKind;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// What a community is attached to.
///
/// The declaration order is the listing order used by
/// `CommunitiesForUser`: academic levels top-down, then departments.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CommunityKind {
  Faculty,
  Course,
  Group,
  /// Administrative; never bound to a unit, never auto-provisioned.
  Department,
}

impl CommunityKind {
  /// Academic communities are bound to exactly one unit.
  pub fn is_academic(self) -> bool { !matches!(self, Self::Department) }

  /// The unit kind this community kind binds to.
  pub fn unit_kind(self) -> Option<UnitKind> {
    match self {
      Self::Faculty => Some(UnitKind::Faculty),
      Self::Course => Some(UnitKind::Course),
      Self::Group => Some(UnitKind::Group),
      Self::Department => None,
    }
  }
}

impl From<UnitKind> for CommunityKind {
  fn from(kind: UnitKind) -> Self {
    match kind {
      UnitKind::Faculty => Self::Faculty,
      UnitKind::Course => Self::Course,
      UnitKind::Group => Self::Group,
    }
  }
}

// ─── Community ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
  pub community_id:  Uuid,
  pub name:          String,
  pub description:   String,
  pub kind:          CommunityKind,
  /// Present iff `kind` is academic.
  pub bound_unit_id: Option<Uuid>,
  pub allow_posts:   bool,
  pub auto_join:     bool,
  pub active:        bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
}

impl Community {
  /// A freshly provisioned community for an academic unit. Posting and
  /// auto-join are always on for these.
  pub fn academic(
    kind: UnitKind,
    unit_id: Uuid,
    name: String,
    description: String,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      community_id: Uuid::new_v4(),
      name,
      description,
      kind: kind.into(),
      bound_unit_id: Some(unit_id),
      allow_posts: true,
      auto_join: true,
      active: true,
      created_at: now,
      updated_at: None,
    }
  }

  /// A manually created department community.
  pub fn department(input: NewDepartment, now: DateTime<Utc>) -> Self {
    Self {
      community_id:  Uuid::new_v4(),
      name:          input.name.trim().to_owned(),
      description:   input.description,
      kind:          CommunityKind::Department,
      bound_unit_id: None,
      allow_posts:   input.allow_posts,
      auto_join:     input.auto_join,
      active:        true,
      created_at:    now,
      updated_at:    None,
    }
  }

  /// Whether a departing member's row is kept (deactivated) rather than
  /// deleted. Only auto-join academic communities keep rows, so a user whose
  /// assignment round-trips gets the original row back.
  pub fn retains_departed_members(&self) -> bool {
    self.auto_join && self.kind.is_academic()
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input for manually creating a department community.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDepartment {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "default_true")]
  pub allow_posts: bool,
  #[serde(default)]
  pub auto_join:   bool,
}

impl NewDepartment {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      description: String::new(),
      allow_posts: true,
      auto_join:   false,
    }
  }
}

fn default_true() -> bool { true }

/// Partial update of a department community. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub allow_posts: Option<bool>,
  pub auto_join:   Option<bool>,
}

impl CommunityPatch {
  /// Apply the patch in place. Blank strings count as "not provided".
  pub fn apply_to(&self, community: &mut Community) {
    if let Some(name) = self.name.as_deref().map(str::trim)
      && !name.is_empty()
    {
      community.name = name.to_owned();
    }
    if let Some(description) = self.description.as_deref()
      && !description.is_empty()
    {
      community.description = description.to_owned();
    }
    if let Some(allow_posts) = self.allow_posts {
      community.allow_posts = allow_posts;
    }
    if let Some(auto_join) = self.auto_join {
      community.auto_join = auto_join;
    }
  }
}
