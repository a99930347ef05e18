//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, enums as lowercase words. Booleans use SQLite integers.

use campus_core::{
  academic::{AcademicUnit, UnitKind},
  community::{Community, CommunityKind},
  membership::{Membership, Principal, Role},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── UnitKind ────────────────────────────────────────────────────────────────

pub fn encode_unit_kind(k: UnitKind) -> &'static str { k.as_str() }

pub fn decode_unit_kind(s: &str) -> Result<UnitKind> {
  match s {
    "faculty" => Ok(UnitKind::Faculty),
    "course" => Ok(UnitKind::Course),
    "group" => Ok(UnitKind::Group),
    other => Err(unknown("academic_units.kind", other)),
  }
}

// ─── CommunityKind ───────────────────────────────────────────────────────────

pub fn encode_community_kind(k: CommunityKind) -> &'static str {
  match k {
    CommunityKind::Faculty => "faculty",
    CommunityKind::Course => "course",
    CommunityKind::Group => "group",
    CommunityKind::Department => "department",
  }
}

pub fn decode_community_kind(s: &str) -> Result<CommunityKind> {
  match s {
    "faculty" => Ok(CommunityKind::Faculty),
    "course" => Ok(CommunityKind::Course),
    "group" => Ok(CommunityKind::Group),
    "department" => Ok(CommunityKind::Department),
    other => Err(unknown("communities.kind", other)),
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Member => "member",
    Role::Moderator => "moderator",
    Role::Admin => "admin",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "member" => Ok(Role::Member),
    "moderator" => Ok(Role::Moderator),
    "admin" => Ok(Role::Admin),
    other => Err(unknown("memberships.role", other)),
  }
}

// ─── Principal ───────────────────────────────────────────────────────────────

/// Split a principal into its `(principal_kind, principal_id)` columns.
pub fn encode_principal(p: Principal) -> (&'static str, String) {
  match p {
    Principal::User(id) => ("user", encode_uuid(id)),
    Principal::Automation(id) => ("automation", encode_uuid(id)),
  }
}

pub fn decode_principal(kind: &str, id: &str) -> Result<Principal> {
  let id = decode_uuid(id)?;
  match kind {
    "user" => Ok(Principal::User(id)),
    "automation" => Ok(Principal::Automation(id)),
    other => Err(unknown("memberships.principal_kind", other)),
  }
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownValue { column, value: value.to_owned() }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const UNIT_COLUMNS: &str = "unit_id, kind, name, parent_id, active";

/// Raw values read directly from an `academic_units` row.
pub struct RawUnit {
  pub unit_id:   String,
  pub kind:      String,
  pub name:      String,
  pub parent_id: Option<String>,
  pub active:    bool,
}

impl RawUnit {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      unit_id:   row.get(0)?,
      kind:      row.get(1)?,
      name:      row.get(2)?,
      parent_id: row.get(3)?,
      active:    row.get(4)?,
    })
  }

  pub fn into_unit(self) -> Result<AcademicUnit> {
    Ok(AcademicUnit {
      unit_id:   decode_uuid(&self.unit_id)?,
      kind:      decode_unit_kind(&self.kind)?,
      name:      self.name,
      parent_id: self.parent_id.as_deref().map(decode_uuid).transpose()?,
      active:    self.active,
    })
  }
}

/// Column list matching [`RawCommunity::from_row`]. Prefixed with `c.` so it
/// can be used in joins.
pub const COMMUNITY_COLUMNS: &str = "c.community_id, c.name, c.description, \
  c.kind, c.bound_unit_id, c.allow_posts, c.auto_join, c.active, \
  c.created_at, c.updated_at";

/// Raw values read directly from a `communities` row.
pub struct RawCommunity {
  pub community_id:  String,
  pub name:          String,
  pub description:   String,
  pub kind:          String,
  pub bound_unit_id: Option<String>,
  pub allow_posts:   bool,
  pub auto_join:     bool,
  pub active:        bool,
  pub created_at:    String,
  pub updated_at:    Option<String>,
}

impl RawCommunity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      community_id:  row.get(0)?,
      name:          row.get(1)?,
      description:   row.get(2)?,
      kind:          row.get(3)?,
      bound_unit_id: row.get(4)?,
      allow_posts:   row.get(5)?,
      auto_join:     row.get(6)?,
      active:        row.get(7)?,
      created_at:    row.get(8)?,
      updated_at:    row.get(9)?,
    })
  }

  pub fn into_community(self) -> Result<Community> {
    Ok(Community {
      community_id:  decode_uuid(&self.community_id)?,
      name:          self.name,
      description:   self.description,
      kind:          decode_community_kind(&self.kind)?,
      bound_unit_id: self.bound_unit_id.as_deref().map(decode_uuid).transpose()?,
      allow_posts:   self.allow_posts,
      auto_join:     self.auto_join,
      active:        self.active,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    self.updated_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Column list matching [`RawMembership::from_row`].
pub const MEMBERSHIP_COLUMNS: &str = "m.membership_id, m.community_id, \
  m.principal_kind, m.principal_id, m.role, m.active, m.joined_at, m.left_at";

/// Raw values read directly from a `memberships` row.
pub struct RawMembership {
  pub membership_id:  String,
  pub community_id:   String,
  pub principal_kind: String,
  pub principal_id:   String,
  pub role:           String,
  pub active:         bool,
  pub joined_at:      String,
  pub left_at:        Option<String>,
}

impl RawMembership {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      membership_id:  row.get(0)?,
      community_id:   row.get(1)?,
      principal_kind: row.get(2)?,
      principal_id:   row.get(3)?,
      role:           row.get(4)?,
      active:         row.get(5)?,
      joined_at:      row.get(6)?,
      left_at:        row.get(7)?,
    })
  }

  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      membership_id: decode_uuid(&self.membership_id)?,
      community_id:  decode_uuid(&self.community_id)?,
      principal:     decode_principal(&self.principal_kind, &self.principal_id)?,
      role:          decode_role(&self.role)?,
      active:        self.active,
      joined_at:     decode_dt(&self.joined_at)?,
      left_at:       self.left_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
