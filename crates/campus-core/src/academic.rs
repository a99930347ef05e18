//! Academic units and a user's placement within them.
//!
//! The hierarchy is a fixed three-level tree: a group belongs to a course,
//! a course belongs to a faculty. Units are owned by the academic module;
//! this crate only describes what a lookup returns.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The level of an academic unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
  Faculty,
  Course,
  Group,
}

impl UnitKind {
  /// All levels, top-down.
  pub const ALL: [UnitKind; 3] = [Self::Faculty, Self::Course, Self::Group];

  /// The kind of this unit's parent, if it has one.
  pub fn parent(self) -> Option<UnitKind> {
    match self {
      Self::Faculty => None,
      Self::Course => Some(Self::Faculty),
      Self::Group => Some(Self::Course),
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Faculty => "faculty",
      Self::Course => "course",
      Self::Group => "group",
    }
  }
}

impl fmt::Display for UnitKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The result of an academic-directory lookup.
///
/// Parents are referenced by id only; callers resolve them with another
/// lookup when they need the parent's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicUnit {
  pub unit_id:   Uuid,
  pub kind:      UnitKind,
  pub name:      String,
  /// Course → faculty, group → course. Always `None` for faculties.
  pub parent_id: Option<Uuid>,
  pub active:    bool,
}

/// A user's (faculty, course, group) assignment. Each level is independently
/// optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicTriple {
  #[serde(default)]
  pub faculty_id: Option<Uuid>,
  #[serde(default)]
  pub course_id:  Option<Uuid>,
  #[serde(default)]
  pub group_id:   Option<Uuid>,
}

impl AcademicTriple {
  pub fn new(
    faculty_id: Option<Uuid>,
    course_id: Option<Uuid>,
    group_id: Option<Uuid>,
  ) -> Self {
    Self { faculty_id, course_id, group_id }
  }

  /// The unit assigned at `kind`'s level.
  pub fn get(&self, kind: UnitKind) -> Option<Uuid> {
    match kind {
      UnitKind::Faculty => self.faculty_id,
      UnitKind::Course => self.course_id,
      UnitKind::Group => self.group_id,
    }
  }
}
