//! Best-effort community sync after a user's academic assignment changes.
//!
//! Each level (faculty, course, group) is handled on its own: a failure in
//! one is recorded in the report and never stops the others. Nothing here
//! un-joins a user; old communities are only left through explicit
//! [`Ledger::leave`](crate::Ledger::leave) calls.

use campus_core::{
  Error, ErrorKind, Result,
  academic::{AcademicTriple, AcademicUnit, UnitKind},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Backend, Ledger, Provisioner};

/// Why a level was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// The new id equals the old one.
  Unchanged,
  /// The new id is absent.
  Cleared,
}

/// What happened at one hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LevelOutcome {
  Joined { community_id: Uuid },
  /// The community was provisioned but the user was already an active member.
  AlreadyMember { community_id: Uuid },
  Skipped { reason: SkipReason },
  Failed { kind: ErrorKind, message: String },
}

impl LevelOutcome {
  pub fn is_failure(&self) -> bool { matches!(self, Self::Failed { .. }) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
  pub user_id: Uuid,
  pub faculty: LevelOutcome,
  pub course:  LevelOutcome,
  pub group:   LevelOutcome,
}

impl ReconciliationReport {
  pub fn level(&self, kind: UnitKind) -> &LevelOutcome {
    match kind {
      UnitKind::Faculty => &self.faculty,
      UnitKind::Course => &self.course,
      UnitKind::Group => &self.group,
    }
  }

  pub fn has_failures(&self) -> bool {
    UnitKind::ALL.iter().any(|&kind| self.level(kind).is_failure())
  }
}

#[derive(Clone)]
pub struct Reconciler<S> {
  store:       S,
  provisioner: Provisioner<S>,
  ledger:      Ledger<S>,
}

impl<S: Backend> Reconciler<S> {
  pub fn new(store: S, provisioner: Provisioner<S>, ledger: Ledger<S>) -> Self {
    Self { store, provisioner, ledger }
  }

  /// Provision and join the communities for every level whose id changed to
  /// a non-null value. Never fails; per-level errors land in the report.
  pub async fn reconcile(
    &self,
    user_id: Uuid,
    old: AcademicTriple,
    new: AcademicTriple,
  ) -> ReconciliationReport {
    let (faculty, course, group) = tokio::join!(
      self.reconcile_level(user_id, UnitKind::Faculty, old, new),
      self.reconcile_level(user_id, UnitKind::Course, old, new),
      self.reconcile_level(user_id, UnitKind::Group, old, new),
    );

    let report = ReconciliationReport { user_id, faculty, course, group };
    if report.has_failures() {
      tracing::warn!(%user_id, ?report, "reconciliation finished with failures");
    } else {
      tracing::debug!(%user_id, ?report, "reconciliation finished");
    }
    report
  }

  async fn reconcile_level(
    &self,
    user_id: Uuid,
    kind: UnitKind,
    old: AcademicTriple,
    new: AcademicTriple,
  ) -> LevelOutcome {
    let Some(unit_id) = new.get(kind) else {
      return LevelOutcome::Skipped { reason: SkipReason::Cleared };
    };
    if old.get(kind) == Some(unit_id) {
      return LevelOutcome::Skipped { reason: SkipReason::Unchanged };
    }

    let community = match self.provisioner.provision_for_unit(kind, unit_id).await {
      Ok(community) => community,
      Err(err) => return failed(user_id, kind, unit_id, err),
    };
    let community_id = community.community_id;

    match self.ledger.join(community_id, user_id).await {
      Ok(_) => LevelOutcome::Joined { community_id },
      Err(Error::Conflict(_)) => LevelOutcome::AlreadyMember { community_id },
      Err(err) => failed(user_id, kind, unit_id, err),
    }
  }

  /// Check that every present id names an active unit and that the present
  /// levels form one chain of the hierarchy.
  pub async fn validate_assignment(&self, triple: AcademicTriple) -> Result<()> {
    let faculty = self.resolve(UnitKind::Faculty, triple.faculty_id).await?;
    let course = self.resolve(UnitKind::Course, triple.course_id).await?;
    let group = self.resolve(UnitKind::Group, triple.group_id).await?;

    if let (Some(faculty), Some(course)) = (&faculty, &course) {
      ensure_parent(course, faculty)?;
    }
    match (&course, &group) {
      (Some(course), Some(group)) => ensure_parent(group, course)?,
      // Without a course, a group still has to sit under the faculty.
      (None, Some(group)) => {
        if let Some(faculty) = &faculty {
          let course = self.parent(group).await?;
          ensure_parent(&course, faculty)?;
        }
      }
      _ => {}
    }
    Ok(())
  }

  async fn resolve(&self, kind: UnitKind, unit_id: Option<Uuid>) -> Result<Option<AcademicUnit>> {
    let Some(unit_id) = unit_id else {
      return Ok(None);
    };
    self
      .store
      .get_unit(kind, unit_id)
      .await
      .map_err(Error::infrastructure)?
      .filter(|unit| unit.active)
      .map(Some)
      .ok_or_else(|| Error::NotFound(format!("{kind} {unit_id}")))
  }

  async fn parent(&self, unit: &AcademicUnit) -> Result<AcademicUnit> {
    let (Some(kind), Some(parent_id)) = (unit.kind.parent(), unit.parent_id) else {
      return Err(mismatch(unit));
    };
    self
      .store
      .get_unit(kind, parent_id)
      .await
      .map_err(Error::infrastructure)?
      .ok_or_else(|| mismatch(unit))
  }
}

fn failed(user_id: Uuid, kind: UnitKind, unit_id: Uuid, err: Error) -> LevelOutcome {
  tracing::warn!(%user_id, %kind, %unit_id, error = %err, "reconciliation level failed");
  LevelOutcome::Failed { kind: err.kind(), message: err.to_string() }
}

fn ensure_parent(child: &AcademicUnit, parent: &AcademicUnit) -> Result<()> {
  if child.parent_id == Some(parent.unit_id) {
    Ok(())
  } else {
    Err(mismatch(child))
  }
}

fn mismatch(unit: &AcademicUnit) -> Error {
  Error::InvariantViolation(format!(
    "mismatched academic hierarchy at {} {}",
    unit.kind, unit.unit_id
  ))
}
