//! Idempotent get-or-create of the community bound to an academic unit.

use campus_core::{
  Error, Result,
  academic::{AcademicUnit, UnitKind},
  community::{Community, CommunityKind, NewDepartment},
  membership::{Membership, Principal, Role},
  store::Inserted,
};
use chrono::Utc;
use uuid::Uuid;

use crate::Backend;

/// Re-reads allowed after losing an insert race. A second loss means the
/// winner's row was deactivated between our insert and re-read.
const MAX_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct Provisioner<S> {
  store: S,
}

impl<S: Backend> Provisioner<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// Return the active community bound to `unit_id`, creating it (with the
  /// automation actor as its only admin) if none exists.
  ///
  /// Concurrent calls for the same unit converge on one row: the loser of
  /// the insert race re-reads and returns the winner's community. An existing
  /// community is returned without consulting the unit's parents.
  pub async fn provision_for_unit(&self, kind: UnitKind, unit_id: Uuid) -> Result<Community> {
    let unit = self.active_unit(kind, unit_id).await?;
    let community_kind = CommunityKind::from(kind);
    let mut text: Option<(String, String)> = None;

    for attempt in 1..=MAX_ATTEMPTS {
      if let Some(existing) = self
        .store
        .find_active_for_unit(community_kind, unit_id)
        .await
        .map_err(Error::infrastructure)?
      {
        tracing::debug!(
          community_id = %existing.community_id,
          %kind,
          %unit_id,
          attempt,
          "community already provisioned"
        );
        return Ok(existing);
      }

      let (name, description) = match text.clone() {
        Some(cached) => cached,
        None => {
          let built = self.display_text(&unit).await?;
          text = Some(built.clone());
          built
        }
      };
      let now = Utc::now();
      let community = Community::academic(kind, unit_id, name, description, now);
      let founder = Membership::new(
        community.community_id,
        self.store.automation_actor().principal(),
        Role::Admin,
        now,
      );

      match self
        .store
        .insert_community(community, founder)
        .await
        .map_err(Error::infrastructure)?
      {
        Inserted::Created(created) => {
          tracing::info!(
            community_id = %created.community_id,
            %kind,
            %unit_id,
            name = %created.name,
            "provisioned community"
          );
          return Ok(created);
        }
        // `insert_community` never reports `Gone`.
        Inserted::Duplicate | Inserted::Gone => {
          tracing::debug!(%kind, %unit_id, attempt, "lost provisioning race, re-reading");
        }
      }
    }

    Err(Error::Conflict(format!(
      "community for {kind} {unit_id} kept changing during provisioning"
    )))
  }

  /// Create a department community with `creator_id` as its admin.
  pub async fn create_department(
    &self,
    creator_id: Uuid,
    input: NewDepartment,
  ) -> Result<Community> {
    if input.name.trim().is_empty() {
      return Err(Error::InvariantViolation(
        "community name must not be blank".to_owned(),
      ));
    }
    if !self
      .store
      .user_exists(creator_id)
      .await
      .map_err(Error::infrastructure)?
    {
      return Err(Error::NotFound(format!("user {creator_id}")));
    }

    let now = Utc::now();
    let community = Community::department(input, now);
    let founder = Membership::new(
      community.community_id,
      Principal::User(creator_id),
      Role::Admin,
      now,
    );

    match self
      .store
      .insert_community(community, founder)
      .await
      .map_err(Error::infrastructure)?
    {
      Inserted::Created(created) => {
        tracing::info!(
          community_id = %created.community_id,
          %creator_id,
          name = %created.name,
          "created department community"
        );
        Ok(created)
      }
      Inserted::Duplicate | Inserted::Gone => {
        Err(Error::Conflict("community already exists".to_owned()))
      }
    }
  }

  async fn active_unit(&self, kind: UnitKind, unit_id: Uuid) -> Result<AcademicUnit> {
    self
      .store
      .get_unit(kind, unit_id)
      .await
      .map_err(Error::infrastructure)?
      .filter(|unit| unit.active)
      .ok_or_else(|| Error::NotFound(format!("{kind} {unit_id}")))
  }

  /// Name and description for a unit's community. Courses and groups embed
  /// their parent's name.
  async fn display_text(&self, unit: &AcademicUnit) -> Result<(String, String)> {
    match unit.kind {
      UnitKind::Faculty => Ok((
        format!("{} Community", unit.name),
        format!("Official community for {}", unit.name),
      )),
      UnitKind::Course => {
        let faculty = self.parent_of(unit).await?;
        Ok((
          format!("{} - {}", unit.name, faculty.name),
          format!("Course community for {}", unit.name),
        ))
      }
      UnitKind::Group => {
        let course = self.parent_of(unit).await?;
        Ok((
          format!("{} - {}", unit.name, course.name),
          format!("Group community for {}", unit.name),
        ))
      }
    }
  }

  async fn parent_of(&self, unit: &AcademicUnit) -> Result<AcademicUnit> {
    let (Some(parent_kind), Some(parent_id)) = (unit.kind.parent(), unit.parent_id) else {
      return Err(Error::InvariantViolation(format!(
        "mismatched academic hierarchy: {} {} has no parent",
        unit.kind, unit.unit_id
      )));
    };

    self
      .store
      .get_unit(parent_kind, parent_id)
      .await
      .map_err(Error::infrastructure)?
      .ok_or_else(|| {
        Error::InvariantViolation(format!(
          "mismatched academic hierarchy: {} {} references missing {parent_kind} {parent_id}",
          unit.kind, unit.unit_id
        ))
      })
  }
}
