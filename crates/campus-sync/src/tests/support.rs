//! Shared fixtures: a small academic hierarchy and a store wrapper that can
//! be told to fail.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex},
};

use campus_core::{
  academic::{AcademicUnit, UnitKind},
  community::{Community, CommunityKind},
  membership::{AutomationActor, Departed, Departure, Membership, Principal, UserCommunity},
  store::{AcademicDirectory, CommunityStore, IdentityDirectory, Inserted},
};
use campus_store_sqlite::SqliteStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::CommunityEngine;

/// Engineering has two courses with one group each; Medicine has one course
/// and no groups.
pub struct Campus {
  pub store:       SqliteStore,
  pub engineering: AcademicUnit,
  pub year_one:    AcademicUnit,
  pub year_two:    AcademicUnit,
  pub group_a:     AcademicUnit,
  pub group_b:     AcademicUnit,
  pub medicine:    AcademicUnit,
  pub anatomy:     AcademicUnit,
}

impl Campus {
  pub async fn new() -> Self {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");

    let engineering = store.add_unit(UnitKind::Faculty, "F-ENG", None).await.unwrap();
    let year_one = store
      .add_unit(UnitKind::Course, "Year 1", Some(engineering.unit_id))
      .await
      .unwrap();
    let year_two = store
      .add_unit(UnitKind::Course, "Year 2", Some(engineering.unit_id))
      .await
      .unwrap();
    let group_a = store
      .add_unit(UnitKind::Group, "IS-11", Some(year_one.unit_id))
      .await
      .unwrap();
    let group_b = store
      .add_unit(UnitKind::Group, "IS-21", Some(year_two.unit_id))
      .await
      .unwrap();
    let medicine = store.add_unit(UnitKind::Faculty, "F-MED", None).await.unwrap();
    let anatomy = store
      .add_unit(UnitKind::Course, "Anatomy", Some(medicine.unit_id))
      .await
      .unwrap();

    Self { store, engineering, year_one, year_two, group_a, group_b, medicine, anatomy }
  }

  pub fn engine(&self) -> CommunityEngine<SqliteStore> {
    CommunityEngine::new(self.store.clone())
  }

  pub async fn user(&self, first: &str, last: &str) -> Uuid {
    self.store.add_user(first, last).await.unwrap()
  }
}

// ─── Fault injection ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FlakyError {
  #[error("injected failure for unit {0}")]
  Injected(Uuid),
  #[error(transparent)]
  Store(#[from] campus_store_sqlite::Error),
}

/// Delegates to a [`SqliteStore`] with three injectable faults:
///
/// - looking up the community of a unit in `failing` returns
///   [`FlakyError::Injected`];
/// - units in `hidden` are reported as absent from the hierarchy;
/// - the next `find_membership` call first deactivates the community set
///   with [`FlakyStore::deactivate_on_next_lookup`].
#[derive(Clone)]
pub struct FlakyStore {
  pub inner:            SqliteStore,
  failing:              Arc<HashSet<Uuid>>,
  hidden:               Arc<HashSet<Uuid>>,
  pending_deactivation: Arc<Mutex<Option<Uuid>>>,
}

impl FlakyStore {
  pub fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      failing: Arc::default(),
      hidden: Arc::default(),
      pending_deactivation: Arc::default(),
    }
  }

  pub fn failing(mut self, units: impl IntoIterator<Item = Uuid>) -> Self {
    self.failing = Arc::new(units.into_iter().collect());
    self
  }

  pub fn hiding(mut self, units: impl IntoIterator<Item = Uuid>) -> Self {
    self.hidden = Arc::new(units.into_iter().collect());
    self
  }

  pub fn deactivate_on_next_lookup(&self, community_id: Uuid) {
    *self.pending_deactivation.lock().unwrap() = Some(community_id);
  }
}

impl AcademicDirectory for FlakyStore {
  type Error = campus_store_sqlite::Error;

  async fn get_unit(
    &self,
    kind: UnitKind,
    unit_id: Uuid,
  ) -> Result<Option<AcademicUnit>, Self::Error> {
    if self.hidden.contains(&unit_id) {
      return Ok(None);
    }
    self.inner.get_unit(kind, unit_id).await
  }
}

impl IdentityDirectory for FlakyStore {
  type Error = campus_store_sqlite::Error;

  async fn user_exists(&self, user_id: Uuid) -> Result<bool, Self::Error> {
    self.inner.user_exists(user_id).await
  }

  async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, Self::Error> {
    self.inner.display_name(user_id).await
  }

  fn automation_actor(&self) -> &AutomationActor { self.inner.automation_actor() }
}

impl CommunityStore for FlakyStore {
  type Error = FlakyError;

  async fn insert_community(
    &self,
    community: Community,
    founder: Membership,
  ) -> Result<Inserted<Community>, Self::Error> {
    Ok(self.inner.insert_community(community, founder).await?)
  }

  async fn get_community(&self, community_id: Uuid) -> Result<Option<Community>, Self::Error> {
    Ok(self.inner.get_community(community_id).await?)
  }

  async fn find_active_for_unit(
    &self,
    kind: CommunityKind,
    unit_id: Uuid,
  ) -> Result<Option<Community>, Self::Error> {
    if self.failing.contains(&unit_id) {
      return Err(FlakyError::Injected(unit_id));
    }
    Ok(self.inner.find_active_for_unit(kind, unit_id).await?)
  }

  async fn update_community(&self, community: Community) -> Result<bool, Self::Error> {
    Ok(self.inner.update_community(community).await?)
  }

  async fn deactivate_community(
    &self,
    community_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<usize>, Self::Error> {
    Ok(self.inner.deactivate_community(community_id, at).await?)
  }

  async fn insert_membership(
    &self,
    membership: Membership,
  ) -> Result<Inserted<Membership>, Self::Error> {
    Ok(self.inner.insert_membership(membership).await?)
  }

  async fn find_membership(
    &self,
    community_id: Uuid,
    principal: Principal,
  ) -> Result<Option<Membership>, Self::Error> {
    let pending = self.pending_deactivation.lock().unwrap().take();
    if let Some(target) = pending {
      self.inner.deactivate_community(target, Utc::now()).await?;
    }
    Ok(self.inner.find_membership(community_id, principal).await?)
  }

  async fn reactivate_membership(
    &self,
    membership_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<bool, Self::Error> {
    Ok(self.inner.reactivate_membership(membership_id, at).await?)
  }

  async fn depart_membership(
    &self,
    membership_id: Uuid,
    departure: Departure,
  ) -> Result<Departed, Self::Error> {
    Ok(self.inner.depart_membership(membership_id, departure).await?)
  }

  async fn list_active_memberships(
    &self,
    community_id: Uuid,
  ) -> Result<Vec<Membership>, Self::Error> {
    Ok(self.inner.list_active_memberships(community_id).await?)
  }

  async fn communities_for_principal(
    &self,
    principal: Principal,
  ) -> Result<Vec<UserCommunity>, Self::Error> {
    Ok(self.inner.communities_for_principal(principal).await?)
  }
}
