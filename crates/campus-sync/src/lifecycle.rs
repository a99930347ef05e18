//! Community updates and soft deletion.
//!
//! Deactivation never deletes rows: the community is flagged inactive and
//! every active membership is flagged with it, in one store call.

use campus_core::{
  Error, Result,
  academic::UnitKind,
  community::{Community, CommunityKind, CommunityPatch},
};
use chrono::Utc;
use uuid::Uuid;

use crate::Backend;

#[derive(Clone)]
pub struct Lifecycle<S> {
  store: S,
}

impl<S: Backend> Lifecycle<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub async fn get(&self, community_id: Uuid) -> Result<Community> {
    self
      .store
      .get_community(community_id)
      .await
      .map_err(Error::infrastructure)?
      .filter(|c| c.active)
      .ok_or_else(|| Error::NotFound(format!("community {community_id}")))
  }

  /// Apply `patch` to a department community. Academic communities take
  /// their name from the hierarchy and cannot be edited here.
  pub async fn update(&self, community_id: Uuid, patch: CommunityPatch) -> Result<Community> {
    let mut community = self.get(community_id).await?;
    if community.kind.is_academic() {
      return Err(Error::InvariantViolation(format!(
        "community {community_id} is bound to an academic unit; update the unit instead"
      )));
    }

    patch.apply_to(&mut community);
    community.updated_at = Some(Utc::now());

    if !self
      .store
      .update_community(community.clone())
      .await
      .map_err(Error::infrastructure)?
    {
      return Err(Error::NotFound(format!("community {community_id}")));
    }

    tracing::info!(%community_id, name = %community.name, "updated community");
    Ok(community)
  }

  /// Deactivate a department community and all of its memberships.
  pub async fn deactivate(&self, community_id: Uuid) -> Result<()> {
    let community = self.get(community_id).await?;
    if community.kind.is_academic() {
      return Err(Error::InvariantViolation(format!(
        "community {community_id} is bound to an academic unit; remove the unit instead"
      )));
    }
    self.cascade(&community).await
  }

  /// Deactivate the community of an academic unit that has been removed from
  /// the hierarchy.
  pub async fn retire_unit_community(&self, kind: UnitKind, unit_id: Uuid) -> Result<()> {
    let unit_active = self
      .store
      .get_unit(kind, unit_id)
      .await
      .map_err(Error::infrastructure)?
      .is_some_and(|unit| unit.active);
    if unit_active {
      return Err(Error::InvariantViolation(format!(
        "{kind} {unit_id} is still active in the academic hierarchy"
      )));
    }

    let community = self
      .store
      .find_active_for_unit(CommunityKind::from(kind), unit_id)
      .await
      .map_err(Error::infrastructure)?
      .ok_or_else(|| Error::NotFound(format!("community for {kind} {unit_id}")))?;

    self.cascade(&community).await
  }

  async fn cascade(&self, community: &Community) -> Result<()> {
    let community_id = community.community_id;
    let Some(members) = self
      .store
      .deactivate_community(community_id, Utc::now())
      .await
      .map_err(Error::infrastructure)?
    else {
      // Lost a race with another deactivation.
      return Err(Error::NotFound(format!("community {community_id}")));
    };

    tracing::info!(
      %community_id,
      kind = ?community.kind,
      members,
      "deactivated community"
    );
    Ok(())
  }
}
