//! Join/leave bookkeeping and the last-admin invariant.

use campus_core::{
  Error, Result,
  community::Community,
  membership::{Departed, Departure, MemberEntry, Membership, Principal, Role, UserCommunity},
  store::Inserted,
};
use chrono::Utc;
use uuid::Uuid;

use crate::Backend;

#[derive(Clone)]
pub struct Ledger<S> {
  store: S,
}

impl<S: Backend> Ledger<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// Add `user_id` to a community as a plain member.
  ///
  /// A previously retained (inactive) row is reactivated rather than
  /// duplicated. Joining while already active is a [`Error::Conflict`]. The
  /// store re-checks the community on write, so a deactivation that lands
  /// after the initial check still yields [`Error::NotFound`].
  pub async fn join(&self, community_id: Uuid, user_id: Uuid) -> Result<Membership> {
    self.active_community(community_id).await?;
    self.require_user(user_id).await?;

    let principal = Principal::User(user_id);
    let now = Utc::now();

    match self
      .store
      .find_membership(community_id, principal)
      .await
      .map_err(Error::infrastructure)?
    {
      Some(existing) if existing.active => {
        Err(Error::Conflict(format!("{principal} is already a member")))
      }
      Some(mut existing) => {
        let reactivated = self
          .store
          .reactivate_membership(existing.membership_id, now)
          .await
          .map_err(Error::infrastructure)?;
        if !reactivated {
          // Either the community was deactivated or someone else reactivated
          // the row between our read and write.
          self.active_community(community_id).await?;
          return Err(Error::Conflict(format!("{principal} is already a member")));
        }

        existing.active = true;
        existing.joined_at = now;
        existing.left_at = None;
        tracing::info!(
          %community_id,
          %user_id,
          membership_id = %existing.membership_id,
          "member rejoined"
        );
        Ok(existing)
      }
      None => {
        let membership = Membership::new(community_id, principal, Role::Member, now);
        match self
          .store
          .insert_membership(membership)
          .await
          .map_err(Error::infrastructure)?
        {
          Inserted::Created(created) => {
            tracing::info!(
              %community_id,
              %user_id,
              membership_id = %created.membership_id,
              "member joined"
            );
            Ok(created)
          }
          Inserted::Duplicate => {
            Err(Error::Conflict(format!("{principal} is already a member")))
          }
          Inserted::Gone => Err(Error::NotFound(format!("community {community_id}"))),
        }
      }
    }
  }

  /// Remove `user_id` from a community.
  ///
  /// Auto-join academic communities keep the row as inactive history; every
  /// other community deletes it. The sole remaining admin cannot leave.
  pub async fn leave(&self, community_id: Uuid, user_id: Uuid) -> Result<()> {
    let principal = Principal::User(user_id);
    let membership = self
      .store
      .find_membership(community_id, principal)
      .await
      .map_err(Error::infrastructure)?
      .filter(|m| m.active)
      .ok_or_else(|| Error::Conflict(format!("{principal} is not a member")))?;

    let community = self
      .store
      .get_community(community_id)
      .await
      .map_err(Error::infrastructure)?
      .ok_or_else(|| Error::NotFound(format!("community {community_id}")))?;

    let departure = if community.retains_departed_members() {
      Departure::Deactivate { at: Utc::now() }
    } else {
      Departure::Delete
    };

    match self
      .store
      .depart_membership(membership.membership_id, departure)
      .await
      .map_err(Error::infrastructure)?
    {
      Departed::Left => {
        tracing::info!(
          %community_id,
          %user_id,
          retained = matches!(departure, Departure::Deactivate { .. }),
          "member left"
        );
        Ok(())
      }
      Departed::LastAdmin => Err(Error::InvariantViolation(format!(
        "{principal} is the sole admin of community {community_id}"
      ))),
      Departed::NotActive => Err(Error::Conflict(format!("{principal} is not a member"))),
    }
  }

  /// Active members with display names, admins first, then moderators, then
  /// members; ties broken by name.
  pub async fn list_members(&self, community_id: Uuid) -> Result<Vec<MemberEntry>> {
    self.active_community(community_id).await?;

    let memberships = self
      .store
      .list_active_memberships(community_id)
      .await
      .map_err(Error::infrastructure)?;

    let actor = self.store.automation_actor();
    let mut entries = Vec::with_capacity(memberships.len());
    for membership in memberships {
      let display_name = match membership.principal {
        Principal::Automation(id) if id == actor.actor_id => actor.display_name.clone(),
        Principal::Automation(_) => String::new(),
        Principal::User(id) => self
          .store
          .display_name(id)
          .await
          .map_err(Error::infrastructure)?
          .unwrap_or_default(),
      };
      entries.push(MemberEntry { membership, display_name });
    }

    entries.sort_by(|a, b| {
      b.membership
        .role
        .cmp(&a.membership.role)
        .then_with(|| a.display_name.cmp(&b.display_name))
    });
    Ok(entries)
  }

  /// Active communities the user belongs to, grouped by kind and sorted by
  /// name within each kind.
  pub async fn communities_for_user(&self, user_id: Uuid) -> Result<Vec<UserCommunity>> {
    self.require_user(user_id).await?;

    let mut communities = self
      .store
      .communities_for_principal(Principal::User(user_id))
      .await
      .map_err(Error::infrastructure)?;
    communities.sort_by(|a, b| {
      a.community
        .kind
        .cmp(&b.community.kind)
        .then_with(|| a.community.name.cmp(&b.community.name))
    });
    Ok(communities)
  }

  async fn active_community(&self, community_id: Uuid) -> Result<Community> {
    self
      .store
      .get_community(community_id)
      .await
      .map_err(Error::infrastructure)?
      .filter(|c| c.active)
      .ok_or_else(|| Error::NotFound(format!("community {community_id}")))
  }

  async fn require_user(&self, user_id: Uuid) -> Result<()> {
    if self
      .store
      .user_exists(user_id)
      .await
      .map_err(Error::infrastructure)?
    {
      Ok(())
    } else {
      Err(Error::NotFound(format!("user {user_id}")))
    }
  }
}
