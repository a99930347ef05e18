//! [`SqliteStore`]: the SQLite implementation of the collaborator traits.

use std::{path::Path, sync::Arc};

use campus_core::{
  academic::{AcademicUnit, UnitKind},
  community::{Community, CommunityKind},
  membership::{
    AutomationActor, Departed, Departure, Membership, Principal, Role,
    UserCommunity,
  },
  store::{AcademicDirectory, CommunityStore, IdentityDirectory, Inserted},
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{
    COMMUNITY_COLUMNS, MEMBERSHIP_COLUMNS, RawCommunity, RawMembership, RawUnit,
    UNIT_COLUMNS, decode_role, encode_community_kind, encode_dt, encode_principal,
    encode_role, encode_unit_kind, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Whether `err` is a UNIQUE (not primary-key or foreign-key) violation.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A campus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  actor: Arc<AutomationActor>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, actor: Arc::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, actor: Arc::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the automation actor reported by [`IdentityDirectory`].
  pub fn with_automation_actor(mut self, actor: AutomationActor) -> Self {
    self.actor = Arc::new(actor);
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Seeding ───────────────────────────────────────────────────────────
  //
  // The academic hierarchy and the account system are owned elsewhere; these
  // helpers exist so a standalone deployment and the tests can populate the
  // mirrored tables.

  /// Insert an active academic unit. Courses and groups must name an
  /// existing parent of the right kind.
  pub async fn add_unit(
    &self,
    kind: UnitKind,
    name: impl Into<String>,
    parent_id: Option<Uuid>,
  ) -> Result<AcademicUnit> {
    let parent_id = match kind.parent() {
      None => None,
      Some(parent_kind) => {
        let id = parent_id.ok_or(Error::MissingParent(kind))?;
        self
          .get_unit(parent_kind, id)
          .await?
          .ok_or(Error::UnitNotFound(id))?;
        Some(id)
      }
    };

    let unit = AcademicUnit {
      unit_id: Uuid::new_v4(),
      kind,
      name: name.into(),
      parent_id,
      active: true,
    };

    let id_str     = encode_uuid(unit.unit_id);
    let kind_str   = encode_unit_kind(kind).to_owned();
    let name_str   = unit.name.clone();
    let parent_str = parent_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO academic_units (unit_id, kind, name, parent_id, active)
           VALUES (?1, ?2, ?3, ?4, 1)",
          rusqlite::params![id_str, kind_str, name_str, parent_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(unit)
  }

  /// Flip a unit's active flag. Returns `false` if the unit does not exist.
  pub async fn set_unit_active(&self, unit_id: Uuid, active: bool) -> Result<bool> {
    let id_str = encode_uuid(unit_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE academic_units SET active = ?2 WHERE unit_id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  /// Insert a user account and return its id.
  pub async fn add_user(
    &self,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
  ) -> Result<Uuid> {
    let user_id = Uuid::new_v4();
    let id_str  = encode_uuid(user_id);
    let first   = first_name.into();
    let last    = last_name.into();
    let at_str  = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, first_name, last_name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, first, last, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user_id)
  }
}

// ─── AcademicDirectory impl ──────────────────────────────────────────────────

impl AcademicDirectory for SqliteStore {
  type Error = Error;

  async fn get_unit(&self, kind: UnitKind, unit_id: Uuid) -> Result<Option<AcademicUnit>> {
    let id_str   = encode_uuid(unit_id);
    let kind_str = encode_unit_kind(kind).to_owned();

    let raw: Option<RawUnit> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {UNIT_COLUMNS} FROM academic_units WHERE unit_id = ?1 AND kind = ?2"
            ),
            rusqlite::params![id_str, kind_str],
            RawUnit::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUnit::into_unit).transpose()
  }
}

// ─── IdentityDirectory impl ──────────────────────────────────────────────────

impl IdentityDirectory for SqliteStore {
  type Error = Error;

  async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
    Ok(self.display_name(user_id).await?.is_some())
  }

  async fn display_name(&self, user_id: Uuid) -> Result<Option<String>> {
    let id_str = encode_uuid(user_id);

    let name = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT first_name, last_name FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              let first: String = row.get(0)?;
              let last: String = row.get(1)?;
              Ok(format!("{first} {last}"))
            },
          )
          .optional()?)
      })
      .await?;

    Ok(name)
  }

  fn automation_actor(&self) -> &AutomationActor { &self.actor }
}

// ─── CommunityStore impl ─────────────────────────────────────────────────────

impl CommunityStore for SqliteStore {
  type Error = Error;

  // ── Communities ───────────────────────────────────────────────────────────

  async fn insert_community(
    &self,
    community: Community,
    founder: Membership,
  ) -> Result<Inserted<Community>> {
    let c_id_str    = encode_uuid(community.community_id);
    let name        = community.name.clone();
    let description = community.description.clone();
    let kind_str    = encode_community_kind(community.kind).to_owned();
    let unit_str    = community.bound_unit_id.map(encode_uuid);
    let allow_posts = community.allow_posts;
    let auto_join   = community.auto_join;
    let active      = community.active;
    let created_str = encode_dt(community.created_at);
    let updated_str = community.updated_at.map(encode_dt);

    let m_id_str           = encode_uuid(founder.membership_id);
    let (p_kind, p_id_str) = encode_principal(founder.principal);
    let role_str           = encode_role(founder.role).to_owned();
    let joined_str         = encode_dt(founder.joined_at);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let inserted = tx.execute(
          "INSERT INTO communities (
             community_id, name, description, kind, bound_unit_id,
             allow_posts, auto_join, active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            c_id_str,
            name,
            description,
            kind_str,
            unit_str,
            allow_posts,
            auto_join,
            active,
            created_str,
            updated_str,
          ],
        );
        match inserted {
          Ok(_) => {}
          // Dropping the transaction rolls back.
          Err(e) if is_unique_violation(&e) => return Ok(false),
          Err(e) => return Err(e.into()),
        }

        tx.execute(
          "INSERT INTO memberships (
             membership_id, community_id, principal_kind, principal_id,
             role, active, joined_at, left_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, NULL)",
          rusqlite::params![m_id_str, c_id_str, p_kind, p_id_str, role_str, joined_str],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if created {
      Ok(Inserted::Created(community))
    } else {
      tracing::debug!(
        kind = ?community.kind,
        unit_id = ?community.bound_unit_id,
        "community insert hit the active-unit uniqueness constraint"
      );
      Ok(Inserted::Duplicate)
    }
  }

  async fn get_community(&self, community_id: Uuid) -> Result<Option<Community>> {
    let id_str = encode_uuid(community_id);

    let raw: Option<RawCommunity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.community_id = ?1"),
            rusqlite::params![id_str],
            RawCommunity::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCommunity::into_community).transpose()
  }

  async fn find_active_for_unit(
    &self,
    kind: CommunityKind,
    unit_id: Uuid,
  ) -> Result<Option<Community>> {
    let kind_str = encode_community_kind(kind).to_owned();
    let unit_str = encode_uuid(unit_id);

    let raw: Option<RawCommunity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {COMMUNITY_COLUMNS} FROM communities c
               WHERE c.kind = ?1 AND c.bound_unit_id = ?2 AND c.active = 1"
            ),
            rusqlite::params![kind_str, unit_str],
            RawCommunity::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCommunity::into_community).transpose()
  }

  async fn update_community(&self, community: Community) -> Result<bool> {
    let id_str      = encode_uuid(community.community_id);
    let updated_str = community.updated_at.map(encode_dt);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE communities
           SET name = ?2, description = ?3, allow_posts = ?4, auto_join = ?5,
               updated_at = ?6
           WHERE community_id = ?1 AND active = 1",
          rusqlite::params![
            id_str,
            community.name,
            community.description,
            community.allow_posts,
            community.auto_join,
            updated_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn deactivate_community(
    &self,
    community_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<usize>> {
    let id_str = encode_uuid(community_id);
    let at_str = encode_dt(at);

    let cascaded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let changed = tx.execute(
          "UPDATE communities SET active = 0, updated_at = ?2
           WHERE community_id = ?1 AND active = 1",
          rusqlite::params![id_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let members = tx.execute(
          "UPDATE memberships SET active = 0, left_at = ?2
           WHERE community_id = ?1 AND active = 1",
          rusqlite::params![id_str, at_str],
        )?;

        tx.commit()?;
        Ok(Some(members))
      })
      .await?;

    Ok(cascaded)
  }

  // ── Memberships ───────────────────────────────────────────────────────────

  async fn insert_membership(&self, membership: Membership) -> Result<Inserted<Membership>> {
    let m_id_str           = encode_uuid(membership.membership_id);
    let c_id_str           = encode_uuid(membership.community_id);
    let (p_kind, p_id_str) = encode_principal(membership.principal);
    let role_str           = encode_role(membership.role).to_owned();
    let active             = membership.active;
    let joined_str         = encode_dt(membership.joined_at);
    let left_str           = membership.left_at.map(encode_dt);

    // The community check and the insert are one statement, so a concurrent
    // deactivation either lands first (nothing inserted) or cascades over the
    // new row.
    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO memberships (
             membership_id, community_id, principal_kind, principal_id,
             role, active, joined_at, left_at
           )
           SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
           WHERE EXISTS (
             SELECT 1 FROM communities WHERE community_id = ?2 AND active = 1
           )",
          rusqlite::params![
            m_id_str, c_id_str, p_kind, p_id_str, role_str, active, joined_str, left_str,
          ],
        );
        match inserted {
          Ok(0) => Ok(Inserted::Gone),
          Ok(_) => Ok(Inserted::Created(())),
          Err(e) if is_unique_violation(&e) => Ok(Inserted::Duplicate),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(match outcome {
      Inserted::Created(()) => Inserted::Created(membership),
      Inserted::Duplicate => Inserted::Duplicate,
      Inserted::Gone => {
        tracing::debug!(
          community_id = %membership.community_id,
          principal = %membership.principal,
          "membership insert skipped: community not active"
        );
        Inserted::Gone
      }
    })
  }

  async fn find_membership(
    &self,
    community_id: Uuid,
    principal: Principal,
  ) -> Result<Option<Membership>> {
    let c_id_str           = encode_uuid(community_id);
    let (p_kind, p_id_str) = encode_principal(principal);

    let raw: Option<RawMembership> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m
               WHERE m.community_id = ?1 AND m.principal_kind = ?2 AND m.principal_id = ?3"
            ),
            rusqlite::params![c_id_str, p_kind, p_id_str],
            RawMembership::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMembership::into_membership).transpose()
  }

  async fn reactivate_membership(&self, membership_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(membership_id);
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE memberships SET active = 1, left_at = NULL, joined_at = ?2
           WHERE membership_id = ?1 AND active = 0
             AND EXISTS (
               SELECT 1 FROM communities c
               WHERE c.community_id = memberships.community_id AND c.active = 1
             )",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn depart_membership(&self, membership_id: Uuid, departure: Departure) -> Result<Departed> {
    let id_str    = encode_uuid(membership_id);
    let admin_str = encode_role(Role::Admin).to_owned();
    let left_str  = match departure {
      Departure::Deactivate { at } => Some(encode_dt(at)),
      Departure::Delete => None,
    };

    let departed = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the admin count and the
        // write below cannot interleave with another departure.
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let row: Option<(String, String)> = tx
          .query_row(
            "SELECT community_id, role FROM memberships
             WHERE membership_id = ?1 AND active = 1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((community_id, role_str)) = row else {
          return Ok(Departed::NotActive);
        };

        if role_str == admin_str {
          let admins: i64 = tx.query_row(
            "SELECT COUNT(*) FROM memberships
             WHERE community_id = ?1 AND role = ?2 AND active = 1",
            rusqlite::params![community_id, admin_str],
            |r| r.get(0),
          )?;
          if admins <= 1 {
            return Ok(Departed::LastAdmin);
          }
        }

        match left_str {
          Some(left_str) => tx.execute(
            "UPDATE memberships SET active = 0, left_at = ?2 WHERE membership_id = ?1",
            rusqlite::params![id_str, left_str],
          )?,
          None => tx.execute(
            "DELETE FROM memberships WHERE membership_id = ?1",
            rusqlite::params![id_str],
          )?,
        };

        tx.commit()?;
        Ok(Departed::Left)
      })
      .await?;

    Ok(departed)
  }

  async fn list_active_memberships(&self, community_id: Uuid) -> Result<Vec<Membership>> {
    let id_str = encode_uuid(community_id);

    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m
           WHERE m.community_id = ?1 AND m.active = 1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawMembership::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn communities_for_principal(&self, principal: Principal) -> Result<Vec<UserCommunity>> {
    let (p_kind, p_id_str) = encode_principal(principal);

    let raws: Vec<(RawCommunity, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMUNITY_COLUMNS}, m.role
           FROM memberships m
           JOIN communities c ON c.community_id = m.community_id
           WHERE m.principal_kind = ?1 AND m.principal_id = ?2
             AND m.active = 1 AND c.active = 1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![p_kind, p_id_str], |row| {
            Ok((RawCommunity::from_row(row)?, row.get(10)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, role)| {
        Ok(UserCommunity {
          community: raw.into_community()?,
          role:      decode_role(&role)?,
        })
      })
      .collect()
  }
}
