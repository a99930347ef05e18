//! SQL schema for the campus SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Mirror of the academic hierarchy, read-only from the engine's view.
CREATE TABLE IF NOT EXISTS academic_units (
    unit_id    TEXT PRIMARY KEY,
    kind       TEXT NOT NULL,     -- 'faculty' | 'course' | 'group'
    name       TEXT NOT NULL,
    parent_id  TEXT REFERENCES academic_units(unit_id),
    active     INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS communities (
    community_id   TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    kind           TEXT NOT NULL,  -- 'faculty' | 'course' | 'group' | 'department'
    bound_unit_id  TEXT,
    allow_posts    INTEGER NOT NULL DEFAULT 1,
    auto_join      INTEGER NOT NULL DEFAULT 1,
    active         INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT,
    CHECK ((kind = 'department') = (bound_unit_id IS NULL))
);

-- One active community per academic unit. Deactivated rows drop out of the
-- index so a unit can be provisioned again after its community is retired.
CREATE UNIQUE INDEX IF NOT EXISTS communities_active_unit_idx
    ON communities(kind, bound_unit_id)
    WHERE active = 1 AND bound_unit_id IS NOT NULL;

-- principal_id is not a foreign key: automation actors have no user row.
CREATE TABLE IF NOT EXISTS memberships (
    membership_id   TEXT PRIMARY KEY,
    community_id    TEXT NOT NULL REFERENCES communities(community_id),
    principal_kind  TEXT NOT NULL,  -- 'user' | 'automation'
    principal_id    TEXT NOT NULL,
    role            TEXT NOT NULL,  -- 'member' | 'moderator' | 'admin'
    active          INTEGER NOT NULL DEFAULT 1,
    joined_at       TEXT NOT NULL,
    left_at         TEXT,
    UNIQUE (community_id, principal_kind, principal_id)
);

CREATE INDEX IF NOT EXISTS memberships_principal_idx
    ON memberships(principal_kind, principal_id);

PRAGMA user_version = 1;
";
