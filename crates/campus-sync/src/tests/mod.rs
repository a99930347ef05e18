//! Engine tests against an in-memory [`SqliteStore`](campus_store_sqlite::SqliteStore).

mod support;

mod reconciler;
