//! Core types and trait definitions for the campus community engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! engine (`campus-sync`) and every backend depend on it; it performs no I/O.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod academic;
pub mod community;
pub mod error;
pub mod membership;
pub mod store;

pub use error::{Error, ErrorKind, Result};
