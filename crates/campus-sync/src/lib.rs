//! The academic-hierarchy-to-community synchronisation engine.
//!
//! Four components share one backend:
//!
//! - [`Provisioner`]: idempotent get-or-create of the community bound to an
//!   academic unit, plus manual department creation;
//! - [`Ledger`]: join/leave and the last-admin invariant;
//! - [`Lifecycle`]: soft deletion with cascading membership deactivation;
//! - [`Reconciler`]: best-effort, per-level sync after a profile change.
//!
//! No component takes an in-process lock. Correctness under concurrency
//! rests on the backend's uniqueness constraints; see
//! [`campus_core::store::CommunityStore`].

pub mod ledger;
pub mod lifecycle;
pub mod provisioner;
pub mod reconciler;

pub use ledger::Ledger;
pub use lifecycle::Lifecycle;
pub use provisioner::Provisioner;
pub use reconciler::{LevelOutcome, ReconciliationReport, Reconciler, SkipReason};

use campus_core::store::{AcademicDirectory, CommunityStore, IdentityDirectory};

/// Everything the engine needs from its collaborators, in one bound.
pub trait Backend:
  AcademicDirectory + IdentityDirectory + CommunityStore + Clone + Send + Sync + 'static
{
}

impl<T> Backend for T where
  T: AcademicDirectory + IdentityDirectory + CommunityStore + Clone + Send + Sync + 'static
{
}

/// All four components wired to the same backend.
#[derive(Clone)]
pub struct CommunityEngine<S> {
  pub provisioner: Provisioner<S>,
  pub ledger:      Ledger<S>,
  pub lifecycle:   Lifecycle<S>,
  pub reconciler:  Reconciler<S>,
}

impl<S: Backend> CommunityEngine<S> {
  pub fn new(store: S) -> Self {
    let provisioner = Provisioner::new(store.clone());
    let ledger = Ledger::new(store.clone());
    Self {
      lifecycle: Lifecycle::new(store.clone()),
      reconciler: Reconciler::new(store, provisioner.clone(), ledger.clone()),
      provisioner,
      ledger,
    }
  }
}

#[cfg(test)]
mod tests;
