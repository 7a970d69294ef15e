//! Request-scoped context passed into every service operation.
//!
//! # Responsibility
//! - Bundle the datastore handle with the caller's execution scope.
//! - Carry deadline/cancellation state down to each storage round trip.
//!
//! # Invariants
//! - Contexts hold no process-wide state; two contexts over different
//!   datastores never observe each other's records.
//! - Cancelling a scope is visible to every clone of it.

use crate::datastore::{Datastore, DatastoreError, DatastoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline and cancellation state for one logical request.
#[derive(Debug, Clone, Default)]
pub struct ExecutionScope {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl ExecutionScope {
    /// Unbounded, uncancelled scope.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Marks this scope (and all its clones) as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails when the scope was cancelled or its deadline has passed.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn check(&self) -> DatastoreResult<()> {
        if self.is_cancelled() {
            return Err(DatastoreError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(DatastoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Per-request handle: a borrowed datastore plus an execution scope.
#[derive(Clone)]
pub struct RequestContext<'a> {
    datastore: &'a dyn Datastore,
    scope: ExecutionScope,
}

impl<'a> RequestContext<'a> {
    pub fn new(datastore: &'a dyn Datastore) -> Self {
        Self::with_scope(datastore, ExecutionScope::new())
    }

    pub fn with_scope(datastore: &'a dyn Datastore, scope: ExecutionScope) -> Self {
        Self { datastore, scope }
    }

    pub fn datastore(&self) -> &'a dyn Datastore {
        self.datastore
    }

    pub fn scope(&self) -> &ExecutionScope {
        &self.scope
    }
}
