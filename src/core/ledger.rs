//! Resource ledger.
//!
//! Records every runtime object this run created, in creation order, so a
//! rollback can remove them newest first. A handle is recorded only after
//! the creating call has returned success, and is popped before its
//! removal call is issued.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::core::domain::{ResourceHandle, ResourceKind};

#[derive(Debug, Default)]
struct Entries {
    handles: Vec<ResourceHandle>,
    next_order: usize,
}

/// Append-only record of created resources, drained back to front.
#[derive(Debug, Default)]
pub struct Ledger {
    inner: Mutex<Entries>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a resource that now exists.
    ///
    /// Recording the same kind and name twice keeps the first entry.
    pub fn record(&self, kind: ResourceKind, name: &str) -> ResourceHandle {
        let mut entries = self.lock();

        if let Some(existing) = entries
            .handles
            .iter()
            .find(|h| h.kind() == kind && h.name() == name)
        {
            warn!(%kind, name, "resource already recorded");
            return existing.clone();
        }

        let handle = ResourceHandle::new(kind, name, entries.next_order);
        entries.next_order += 1;
        entries.handles.push(handle.clone());

        debug!(%kind, name, order = handle.order(), "resource recorded");
        handle
    }

    /// Remove and return the most recently created resource.
    pub fn pop(&self) -> Option<ResourceHandle> {
        self.lock().handles.pop()
    }

    /// Current entries in creation order.
    pub fn snapshot(&self) -> Vec<ResourceHandle> {
        self.lock().handles.clone()
    }

    pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        self.lock()
            .handles
            .iter()
            .any(|h| h.kind() == kind && h.name() == name)
    }

    pub fn len(&self) -> usize {
        self.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().handles.is_empty()
    }
}
