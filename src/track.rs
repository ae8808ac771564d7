//! Creation/release accounting for device objects.
//!
//! Device objects release automatically on drop, so a leak cannot be observed
//! from the wgpu side. The ledger counts every wrapped object at creation and
//! again when its guard drops, which lets tests audit that release count
//! equals creation count for every object class on every exit path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Classes of device objects the ledger distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Image,
    Program,
    Kernel,
    /// Timestamp query set plus its resolve/staging buffers, one per dispatch.
    DispatchTimer,
    /// The owning context itself: queue and device. Marked in the release
    /// sequence at teardown, never counted as a tracked object.
    Context,
}

impl ResourceKind {
    fn name(self) -> &'static str {
        match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Image => "image",
            ResourceKind::Program => "program",
            ResourceKind::Kernel => "kernel",
            ResourceKind::DispatchTimer => "dispatch timer",
            ResourceKind::Context => "context",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    created: u64,
    released: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    counts: HashMap<ResourceKind, Counts>,
    /// Every release in the order it happened, so tests can check that
    /// dependent objects release before the context that owns them.
    sequence: Vec<ResourceKind>,
}

/// Shared creation/release counters, one per [`crate::device::DeviceContext`].
#[derive(Debug, Default, Clone)]
pub struct ResourceLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one creation and return the guard that records its release.
    pub(crate) fn track(&self, kind: ResourceKind) -> ResourceGuard {
        self.state.lock().counts.entry(kind).or_default().created += 1;
        ResourceGuard {
            ledger: self.clone(),
            kind,
        }
    }

    /// Append `kind` to the release sequence without touching the counters.
    pub(crate) fn mark(&self, kind: ResourceKind) {
        self.state.lock().sequence.push(kind);
    }

    /// Number of objects of `kind` created so far.
    pub fn created(&self, kind: ResourceKind) -> u64 {
        self.state.lock().counts.get(&kind).map_or(0, |c| c.created)
    }

    /// Number of objects of `kind` released so far.
    pub fn released(&self, kind: ResourceKind) -> u64 {
        self.state.lock().counts.get(&kind).map_or(0, |c| c.released)
    }

    /// Every recorded release, oldest first.
    pub fn release_sequence(&self) -> Vec<ResourceKind> {
        self.state.lock().sequence.clone()
    }

    /// Object classes with more creations than releases, with the difference.
    pub fn outstanding(&self) -> Vec<(ResourceKind, u64)> {
        self.state
            .lock()
            .counts
            .iter()
            .filter(|(_, c)| c.created > c.released)
            .map(|(&kind, c)| (kind, c.created - c.released))
            .collect()
    }

    /// True when every created object has been released.
    pub fn is_balanced(&self) -> bool {
        self.outstanding().is_empty()
    }

    /// Human-readable listing of outstanding objects, empty when balanced.
    pub fn report(&self) -> String {
        self.outstanding()
            .iter()
            .map(|(kind, n)| format!("{} x{}", kind.name(), n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        let mut state = self.ledger.state.lock();
        state.counts.entry(self.kind).or_default().released += 1;
        state.sequence.push(self.kind);
    }
}

/// Records one release on drop. Held by every tracked device object.
#[derive(Debug)]
pub(crate) struct ResourceGuard {
    ledger: ResourceLedger,
    kind: ResourceKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_counts_create_and_release() {
        let ledger = ResourceLedger::new();
        let guard = ledger.track(ResourceKind::Buffer);
        assert_eq!(ledger.created(ResourceKind::Buffer), 1);
        assert_eq!(ledger.released(ResourceKind::Buffer), 0);
        assert!(!ledger.is_balanced());

        drop(guard);
        assert_eq!(ledger.released(ResourceKind::Buffer), 1);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_outstanding_report() {
        let ledger = ResourceLedger::new();
        let _a = ledger.track(ResourceKind::Buffer);
        let _b = ledger.track(ResourceKind::Buffer);
        let _k = ledger.track(ResourceKind::Kernel);

        let mut outstanding = ledger.outstanding();
        outstanding.sort_by_key(|(_, n)| *n);
        assert_eq!(outstanding.len(), 2);
        assert!(outstanding.contains(&(ResourceKind::Buffer, 2)));
        assert!(outstanding.contains(&(ResourceKind::Kernel, 1)));
        assert!(ledger.report().contains("buffer x2"));
    }

    #[test]
    fn test_release_sequence_is_ordered() {
        let ledger = ResourceLedger::new();
        let kernel = ledger.track(ResourceKind::Kernel);
        let program = ledger.track(ResourceKind::Program);
        drop(kernel);
        drop(program);
        ledger.mark(ResourceKind::Context);

        assert_eq!(
            ledger.release_sequence(),
            vec![
                ResourceKind::Kernel,
                ResourceKind::Program,
                ResourceKind::Context,
            ]
        );
        // The mark is sequence-only; it never unbalances the counters.
        assert_eq!(ledger.created(ResourceKind::Context), 0);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_guards_release_in_any_order() {
        let ledger = ResourceLedger::new();
        let a = ledger.track(ResourceKind::Image);
        let b = ledger.track(ResourceKind::DispatchTimer);
        drop(b);
        drop(a);
        assert!(ledger.is_balanced());
    }
}
