//! Per-transport frame counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between a transport and its workers.
#[derive(Debug, Default)]
pub(crate) struct TransportStats {
    sent: AtomicU64,
    received: AtomicU64,
    dropped: AtomicU64,
    relayed: AtomicU64,
    overflows: AtomicU64,
}

impl TransportStats {
    #[inline]
    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_relayed(&self) {
        self.relayed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_overflow(&self) {
        self.overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            relayed: self.relayed.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a transport's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames queued by local sends.
    pub sent: u64,
    /// Frames decoded into messages.
    pub received: u64,
    /// Frames discarded for framing, checksum or structure faults.
    pub dropped: u64,
    /// Frames forwarded from downstream to upstream.
    pub relayed: u64,
    /// Times a receive or relay buffer filled without a delimiter.
    pub overflows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = TransportStats::default();
        stats.record_sent();
        stats.record_sent();
        stats.record_dropped();
        stats.record_overflow();

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                sent: 2,
                dropped: 1,
                overflows: 1,
                ..StatsSnapshot::default()
            }
        );
    }
}
