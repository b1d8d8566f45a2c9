//! Live tailer accounting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts tailers that currently hold an open file handle.
///
/// Each registered tailer keeps a [`TailerGuard`]; the count drops when the
/// tailer (and with it the file handle) is dropped.
#[derive(Debug, Clone, Default)]
pub struct TailerGauge {
    live: Arc<AtomicUsize>,
}

impl TailerGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open tailers.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn track(&self) -> TailerGuard {
        self.live.fetch_add(1, Ordering::AcqRel);
        TailerGuard {
            live: Arc::clone(&self.live),
        }
    }
}

#[derive(Debug)]
pub(crate) struct TailerGuard {
    live: Arc<AtomicUsize>,
}

impl Drop for TailerGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_lifetime() {
        let gauge = TailerGauge::new();
        let first = gauge.track();
        let second = gauge.track();
        assert_eq!(gauge.live(), 2);
        drop(first);
        assert_eq!(gauge.live(), 1);
        drop(second);
        assert_eq!(gauge.live(), 0);
    }
}
