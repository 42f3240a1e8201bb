use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Aggregate progress of one download batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncState {
    pub total_count: usize,
    pub total_bytes: u64,
    pub downloaded_count: usize,
    pub downloaded_bytes: u64,
    /// Bytes per second over the sliding window.
    pub speed: f64,
    /// Best effort, not monotonic.
    pub eta_seconds: f64,
}

/// Counters plus the sliding window, shared by every transfer in a batch.
/// All updates go through one lock.
#[derive(Debug)]
pub struct ProgressTracker {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: SyncState,
    window: VecDeque<(Instant, u64)>,
    window_len: Duration,
}

impl ProgressTracker {
    pub fn new(total_count: usize, total_bytes: u64, window_len: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SyncState {
                    total_count,
                    total_bytes,
                    ..SyncState::default()
                },
                window: VecDeque::new(),
                window_len,
            }),
        }
    }

    /// Account for `bytes` just received and return the updated snapshot.
    pub fn record(&self, bytes: u64) -> SyncState {
        self.record_at(bytes, Instant::now())
    }

    fn record_at(&self, bytes: u64, now: Instant) -> SyncState {
        let mut inner = self.lock();
        inner.state.downloaded_bytes += bytes;
        inner.window.push_back((now, bytes));
        inner.prune(now);
        inner.refresh(now);
        inner.state.clone()
    }

    /// Undo the bytes of a failed attempt.
    pub fn rollback(&self, bytes: u64) {
        let mut inner = self.lock();
        inner.state.downloaded_bytes = inner.state.downloaded_bytes.saturating_sub(bytes);
    }

    pub fn finish_file(&self) -> SyncState {
        let mut inner = self.lock();
        inner.state.downloaded_count += 1;
        inner.state.clone()
    }

    pub fn snapshot(&self) -> SyncState {
        self.lock().state.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain counters behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn prune(&mut self, now: Instant) {
        while let Some((at, _)) = self.window.front() {
            if now.duration_since(*at) > self.window_len {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn refresh(&mut self, now: Instant) {
        let bytes: u64 = self.window.iter().map(|(_, b)| b).sum();
        let span = self
            .window
            .front()
            .map(|(at, _)| now.duration_since(*at).as_secs_f64())
            .unwrap_or(0.0);

        self.state.speed = if span > 0.0 { bytes as f64 / span } else { 0.0 };
        let remaining = self
            .state
            .total_bytes
            .saturating_sub(self.state.downloaded_bytes);
        self.state.eta_seconds = if self.state.speed > 0.0 {
            remaining as f64 / self.state.speed
        } else {
            0.0
        };
    }
}
