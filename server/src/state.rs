use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::presenter::PresenterHandle;

/// Where the background loaders read from.
#[derive(Debug, Clone)]
pub struct Sources {
    pub data_path: PathBuf,
    pub tile_dir: PathBuf,
    pub tile_size: u32,
    /// Tile files read at once.
    pub tile_fetch_concurrency: usize,
    pub texture_seed: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub presenter: PresenterHandle,
    pub sources: Arc<Sources>,
    pub started_at: DateTime<Utc>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    frame_requests_total: AtomicU64,
    frames_rendered_total: AtomicU64,
    geometry_errors_total: AtomicU64,
    tiles_missing_last_frame: AtomicU64,
    tiles_loaded_total: AtomicU64,
    tile_load_failures_total: AtomicU64,
    pointer_events_total: AtomicU64,
    hit_tests_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservabilitySnapshot {
    pub frame_requests_total: u64,
    pub frames_rendered_total: u64,
    pub geometry_errors_total: u64,
    pub tiles_missing_last_frame: u64,
    pub tiles_loaded_total: u64,
    pub tile_load_failures_total: u64,
    pub pointer_events_total: u64,
    pub hit_tests_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            frame_requests_total: self.frame_requests_total.load(Ordering::Relaxed),
            frames_rendered_total: self.frames_rendered_total.load(Ordering::Relaxed),
            geometry_errors_total: self.geometry_errors_total.load(Ordering::Relaxed),
            tiles_missing_last_frame: self.tiles_missing_last_frame.load(Ordering::Relaxed),
            tiles_loaded_total: self.tiles_loaded_total.load(Ordering::Relaxed),
            tile_load_failures_total: self.tile_load_failures_total.load(Ordering::Relaxed),
            pointer_events_total: self.pointer_events_total.load(Ordering::Relaxed),
            hit_tests_total: self.hit_tests_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_frame_request(&self) {
        self.frame_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Account a freshly painted frame.
    pub fn record_frame_rendered(&self, geometry_errors: u64, tiles_missing: u64) {
        self.frames_rendered_total.fetch_add(1, Ordering::Relaxed);
        self.geometry_errors_total
            .fetch_add(geometry_errors, Ordering::Relaxed);
        self.tiles_missing_last_frame
            .store(tiles_missing, Ordering::Relaxed);
    }

    pub fn record_tiles_loaded(&self, count: u64) {
        self.tiles_loaded_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_tile_load_failures(&self, count: u64) {
        self.tile_load_failures_total
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_pointer_event(&self) {
        self.pointer_events_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit_test(&self) {
        self.hit_tests_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(presenter: PresenterHandle, sources: Sources) -> Self {
        Self {
            presenter,
            sources: Arc::new(sources),
            started_at: Utc::now(),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_accounting_sums_errors_and_keeps_last_missing_count() {
        let counters = ObservabilityCounters::default();
        counters.record_frame_rendered(2, 9);
        counters.record_frame_rendered(1, 4);
        counters.record_frame_request();
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.frames_rendered_total, 2);
        assert_eq!(snapshot.geometry_errors_total, 3);
        assert_eq!(snapshot.tiles_missing_last_frame, 4);
        assert_eq!(snapshot.frame_requests_total, 1);
    }
}
