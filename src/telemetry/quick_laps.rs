// Filter that keeps laps representative of racing pace

use log::debug;
use serde::{Deserialize, Serialize};

use super::LapRecord;

const DEFAULT_QUICK_LAP_THRESHOLD: f32 = 1.07;

/// Keeps laps whose time is within `threshold` times the fastest lap.
///
/// In/out laps and laps behind the safety car are well above the threshold
/// and get dropped, as do laps without a time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuickLapFilter {
    pub threshold: f32,
}

impl Default for QuickLapFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_QUICK_LAP_THRESHOLD,
        }
    }
}

impl QuickLapFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Fastest timed lap in the set, if any lap has a time
    pub fn fastest_time(laps: &[LapRecord]) -> Option<f32> {
        laps.iter()
            .map(|lap| lap.lap_time_s)
            .filter(|time| time.is_finite())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Apply the filter, keeping the input order
    pub fn apply(&self, laps: Vec<LapRecord>) -> Vec<LapRecord> {
        let Some(fastest) = Self::fastest_time(&laps) else {
            return Vec::new();
        };
        let limit = fastest * self.threshold;
        let total = laps.len();
        let quick: Vec<LapRecord> = laps
            .into_iter()
            .filter(|lap| lap.lap_time_s.is_finite() && lap.lap_time_s <= limit)
            .collect();
        debug!(
            "Quick lap filter kept {} of {} laps (limit {:.3}s)",
            quick.len(),
            total,
            limit
        );
        quick
    }
}
