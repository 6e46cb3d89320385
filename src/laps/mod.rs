// Grouping of lap records into per-compound series

pub mod compounds;

use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, info};
use rgb::RGBA8;
use serde::{Deserialize, Serialize};

pub use compounds::CompoundColors;

use crate::errors::TrackpaintError;
use crate::telemetry::LapRecord;

/// Laps of a single category ordered by lap number
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub category: String,
    pub color: RGBA8,
    pub laps: Vec<LapRecord>,
}

impl CategorySeries {
    /// (lap number, lap time) pairs for plotting
    pub fn points(&self) -> Vec<(u32, f32)> {
        self.laps
            .iter()
            .map(|lap| (lap.lap_number, lap.lap_time_s))
            .collect()
    }
}

/// A titled set of series ready for a scatter plot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LapTimeChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<CategorySeries>,
}

impl LapTimeChart {
    pub fn new(title: impl Into<String>, series: Vec<CategorySeries>) -> Self {
        Self {
            title: title.into(),
            x_label: "Lap Number".to_string(),
            y_label: "Lap Time".to_string(),
            series,
        }
    }

    pub fn lap_count(&self) -> usize {
        self.series.iter().map(|s| s.laps.len()).sum()
    }
}

pub struct CompoundSeriesAggregator;

impl CompoundSeriesAggregator {
    /// Group laps by category.
    ///
    /// Series come out in order of each category's first appearance, every lap
    /// lands in exactly one series and empty categories are left out. Quick lap
    /// filtering belongs to the data source: with `quick_laps_only` the laps
    /// are taken as already filtered and grouped as they are.
    pub fn aggregate(
        laps: &[LapRecord],
        color_policy: &CompoundColors,
        quick_laps_only: bool,
    ) -> Result<Vec<CategorySeries>, TrackpaintError> {
        info!(
            "Aggregating {} laps by compound (quick laps only: {})",
            laps.len(),
            quick_laps_only
        );

        let mut seen = HashSet::new();
        for lap in laps {
            if !color_policy.contains(&lap.category) {
                return Err(TrackpaintError::UnknownCategory {
                    category: lap.category.clone(),
                });
            }
            if !seen.insert(lap.lap_number) {
                return Err(TrackpaintError::DuplicateLap {
                    lap_number: lap.lap_number,
                });
            }
        }

        let series: Vec<CategorySeries> = laps
            .iter()
            .map(|lap| lap.category.as_str())
            .unique()
            .filter_map(|category| {
                let color = color_policy.get(category)?;
                let laps = laps
                    .iter()
                    .filter(|lap| lap.category == category)
                    .cloned()
                    .sorted_by_key(|lap| lap.lap_number)
                    .collect();
                Some(CategorySeries {
                    category: category.to_string(),
                    color,
                    laps,
                })
            })
            .collect();

        debug!(
            "Built {} series: {}",
            series.len(),
            series.iter().map(|s| s.category.as_str()).join(", ")
        );
        Ok(series)
    }
}
