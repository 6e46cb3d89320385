// Data acquisition interface and an in-memory implementation

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use super::{LapRecord, QuickLapFilter, SessionKey, TelemetrySample};
use crate::errors::TrackpaintError;

/// Supplies lap and telemetry data for a session.
///
/// Implementations report missing sessions with `DataUnavailable` and missing
/// drivers with `UnknownDriver`; callers pass those errors through unchanged.
pub trait SessionDataSource {
    /// Drivers that set at least one lap, in order of first appearance
    fn drivers(&self, key: &SessionKey) -> Result<Vec<String>, TrackpaintError>;

    /// Laps of one driver ordered by lap number
    fn laps(
        &self,
        key: &SessionKey,
        driver: &str,
        quick_laps_only: bool,
    ) -> Result<Vec<LapRecord>, TrackpaintError>;

    /// Telemetry of the driver's fastest timed lap
    fn fastest_lap_telemetry(
        &self,
        key: &SessionKey,
        driver: &str,
    ) -> Result<Vec<TelemetrySample>, TrackpaintError>;
}

/// Lap row tagged with the driver that drove it
#[derive(Clone, Debug, PartialEq)]
pub struct DriverLap {
    pub driver: String,
    pub lap: LapRecord,
}

/// Everything known about one session
#[derive(Clone, Debug, Default)]
pub struct SessionData {
    pub laps: Vec<DriverLap>,
    /// Samples keyed by (driver, lap number)
    pub telemetry: HashMap<(String, u32), Vec<TelemetrySample>>,
    pub quick_lap_filter: QuickLapFilter,
}

impl SessionData {
    pub fn add_lap(&mut self, driver: impl Into<String>, lap: LapRecord) {
        self.laps.push(DriverLap {
            driver: driver.into(),
            lap,
        });
    }

    pub fn add_telemetry(
        &mut self,
        driver: impl Into<String>,
        lap_number: u32,
        samples: Vec<TelemetrySample>,
    ) {
        self.telemetry
            .entry((driver.into(), lap_number))
            .or_default()
            .extend(samples);
    }

    pub fn drivers(&self) -> Vec<String> {
        self.laps
            .iter()
            .map(|l| l.driver.clone())
            .unique()
            .collect()
    }

    pub fn driver_laps(
        &self,
        driver: &str,
        quick_laps_only: bool,
    ) -> Result<Vec<LapRecord>, TrackpaintError> {
        let laps: Vec<LapRecord> = self
            .laps
            .iter()
            .filter(|l| l.driver == driver)
            .map(|l| l.lap.clone())
            .sorted_by_key(|lap| lap.lap_number)
            .collect();

        if laps.is_empty() {
            return Err(TrackpaintError::UnknownDriver {
                driver: driver.to_string(),
            });
        }

        if quick_laps_only {
            Ok(self.quick_lap_filter.apply(laps))
        } else {
            Ok(laps)
        }
    }

    pub fn fastest_lap_telemetry(
        &self,
        driver: &str,
    ) -> Result<Vec<TelemetrySample>, TrackpaintError> {
        let laps = self.driver_laps(driver, false)?;
        let fastest = laps
            .iter()
            .filter(|lap| lap.lap_time_s.is_finite())
            .min_by(|a, b| a.lap_time_s.total_cmp(&b.lap_time_s))
            .ok_or_else(|| TrackpaintError::DataUnavailable {
                reason: format!("{driver} has no timed lap"),
            })?;

        debug!(
            "Fastest lap for {}: lap {} in {:.3}s",
            driver, fastest.lap_number, fastest.lap_time_s
        );

        self.telemetry
            .get(&(driver.to_string(), fastest.lap_number))
            .cloned()
            .ok_or_else(|| TrackpaintError::DataUnavailable {
                reason: format!("no telemetry for {driver} lap {}", fastest.lap_number),
            })
    }
}

/// Source backed by sessions held in memory, mostly used as a fixture
#[derive(Debug, Default)]
pub struct InMemorySource {
    sessions: HashMap<SessionKey, SessionData>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SessionKey, data: SessionData) {
        self.sessions.insert(key, data);
    }

    fn session(&self, key: &SessionKey) -> Result<&SessionData, TrackpaintError> {
        self.sessions
            .get(key)
            .ok_or_else(|| TrackpaintError::DataUnavailable {
                reason: format!("session {key} not loaded"),
            })
    }
}

impl SessionDataSource for InMemorySource {
    fn drivers(&self, key: &SessionKey) -> Result<Vec<String>, TrackpaintError> {
        Ok(self.session(key)?.drivers())
    }

    fn laps(
        &self,
        key: &SessionKey,
        driver: &str,
        quick_laps_only: bool,
    ) -> Result<Vec<LapRecord>, TrackpaintError> {
        self.session(key)?.driver_laps(driver, quick_laps_only)
    }

    fn fastest_lap_telemetry(
        &self,
        key: &SessionKey,
        driver: &str,
    ) -> Result<Vec<TelemetrySample>, TrackpaintError> {
        self.session(key)?.fastest_lap_telemetry(driver)
    }
}
