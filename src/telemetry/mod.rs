// Telemetry and lap data model shared by the path and lap series pipelines

pub mod loader;
pub mod quick_laps;
pub mod source;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use loader::JsonlSessionSource;
pub use quick_laps::QuickLapFilter;
pub use source::{InMemorySource, SessionData, SessionDataSource};

/// Identifies one session of one event, e.g. the 2024 Suzuka race
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub season: u16,
    pub event: String,
    /// Session identifier such as "R", "Q" or "FP1"
    pub session: String,
}

impl SessionKey {
    pub fn new(season: u16, event: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            season,
            event: event.into(),
            session: session.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.season, self.event, self.session)
    }
}

/// One telemetry measurement taken during a lap.
///
/// Missing values are `None`; they are never dropped from a lap, so that the
/// index of a sample keeps matching the index of the segment it leads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Strictly increasing within one lap
    pub sequence_index: u64,
    /// Track position, meters
    pub position_x: Option<f32>,
    /// Track position, meters
    pub position_y: Option<f32>,
    /// Car speed in km/h
    pub speed_kph: Option<f32>,
    /// Engaged gear, 0 for neutral
    pub gear: Option<u32>,
    pub engine_rpm: Option<f32>,
    /// 0=off throttle to 1=full throttle
    pub throttle: Option<f32>,
    /// 0=brake released to 1=max pedal force
    pub brake: Option<f32>,
}

impl TelemetrySample {
    /// Position as a point, with missing coordinates as NaN
    pub fn position(&self) -> (f32, f32) {
        (
            self.position_x.unwrap_or(f32::NAN),
            self.position_y.unwrap_or(f32::NAN),
        )
    }

    /// Scalar value of the given channel, NaN when the sample has none
    pub fn channel_value(&self, channel: Channel) -> f32 {
        let value = match channel {
            Channel::Gear => self.gear.map(|g| g as f32),
            Channel::Speed => self.speed_kph,
            Channel::Rpm => self.engine_rpm,
            Channel::Throttle => self.throttle,
            Channel::Brake => self.brake,
            Channel::PositionX => self.position_x,
            Channel::PositionY => self.position_y,
        };
        value.unwrap_or(f32::NAN)
    }
}

/// Telemetry channel used to color a path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Channel {
    Gear,
    Speed,
    Rpm,
    Throttle,
    Brake,
    PositionX,
    PositionY,
}

impl Channel {
    /// Label shown next to the channel's colorbar
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Gear => "Gear",
            Channel::Speed => "Speed",
            Channel::Rpm => "RPM",
            Channel::Throttle => "Throttle",
            Channel::Brake => "Brake",
            Channel::PositionX => "X",
            Channel::PositionY => "Y",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed lap of one driver
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap_number: u32,
    /// Lap time in seconds, NaN when the lap was not timed
    pub lap_time_s: f32,
    /// Tire compound name, e.g. "SOFT"
    pub category: String,
}

impl LapRecord {
    pub fn new(lap_number: u32, lap_time_s: f32, category: impl Into<String>) -> Self {
        Self {
            lap_number,
            lap_time_s,
            category: category.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_value_lookup() {
        let sample = TelemetrySample {
            sequence_index: 3,
            position_x: Some(10.0),
            position_y: Some(-4.0),
            speed_kph: Some(281.5),
            gear: Some(7),
            ..Default::default()
        };

        assert_eq!(sample.channel_value(Channel::Gear), 7.0);
        assert_eq!(sample.channel_value(Channel::Speed), 281.5);
        assert_eq!(sample.channel_value(Channel::PositionY), -4.0);
        assert!(sample.channel_value(Channel::Rpm).is_nan());
    }

    #[test]
    fn test_missing_position_is_nan() {
        let sample = TelemetrySample {
            position_x: Some(1.0),
            ..Default::default()
        };
        let (x, y) = sample.position();
        assert_eq!(x, 1.0);
        assert!(y.is_nan());
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new(2024, "Suzuka", "R");
        assert_eq!(key.to_string(), "2024 Suzuka R");
    }
}
