// Request level views: one session, one driver, data from an injected source

use log::info;

use crate::errors::TrackpaintError;
use crate::laps::{CompoundColors, CompoundSeriesAggregator, LapTimeChart};
use crate::path::{NamedPalette, PaletteSpec, PathRenderSpec, RenderablePath};
use crate::telemetry::{Channel, SessionDataSource, SessionKey};

/// Builds the dashboard artifacts for drivers of a session
pub struct SessionViews<'a> {
    source: &'a dyn SessionDataSource,
    key: SessionKey,
    gear_palette: NamedPalette,
    speed_palette: NamedPalette,
    compound_colors: CompoundColors,
}

/// The three views shown for a driver
#[derive(Clone, Debug, PartialEq)]
pub struct DriverOverview {
    pub gear_shift_map: RenderablePath,
    pub speed_map: RenderablePath,
    pub lap_times: LapTimeChart,
}

impl<'a> SessionViews<'a> {
    pub fn new(source: &'a dyn SessionDataSource, key: SessionKey) -> Self {
        Self {
            source,
            key,
            gear_palette: NamedPalette::Paired,
            speed_palette: NamedPalette::Plasma,
            compound_colors: CompoundColors::default(),
        }
    }

    pub fn with_gear_palette(mut self, palette: NamedPalette) -> Self {
        self.gear_palette = palette;
        self
    }

    pub fn with_speed_palette(mut self, palette: NamedPalette) -> Self {
        self.speed_palette = palette;
        self
    }

    pub fn with_compound_colors(mut self, colors: CompoundColors) -> Self {
        self.compound_colors = colors;
        self
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn drivers(&self) -> Result<Vec<String>, TrackpaintError> {
        self.source.drivers(&self.key)
    }

    /// Fastest lap colored by gear
    pub fn gear_shift_map(&self, driver: &str) -> Result<RenderablePath, TrackpaintError> {
        let title = format!(
            "Fastest Lap Gear Shift Visualization\n{} - {} {}",
            driver, self.key.event, self.key.season
        );
        self.channel_map(
            driver,
            Channel::Gear,
            &PaletteSpec::gears(self.gear_palette),
            title,
        )
    }

    /// Fastest lap colored by speed, drawn over the track outline
    pub fn speed_map(&self, driver: &str) -> Result<RenderablePath, TrackpaintError> {
        let title = format!("{} {} - {} - Speed", self.key.event, self.key.season, driver);
        let path = self.channel_map(
            driver,
            Channel::Speed,
            &PaletteSpec::continuous(self.speed_palette),
            title,
        )?;
        Ok(path.with_track_outline())
    }

    /// Fastest lap colored by any channel
    pub fn channel_map(
        &self,
        driver: &str,
        channel: Channel,
        palette: &PaletteSpec,
        title: impl Into<String>,
    ) -> Result<RenderablePath, TrackpaintError> {
        info!("Building {} map for {} in {}", channel, driver, self.key);
        let samples = self.source.fastest_lap_telemetry(&self.key, driver)?;
        PathRenderSpec::render_path(&samples, channel, palette, title)
    }

    /// Quick laps grouped by compound
    pub fn lap_times(&self, driver: &str) -> Result<LapTimeChart, TrackpaintError> {
        info!("Building lap time chart for {} in {}", driver, self.key);
        let laps = self.source.laps(&self.key, driver, true)?;
        let series = CompoundSeriesAggregator::aggregate(&laps, &self.compound_colors, true)?;
        let title = format!(
            "{} Lap Times in the {} {}",
            driver, self.key.season, self.key.event
        );
        Ok(LapTimeChart::new(title, series))
    }

    /// All views of a driver; the first failure fails the whole overview
    pub fn driver_overview(&self, driver: &str) -> Result<DriverOverview, TrackpaintError> {
        Ok(DriverOverview {
            gear_shift_map: self.gear_shift_map(driver)?,
            speed_map: self.speed_map(driver)?,
            lap_times: self.lap_times(driver)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{InMemorySource, LapRecord, SessionData, TelemetrySample};

    fn suzuka_source() -> (SessionKey, InMemorySource) {
        let key = SessionKey::new(2024, "Suzuka", "R");
        let mut data = SessionData::default();
        data.add_lap("VER", LapRecord::new(1, 120.0, "MEDIUM"));
        data.add_lap("VER", LapRecord::new(2, 96.0, "MEDIUM"));
        data.add_lap("VER", LapRecord::new(3, 95.0, "HARD"));
        data.add_lap("PER", LapRecord::new(1, 97.0, "SUPERSOFT"));

        let lap: Vec<TelemetrySample> = (0..20)
            .map(|i| {
                let angle = i as f32 / 20.0 * std::f32::consts::TAU;
                TelemetrySample {
                    sequence_index: i,
                    position_x: Some(1000.0 * angle.cos()),
                    position_y: Some(600.0 * angle.sin()),
                    speed_kph: Some(150.0 + i as f32 * 5.0),
                    gear: Some(3 + (i as u32 % 5)),
                    ..Default::default()
                }
            })
            .collect();
        data.add_telemetry("VER", 3, lap);

        let mut source = InMemorySource::new();
        source.insert(key.clone(), data);
        (key, source)
    }

    #[test]
    fn test_driver_overview() {
        let (key, source) = suzuka_source();
        let views = SessionViews::new(&source, key);
        let overview = views.driver_overview("VER").unwrap();

        assert_eq!(
            overview.gear_shift_map.title,
            "Fastest Lap Gear Shift Visualization\nVER - Suzuka 2024"
        );
        assert_eq!(overview.gear_shift_map.segments.len(), 19);
        assert!(!overview.gear_shift_map.track_outline);

        assert_eq!(overview.speed_map.title, "Suzuka 2024 - VER - Speed");
        assert!(overview.speed_map.track_outline);
        assert_eq!(overview.speed_map.normalization.domain_min, 150.0);
        assert_eq!(overview.speed_map.normalization.domain_max, 240.0);

        assert_eq!(overview.lap_times.title, "VER Lap Times in the 2024 Suzuka");
        let categories: Vec<&str> = overview
            .lap_times
            .series
            .iter()
            .map(|s| s.category.as_str())
            .collect();
        // Lap 1 is no quick lap
        assert_eq!(categories, vec!["MEDIUM", "HARD"]);
        assert_eq!(overview.lap_times.lap_count(), 2);
    }

    #[test]
    fn test_errors_pass_through() {
        let (key, source) = suzuka_source();
        let views = SessionViews::new(&source, key);

        assert!(matches!(
            views.gear_shift_map("HAM"),
            Err(TrackpaintError::UnknownDriver { .. })
        ));
        assert!(matches!(
            views.lap_times("PER"),
            Err(TrackpaintError::UnknownCategory { .. })
        ));
        assert!(matches!(
            views.speed_map("PER"),
            Err(TrackpaintError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_custom_palettes() {
        let (key, source) = suzuka_source();
        let views =
            SessionViews::new(&source, key.clone()).with_speed_palette(NamedPalette::Viridis);
        assert_eq!(views.key(), &key);
        let path = views.speed_map("VER").unwrap();
        assert_eq!(
            path.normalization.colorbar[0].color,
            NamedPalette::Viridis.colors()[0]
        );
        assert_eq!(views.drivers().unwrap(), vec!["VER", "PER"]);
    }
}
