// JSON-lines backed session data source
//
// Sessions live under <data_dir>/<season>/<event>/<session>/ with one
// laps.jsonl and one telemetry.jsonl file each.

use std::io;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use super::{LapRecord, QuickLapFilter, SessionData, SessionDataSource, SessionKey, TelemetrySample};
use crate::errors::TrackpaintError;

pub const LAPS_FILE_NAME: &str = "laps.jsonl";
pub const TELEMETRY_FILE_NAME: &str = "telemetry.jsonl";

/// One line of laps.jsonl
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LapRow {
    pub driver: String,
    pub lap_number: u32,
    /// Missing for laps without a time
    pub lap_time_s: Option<f32>,
    pub compound: String,
}

/// One line of telemetry.jsonl
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetryRow {
    pub driver: String,
    pub lap_number: u32,
    #[serde(flatten)]
    pub sample: TelemetrySample,
}

/// Reads sessions from a directory tree of JSON-lines files on every request
pub struct JsonlSessionSource {
    data_dir: PathBuf,
    quick_lap_filter: QuickLapFilter,
}

impl JsonlSessionSource {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            quick_lap_filter: QuickLapFilter::default(),
        }
    }

    pub fn with_quick_lap_filter(mut self, filter: QuickLapFilter) -> Self {
        self.quick_lap_filter = filter;
        self
    }

    /// Directory holding the files for a session
    pub fn session_dir(&self, key: &SessionKey) -> PathBuf {
        self.data_dir
            .join(key.season.to_string())
            .join(&key.event)
            .join(&key.session)
    }

    /// Load laps only, telemetry is left empty
    fn load_laps(&self, key: &SessionKey) -> Result<SessionData, TrackpaintError> {
        let dir = self.session_dir(key);
        let rows: Vec<LapRow> = read_lines(&dir.join(LAPS_FILE_NAME), key)?;

        let mut data = SessionData {
            quick_lap_filter: self.quick_lap_filter,
            ..Default::default()
        };
        for row in rows {
            data.add_lap(
                row.driver,
                LapRecord::new(
                    row.lap_number,
                    row.lap_time_s.unwrap_or(f32::NAN),
                    row.compound,
                ),
            );
        }
        info!("Loaded {} laps for session {}", data.laps.len(), key);
        Ok(data)
    }

    /// Load laps plus telemetry of a single driver
    fn load_driver(&self, key: &SessionKey, driver: &str) -> Result<SessionData, TrackpaintError> {
        let mut data = self.load_laps(key)?;
        let dir = self.session_dir(key);
        let rows: Vec<TelemetryRow> = read_lines(&dir.join(TELEMETRY_FILE_NAME), key)?;

        let mut sample_count = 0;
        for row in rows.into_iter().filter(|r| r.driver == driver) {
            data.add_telemetry(row.driver, row.lap_number, vec![row.sample]);
            sample_count += 1;
        }
        // Rows of one lap may be stored out of order
        for samples in data.telemetry.values_mut() {
            samples.sort_by_key(|sample| sample.sequence_index);
        }
        info!(
            "Loaded {} telemetry samples for {} in session {}",
            sample_count, driver, key
        );
        Ok(data)
    }
}

fn read_lines<T>(path: &Path, key: &SessionKey) -> Result<Vec<T>, TrackpaintError>
where
    T: serde::de::DeserializeOwned,
{
    if !path.exists() {
        return Err(TrackpaintError::DataUnavailable {
            reason: format!("{:?} not found for session {}", path, key),
        });
    }

    let loader_error = |source: io::Error| TrackpaintError::TelemetryLoaderError {
        path: format!("{:?}", path),
        source,
    };

    serde_jsonlines::json_lines(path)
        .map_err(loader_error)?
        .collect::<Result<Vec<T>, io::Error>>()
        .map_err(loader_error)
}

impl SessionDataSource for JsonlSessionSource {
    fn drivers(&self, key: &SessionKey) -> Result<Vec<String>, TrackpaintError> {
        Ok(self.load_laps(key)?.drivers())
    }

    fn laps(
        &self,
        key: &SessionKey,
        driver: &str,
        quick_laps_only: bool,
    ) -> Result<Vec<LapRecord>, TrackpaintError> {
        self.load_laps(key)?.driver_laps(driver, quick_laps_only)
    }

    fn fastest_lap_telemetry(
        &self,
        key: &SessionKey,
        driver: &str,
    ) -> Result<Vec<TelemetrySample>, TrackpaintError> {
        self.load_driver(key, driver)?.fastest_lap_telemetry(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Channel;
    use std::fs;
    use tempfile::TempDir;

    fn write_session(root: &Path, key: &SessionKey, laps: &str, telemetry: &str) {
        let dir = root
            .join(key.season.to_string())
            .join(&key.event)
            .join(&key.session);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LAPS_FILE_NAME), laps).unwrap();
        fs::write(dir.join(TELEMETRY_FILE_NAME), telemetry).unwrap();
    }

    #[test]
    fn test_load_laps_and_fastest_lap() {
        let temp_dir = TempDir::new().unwrap();
        let key = SessionKey::new(2024, "Suzuka", "R");
        write_session(
            temp_dir.path(),
            &key,
            concat!(
                r#"{"driver":"LEC","lap_number":1,"lap_time_s":null,"compound":"MEDIUM"}"#,
                "\n",
                r#"{"driver":"LEC","lap_number":2,"lap_time_s":96.5,"compound":"MEDIUM"}"#,
                "\n",
                r#"{"driver":"SAI","lap_number":1,"lap_time_s":97.0,"compound":"HARD"}"#,
                "\n",
            ),
            concat!(
                r#"{"driver":"LEC","lap_number":2,"sequence_index":0,"position_x":0.0,"position_y":0.0,"gear":3}"#,
                "\n",
                r#"{"driver":"LEC","lap_number":2,"sequence_index":1,"position_x":5.0,"position_y":1.0,"gear":4}"#,
                "\n",
                r#"{"driver":"SAI","lap_number":1,"sequence_index":0,"position_x":9.0,"position_y":9.0,"gear":2}"#,
                "\n",
            ),
        );

        let source = JsonlSessionSource::new(temp_dir.path().to_path_buf());
        assert_eq!(source.drivers(&key).unwrap(), vec!["LEC", "SAI"]);

        let laps = source.laps(&key, "LEC", false).unwrap();
        assert_eq!(laps.len(), 2);
        assert!(laps[0].lap_time_s.is_nan());

        let quick = source.laps(&key, "LEC", true).unwrap();
        assert_eq!(quick.len(), 1);

        let telemetry = source.fastest_lap_telemetry(&key, "LEC").unwrap();
        assert_eq!(telemetry.len(), 2);
        assert_eq!(telemetry[1].gear, Some(4));
        assert_eq!(telemetry[1].speed_kph, None);
    }

    #[test]
    fn test_telemetry_rows_sorted_by_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let key = SessionKey::new(2024, "Monza", "Q");
        let rows: Vec<String> = [1, 0, 2]
            .iter()
            .map(|i| {
                format!(
                    r#"{{"driver":"HAM","lap_number":4,"sequence_index":{i},"position_x":{i}.0,"position_y":0.0,"speed_kph":300.0}}"#
                )
            })
            .collect();
        write_session(
            temp_dir.path(),
            &key,
            r#"{"driver":"HAM","lap_number":4,"lap_time_s":80.1,"compound":"SOFT"}"#,
            &rows.join("\n"),
        );

        let source = JsonlSessionSource::new(temp_dir.path().to_path_buf());
        let telemetry = source.fastest_lap_telemetry(&key, "HAM").unwrap();
        let order: Vec<u64> = telemetry.iter().map(|s| s.sequence_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(telemetry[0].position_x, Some(0.0));

        let segments = crate::path::SegmentBuilder::build(&telemetry, Channel::Speed).unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_missing_session_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let source = JsonlSessionSource::new(temp_dir.path().to_path_buf());
        let key = SessionKey::new(2024, "Monaco", "Q");

        assert!(matches!(
            source.drivers(&key),
            Err(TrackpaintError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_is_loader_error() {
        let temp_dir = TempDir::new().unwrap();
        let key = SessionKey::new(2024, "Suzuka", "R");
        write_session(temp_dir.path(), &key, "not json\n", "");

        let source = JsonlSessionSource::new(temp_dir.path().to_path_buf());
        assert!(matches!(
            source.drivers(&key),
            Err(TrackpaintError::TelemetryLoaderError { .. })
        ));
    }
}
