// Error types for trackpaint

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum TrackpaintError {
    // Path construction errors
    #[snafu(display("Insufficient telemetry: {found} samples, at least 2 are needed"))]
    InsufficientData { found: usize },
    #[snafu(display("Telemetry sample {index} does not follow its predecessor"))]
    UnorderedSamples { index: u64 },
    #[snafu(display("None of the {count} segment values is finite"))]
    NoFiniteScalarValues { count: usize },
    #[snafu(display("Invalid palette: {reason}"))]
    InvalidPalette { reason: String },

    // Lap series errors
    #[snafu(display("Unknown lap category: {category}"))]
    UnknownCategory { category: String },
    #[snafu(display("Lap {lap_number} appears more than once"))]
    DuplicateLap { lap_number: u32 },

    // Data acquisition errors
    #[snafu(display("Session data unavailable: {reason}"))]
    DataUnavailable { reason: String },
    #[snafu(display("Unknown driver: {driver}"))]
    UnknownDriver { driver: String },
    #[snafu(display("Error loading telemetry file {path}"))]
    TelemetryLoaderError { path: String, source: io::Error },

    // Rendering errors
    #[snafu(display("SVG rendering failed: {reason}"))]
    SvgRenderError { reason: String },
    #[snafu(display("Error writing output file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
    #[snafu(display("Invalid config: {reason}"))]
    InvalidConfig { reason: String },
}
