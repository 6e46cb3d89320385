// Library interface for trackpaint
// Telemetry to colored track paths, lap records to per-compound series

pub mod config;
pub mod errors;
pub mod laps;
pub mod path;
pub mod render;
pub mod telemetry;
pub mod views;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::TrackpaintError;
pub use laps::{CategorySeries, CompoundColors, CompoundSeriesAggregator, LapTimeChart};
pub use path::{
    ColorNormalization, NamedPalette, PaletteSpec, PathRenderSpec, PathSegment, RenderablePath,
    ScalarColorMapper, SegmentBuilder,
};
pub use render::SvgRenderer;
pub use telemetry::{
    Channel, InMemorySource, JsonlSessionSource, LapRecord, SessionDataSource, SessionKey,
    TelemetrySample,
};
pub use views::SessionViews;
