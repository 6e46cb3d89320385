// Telemetry to colored track path pipeline

pub mod color;
pub mod palette;
pub mod render_spec;
pub mod segments;

pub use color::{ColorMapping, ColorNormalization, ColorStop, PaletteSpec, ScalarColorMapper};
pub use palette::NamedPalette;
pub use render_spec::{ColoredSegment, LegendSpec, LegendTick, PathRenderSpec, RenderablePath};
pub use segments::{PathSegment, SegmentBuilder};
