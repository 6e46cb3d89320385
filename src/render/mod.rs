// Rendering backends for renderable paths and lap charts

pub mod svg;

pub use svg::{ScalingAlgorithm, SvgRenderConfig, SvgRenderer};
