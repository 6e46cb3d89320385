// Composition of colored segments into a self-contained renderable path

use log::{debug, info};
use rgb::RGBA8;
use serde::{Deserialize, Serialize};

use super::color::{ColorNormalization, PaletteSpec, ScalarColorMapper};
use super::segments::{PathSegment, SegmentBuilder};
use crate::errors::TrackpaintError;
use crate::telemetry::{Channel, TelemetrySample};

const CONTINUOUS_TICK_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColoredSegment {
    pub segment: PathSegment,
    pub color: RGBA8,
}

/// A colorbar tick, `position` is in data units
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendTick {
    pub position: f32,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendSpec {
    pub label: String,
    pub ticks: Vec<LegendTick>,
}

/// Everything a renderer needs to draw one colored track path
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderablePath {
    pub segments: Vec<ColoredSegment>,
    pub normalization: ColorNormalization,
    pub title: String,
    pub legend: LegendSpec,
    /// Draw a wide dark line under the colored segments
    pub track_outline: bool,
}

impl RenderablePath {
    pub fn with_track_outline(mut self) -> Self {
        self.track_outline = true;
        self
    }
}

pub struct PathRenderSpec;

impl PathRenderSpec {
    /// Pair every segment with its color, in order
    pub fn colorize(segments: Vec<PathSegment>, colors: Vec<RGBA8>) -> Vec<ColoredSegment> {
        segments
            .into_iter()
            .zip(colors)
            .map(|(segment, color)| ColoredSegment { segment, color })
            .collect()
    }

    /// Assemble a renderable path.
    ///
    /// With `legend_levels` (or discrete levels in the normalization) ticks sit
    /// in the middle of each bucket, at `level + 0.5`, labelled with the level.
    /// Otherwise ticks are spread evenly over the domain.
    pub fn compose(
        colored_segments: Vec<ColoredSegment>,
        normalization: ColorNormalization,
        title: impl Into<String>,
        legend_label: impl Into<String>,
        legend_levels: Option<&[f32]>,
    ) -> RenderablePath {
        let levels = legend_levels.or(normalization.discrete_levels.as_deref());
        let ticks = match levels {
            Some(levels) => levels
                .iter()
                .map(|level| LegendTick {
                    position: level + 0.5,
                    label: format!("{}", level),
                })
                .collect(),
            None => continuous_ticks(normalization.domain_min, normalization.domain_max),
        };

        RenderablePath {
            segments: colored_segments,
            legend: LegendSpec {
                label: legend_label.into(),
                ticks,
            },
            normalization,
            title: title.into(),
            track_outline: false,
        }
    }

    /// Full pipeline from raw samples to a renderable path colored by `channel`
    pub fn render_path(
        samples: &[TelemetrySample],
        channel: Channel,
        palette: &PaletteSpec,
        title: impl Into<String>,
    ) -> Result<RenderablePath, TrackpaintError> {
        info!(
            "Building {} path from {} telemetry samples",
            channel,
            samples.len()
        );

        let segments = SegmentBuilder::build(samples, channel)?;
        let mapping = ScalarColorMapper::map(&segments, palette)?;
        let colored = Self::colorize(segments, mapping.colors);

        let path = Self::compose(
            colored,
            mapping.normalization,
            title,
            channel.label(),
            None,
        );
        debug!(
            "Composed path with {} segments and {} legend ticks",
            path.segments.len(),
            path.legend.ticks.len()
        );
        Ok(path)
    }
}

fn continuous_ticks(min: f32, max: f32) -> Vec<LegendTick> {
    let tick = |position: f32| LegendTick {
        position,
        label: format!("{:.0}", position),
    };
    if max <= min {
        return vec![tick(min)];
    }
    let step = (max - min) / (CONTINUOUS_TICK_COUNT - 1) as f32;
    (0..CONTINUOUS_TICK_COUNT)
        .map(|i| tick(min + step * i as f32))
        .collect()
}
