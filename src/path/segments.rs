// Conversion of ordered telemetry samples into colorable line segments

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::TrackpaintError;
use crate::telemetry::{Channel, TelemetrySample};

/// Straight line between two adjacent samples.
///
/// `scalar_value` is the channel value of the sample the segment starts at:
/// a gear or speed is attributed to the stretch of track it precedes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub start_point: (f32, f32),
    pub end_point: (f32, f32),
    pub scalar_value: f32,
}

impl PathSegment {
    /// Whether both endpoints have finite coordinates
    pub fn is_drawable(&self) -> bool {
        self.start_point.0.is_finite()
            && self.start_point.1.is_finite()
            && self.end_point.0.is_finite()
            && self.end_point.1.is_finite()
    }
}

pub struct SegmentBuilder;

impl SegmentBuilder {
    /// Build one segment per pair of adjacent samples.
    ///
    /// N samples give exactly N-1 segments in input order. Samples with missing
    /// coordinates are kept, leaving the two segments touching them degenerate.
    pub fn build(
        samples: &[TelemetrySample],
        channel: Channel,
    ) -> Result<Vec<PathSegment>, TrackpaintError> {
        if samples.len() < 2 {
            return Err(TrackpaintError::InsufficientData {
                found: samples.len(),
            });
        }

        if let Some((_, next)) = samples
            .iter()
            .tuple_windows()
            .find(|(prev, next)| next.sequence_index <= prev.sequence_index)
        {
            return Err(TrackpaintError::UnorderedSamples {
                index: next.sequence_index,
            });
        }

        let segments: Vec<PathSegment> = samples
            .iter()
            .tuple_windows()
            .map(|(start, end)| PathSegment {
                start_point: start.position(),
                end_point: end.position(),
                scalar_value: start.channel_value(channel),
            })
            .collect();

        let degenerate = segments.iter().filter(|s| !s.is_drawable()).count();
        if degenerate > 0 {
            warn!(
                "{} of {} segments have missing coordinates",
                degenerate,
                segments.len()
            );
        }
        debug!(
            "Built {} segments from {} samples on channel {}",
            segments.len(),
            samples.len(),
            channel
        );

        Ok(segments)
    }
}
