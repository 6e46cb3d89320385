// Mapping of segment scalar values to colors

use itertools::{Itertools, MinMaxResult};
use log::{debug, warn};
use rgb::RGBA8;
use serde::{Deserialize, Serialize};

use super::palette::{BAD_COLOR, NamedPalette, sample_gradient};
use super::segments::PathSegment;
use crate::errors::TrackpaintError;

/// Number of gears on the gear colorbar
pub const GEAR_LEVELS: u32 = 8;

/// How scalar values are turned into colors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PaletteSpec {
    /// Linear normalization over the observed value range, sampled from a
    /// gradient through `colors`
    Continuous { colors: Vec<RGBA8> },
    /// Values bucketed into `[level, next level)`, bucket i drawn with
    /// `colors[i]`. The last bucket is `[last, last + 1)`.
    Discrete { colors: Vec<RGBA8>, levels: Vec<f32> },
}

impl PaletteSpec {
    pub fn continuous(palette: NamedPalette) -> Self {
        PaletteSpec::Continuous {
            colors: palette.colors(),
        }
    }

    pub fn discrete(palette: NamedPalette, levels: Vec<f32>) -> Self {
        PaletteSpec::Discrete {
            colors: palette.colors(),
            levels,
        }
    }

    /// Gears 1 to 8, one palette entry each
    pub fn gears(palette: NamedPalette) -> Self {
        Self::discrete(palette, (1..=GEAR_LEVELS).map(|g| g as f32).collect())
    }

    fn validate(&self) -> Result<(), TrackpaintError> {
        let invalid = |reason: String| -> Result<(), TrackpaintError> {
            Err(TrackpaintError::InvalidPalette { reason })
        };
        match self {
            PaletteSpec::Continuous { colors } if colors.is_empty() => {
                invalid("continuous palette has no colors".to_string())
            }
            PaletteSpec::Discrete { levels, .. } if levels.is_empty() => {
                invalid("discrete palette has no levels".to_string())
            }
            PaletteSpec::Discrete { colors, levels } if levels.len() > colors.len() => invalid(
                format!("{} levels but only {} colors", levels.len(), colors.len()),
            ),
            PaletteSpec::Discrete { levels, .. }
                if levels.iter().any(|l| !l.is_finite())
                    || levels.iter().tuple_windows().any(|(a, b)| b <= a) =>
            {
                invalid("discrete levels must be finite and strictly increasing".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// One stop of a colorbar, `offset` runs from 0 (domain_min) to 1 (domain_max)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: RGBA8,
}

/// Describes how values were normalized, enough to draw a matching colorbar
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorNormalization {
    pub domain_min: f32,
    pub domain_max: f32,
    /// Bucket lower bounds, set for discrete palettes only
    pub discrete_levels: Option<Vec<f32>>,
    /// Colorbar ramp, discrete buckets show up as pairs of equal stops
    pub colorbar: Vec<ColorStop>,
}

impl ColorNormalization {
    /// Position of a value along the colorbar, 0.5 for a degenerate domain
    pub fn offset_of(&self, value: f32) -> f32 {
        let span = self.domain_max - self.domain_min;
        if span > 0.0 {
            ((value - self.domain_min) / span).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    pub fn is_discrete(&self) -> bool {
        self.discrete_levels.is_some()
    }
}

/// Colors in segment order together with their normalization
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMapping {
    pub colors: Vec<RGBA8>,
    pub normalization: ColorNormalization,
}

pub struct ScalarColorMapper;

impl ScalarColorMapper {
    /// Color every segment by its scalar value. Pure and deterministic.
    pub fn map(
        segments: &[PathSegment],
        palette: &PaletteSpec,
    ) -> Result<ColorMapping, TrackpaintError> {
        palette.validate()?;

        let nan_count = segments
            .iter()
            .filter(|s| s.scalar_value.is_nan())
            .count();
        if nan_count > 0 {
            warn!(
                "{} of {} segments have no value and use the bad color",
                nan_count,
                segments.len()
            );
        }

        let mapping = match palette {
            PaletteSpec::Continuous { colors } => Self::map_continuous(segments, colors)?,
            PaletteSpec::Discrete { colors, levels } => {
                Self::map_discrete(segments, colors, levels)
            }
        };

        debug!(
            "Mapped {} segments over domain [{}, {}]",
            mapping.colors.len(),
            mapping.normalization.domain_min,
            mapping.normalization.domain_max
        );
        Ok(mapping)
    }

    fn map_continuous(
        segments: &[PathSegment],
        stops: &[RGBA8],
    ) -> Result<ColorMapping, TrackpaintError> {
        let (domain_min, domain_max) = match segments
            .iter()
            .map(|s| s.scalar_value)
            .filter(|v| v.is_finite())
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => {
                return Err(TrackpaintError::NoFiniteScalarValues {
                    count: segments.len(),
                });
            }
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(min, max) => (min, max),
        };

        let normalization = ColorNormalization {
            domain_min,
            domain_max,
            discrete_levels: None,
            colorbar: gradient_colorbar(stops),
        };

        let colors = segments
            .iter()
            .map(|s| {
                if s.scalar_value.is_finite() {
                    sample_gradient(stops, normalization.offset_of(s.scalar_value))
                } else {
                    BAD_COLOR
                }
            })
            .collect();

        Ok(ColorMapping {
            colors,
            normalization,
        })
    }

    fn map_discrete(segments: &[PathSegment], palette: &[RGBA8], levels: &[f32]) -> ColorMapping {
        let colors = segments
            .iter()
            .map(|s| match bucket_index(levels, s.scalar_value) {
                Some(bucket) => palette[bucket],
                None => BAD_COLOR,
            })
            .collect();

        let domain_min = levels[0];
        let domain_max = levels[levels.len() - 1] + 1.0;
        let span = domain_max - domain_min;

        // Each bucket is a flat band between its two boundaries
        let colorbar = levels
            .iter()
            .enumerate()
            .flat_map(|(i, &lower)| {
                let upper = levels.get(i + 1).copied().unwrap_or(domain_max);
                let color = palette[i];
                [
                    ColorStop {
                        offset: (lower - domain_min) / span,
                        color,
                    },
                    ColorStop {
                        offset: (upper - domain_min) / span,
                        color,
                    },
                ]
            })
            .collect();

        ColorMapping {
            colors,
            normalization: ColorNormalization {
                domain_min,
                domain_max,
                discrete_levels: Some(levels.to_vec()),
                colorbar,
            },
        }
    }
}

/// Index of the bucket holding `value`: the last level not above it.
/// Values below the first level land in the first bucket, NaN in none.
pub fn bucket_index(levels: &[f32], value: f32) -> Option<usize> {
    if value.is_nan() || levels.is_empty() {
        return None;
    }
    Some(levels.partition_point(|level| *level <= value).saturating_sub(1))
}

fn gradient_colorbar(stops: &[RGBA8]) -> Vec<ColorStop> {
    if stops.len() == 1 {
        return vec![ColorStop {
            offset: 0.0,
            color: stops[0],
        }];
    }
    let last = (stops.len() - 1) as f32;
    stops
        .iter()
        .enumerate()
        .map(|(i, &color)| ColorStop {
            offset: i as f32 / last,
            color,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::palette::parse_hex;
    use proptest::prelude::*;

    fn segments_with_values(values: &[f32]) -> Vec<PathSegment> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| PathSegment {
                start_point: (i as f32, 0.0),
                end_point: (i as f32 + 1.0, 0.0),
                scalar_value: v,
            })
            .collect()
    }

    #[test]
    fn test_discrete_boundary_belongs_to_lower_bucket() {
        let levels: Vec<f32> = (1..=8).map(|g| g as f32).collect();
        assert_eq!(bucket_index(&levels, 3.0), Some(2));
        assert_eq!(bucket_index(&levels, 3.99), Some(2));
        assert_eq!(bucket_index(&levels, 4.0), Some(3));
        assert_eq!(bucket_index(&levels, 8.7), Some(7));
        assert_eq!(bucket_index(&levels, 12.0), Some(7));
        assert_eq!(bucket_index(&levels, 0.0), Some(0));
        assert_eq!(bucket_index(&levels, f32::NAN), None);
    }

    #[test]
    fn test_gear_colors_follow_paired_palette() {
        let palette = PaletteSpec::gears(NamedPalette::Paired);
        let segments = segments_with_values(&[1.0, 3.0, 8.0]);
        let mapping = ScalarColorMapper::map(&segments, &palette).unwrap();

        assert_eq!(mapping.colors[0], parse_hex("#a6cee3").unwrap());
        assert_eq!(mapping.colors[1], parse_hex("#b2df8a").unwrap());
        assert_eq!(mapping.colors[2], parse_hex("#ff7f00").unwrap());

        let norm = &mapping.normalization;
        assert_eq!(norm.domain_min, 1.0);
        assert_eq!(norm.domain_max, 9.0);
        assert_eq!(norm.discrete_levels.as_ref().map(|l| l.len()), Some(8));
        assert_eq!(norm.colorbar.len(), 16);
        assert_eq!(norm.colorbar[4].offset, 2.0 / 8.0);
        assert_eq!(norm.colorbar[15].offset, 1.0);
    }

    #[test]
    fn test_continuous_degenerate_domain_uses_midpoint() {
        let palette = PaletteSpec::continuous(NamedPalette::Plasma);
        let segments = segments_with_values(&[200.0, 200.0, 200.0]);
        let mapping = ScalarColorMapper::map(&segments, &palette).unwrap();

        let midpoint = sample_gradient(&NamedPalette::Plasma.colors(), 0.5);
        assert!(mapping.colors.iter().all(|c| *c == midpoint));
        assert_eq!(mapping.normalization.domain_min, 200.0);
        assert_eq!(mapping.normalization.domain_max, 200.0);
    }

    #[test]
    fn test_continuous_uses_observed_range() {
        let palette = PaletteSpec::continuous(NamedPalette::Plasma);
        let segments = segments_with_values(&[80.0, f32::NAN, 320.0, 200.0]);
        let mapping = ScalarColorMapper::map(&segments, &palette).unwrap();

        let plasma = NamedPalette::Plasma.colors();
        assert_eq!(mapping.normalization.domain_min, 80.0);
        assert_eq!(mapping.normalization.domain_max, 320.0);
        assert_eq!(mapping.colors[0], plasma[0]);
        assert_eq!(mapping.colors[1], BAD_COLOR);
        assert_eq!(mapping.colors[2], plasma[8]);
        assert_eq!(mapping.colors[3], sample_gradient(&plasma, 0.5));
        assert_eq!(mapping.normalization.colorbar.len(), plasma.len());
    }

    #[test]
    fn test_continuous_without_finite_values() {
        let palette = PaletteSpec::continuous(NamedPalette::Viridis);
        let segments = segments_with_values(&[f32::NAN, f32::NAN]);
        assert!(matches!(
            ScalarColorMapper::map(&segments, &palette),
            Err(TrackpaintError::NoFiniteScalarValues { count: 2 })
        ));
    }

    #[test]
    fn test_invalid_palettes() {
        let segments = segments_with_values(&[1.0]);

        let too_many_levels = PaletteSpec::discrete(
            NamedPalette::Paired,
            (1..=13).map(|g| g as f32).collect(),
        );
        assert!(ScalarColorMapper::map(&segments, &too_many_levels).is_err());

        let unordered = PaletteSpec::discrete(NamedPalette::Paired, vec![1.0, 3.0, 2.0]);
        assert!(ScalarColorMapper::map(&segments, &unordered).is_err());

        let empty = PaletteSpec::Continuous { colors: vec![] };
        assert!(ScalarColorMapper::map(&segments, &empty).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_mapping_is_deterministic(
            values in prop::collection::vec(-50.0f32..400.0f32, 1..100),
            discrete in any::<bool>(),
        ) {
            let palette = if discrete {
                PaletteSpec::gears(NamedPalette::Paired)
            } else {
                PaletteSpec::continuous(NamedPalette::Plasma)
            };
            let segments = segments_with_values(&values);

            let first = ScalarColorMapper::map(&segments, &palette).unwrap();
            let second = ScalarColorMapper::map(&segments, &palette).unwrap();

            // Property: identical input yields identical colors
            prop_assert_eq!(&first.colors, &second.colors);
            prop_assert_eq!(first.colors.len(), segments.len());
            prop_assert!(first.normalization.domain_min <= first.normalization.domain_max);
        }
    }
}
