// Display colors for tire compounds

use std::collections::HashMap;

use rgb::RGBA8;

use crate::errors::TrackpaintError;
use crate::path::palette::parse_hex;

const DEFAULT_COMPOUND_COLORS: [(&str, &str); 5] = [
    ("SOFT", "#D32F2F"),
    ("MEDIUM", "#FFB300"),
    ("HARD", "#757575"),
    ("INTERMEDIATE", "#388E3C"),
    ("WET", "#1976D2"),
];

/// Color policy mapping a compound name to its color.
///
/// Only compounds present here are known; anything else is rejected by the
/// aggregator instead of being drawn in a fallback color.
#[derive(Clone, Debug, PartialEq)]
pub struct CompoundColors {
    colors: HashMap<String, RGBA8>,
}

impl Default for CompoundColors {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COMPOUND_COLORS
                .iter()
                .filter_map(|(name, hex)| Some((name.to_string(), parse_hex(hex).ok()?)))
                .collect(),
        }
    }
}

impl CompoundColors {
    /// Empty policy, every compound unknown
    pub fn empty() -> Self {
        Self {
            colors: HashMap::new(),
        }
    }

    /// Set or replace the color of a compound
    pub fn with_color(mut self, compound: impl Into<String>, color: RGBA8) -> Self {
        self.colors.insert(compound.into(), color);
        self
    }

    /// Default colors with overrides given as hex strings
    pub fn with_hex_overrides(
        overrides: &HashMap<String, String>,
    ) -> Result<Self, TrackpaintError> {
        let mut colors = Self::default();
        for (compound, hex) in overrides {
            colors = colors.with_color(compound.clone(), parse_hex(hex)?);
        }
        Ok(colors)
    }

    pub fn get(&self, compound: &str) -> Option<RGBA8> {
        self.colors.get(compound).copied()
    }

    pub fn contains(&self, compound: &str) -> bool {
        self.colors.contains_key(compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_compounds() {
        let colors = CompoundColors::default();
        assert_eq!(colors.get("SOFT"), Some(RGBA8::new(0xd3, 0x2f, 0x2f, 255)));
        assert_eq!(colors.get("WET"), Some(RGBA8::new(0x19, 0x76, 0xd2, 255)));
        assert!(colors.contains("INTERMEDIATE"));
        assert!(!colors.contains("SUPERSOFT"));
    }

    #[test]
    fn test_hex_overrides() {
        let overrides = HashMap::from([
            ("SOFT".to_string(), "#FF0000".to_string()),
            ("HYPERSOFT".to_string(), "#FFC0CB".to_string()),
        ]);
        let colors = CompoundColors::with_hex_overrides(&overrides).unwrap();
        assert_eq!(colors.get("SOFT"), Some(RGBA8::new(255, 0, 0, 255)));
        assert!(colors.contains("HYPERSOFT"));
        assert!(colors.contains("HARD"));

        let bad = HashMap::from([("SOFT".to_string(), "red".to_string())]);
        assert!(CompoundColors::with_hex_overrides(&bad).is_err());
    }
}
