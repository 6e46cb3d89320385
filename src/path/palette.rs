// Named color palettes and color helpers

use rgb::RGBA8;
use serde::{Deserialize, Serialize};

use crate::errors::TrackpaintError;

/// Color used for values that cannot be mapped (NaN)
pub const BAD_COLOR: RGBA8 = RGBA8 {
    r: 0,
    g: 0,
    b: 0,
    a: 0,
};

/// Qualitative 12 entry palette, one distinct color per gear
const PAIRED: [&str; 12] = [
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
];

/// Evenly spaced control points of the plasma gradient
const PLASMA: [&str; 9] = [
    "#0d0887", "#4c02a1", "#7e03a8", "#a92395", "#cc4778", "#e66c5c", "#f89540", "#fdc527",
    "#f0f921",
];

/// Evenly spaced control points of the viridis gradient
const VIRIDIS: [&str; 10] = [
    "#440154", "#482878", "#3e4a89", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
];

/// Palettes known by name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum NamedPalette {
    Paired,
    Plasma,
    Viridis,
}

impl NamedPalette {
    /// The palette colors, in order
    pub fn colors(&self) -> Vec<RGBA8> {
        let hex: &[&str] = match self {
            NamedPalette::Paired => &PAIRED,
            NamedPalette::Plasma => &PLASMA,
            NamedPalette::Viridis => &VIRIDIS,
        };
        // The tables above are valid hex literals
        hex.iter().filter_map(|h| parse_hex(h).ok()).collect()
    }
}

/// Parse "#rrggbb" or "#rrggbbaa"
pub fn parse_hex(hex: &str) -> Result<RGBA8, TrackpaintError> {
    let invalid = || TrackpaintError::InvalidPalette {
        reason: format!("invalid hex color {hex:?}"),
    };
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    let well_formed = digits.chars().all(|c| c.is_ascii_hexdigit())
        && (digits.len() == 6 || digits.len() == 8);
    if !well_formed {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
    Ok(RGBA8::new(channel(0)?, channel(2)?, channel(4)?, alpha))
}

/// Format as "#rrggbb", dropping alpha
pub fn to_hex(color: RGBA8) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

/// Sample a gradient at `t` in [0, 1] by linear interpolation between
/// evenly spaced control points. `t` outside the range is clamped.
pub fn sample_gradient(stops: &[RGBA8], t: f32) -> RGBA8 {
    match stops {
        [] => BAD_COLOR,
        [only] => *only,
        _ => {
            let t = t.clamp(0.0, 1.0);
            let scaled = t * (stops.len() - 1) as f32;
            let lower = (scaled.floor() as usize).min(stops.len() - 2);
            let frac = scaled - lower as f32;
            lerp(stops[lower], stops[lower + 1], frac)
        }
    }
}

fn lerp(a: RGBA8, b: RGBA8, t: f32) -> RGBA8 {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    RGBA8::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}
