//! Cube color model.
//!
//! The perception pipeline averages the RGBA samples of every point in a
//! cluster into a single [`Rgba`]; the task layer then classifies that
//! average against the small enumerated [`PaletteColor`] the cube set is
//! manufactured in.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Rgba
// ────────────────────────────────────────────────────────────────────────────

/// An RGBA color with channels normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Create a color from normalised channel values.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from 8-bit channel values.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            1.0,
        )
    }

    /// Squared distance to another color in RGB space (alpha is ignored:
    /// the camera reports it as fully opaque for every point).
    pub fn distance_sq_rgb(&self, other: &Rgba) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        dr * dr + dg * dg + db * db
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PaletteColor
// ────────────────────────────────────────────────────────────────────────────

/// The enumerated palette the cube set is manufactured in.
///
/// Classification is nearest-distance in RGB space; ties are broken by
/// declaration order, so the ordering of the variants below is part of the
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaletteColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl PaletteColor {
    /// All palette entries in declaration (tie-break) order.
    pub const ALL: [PaletteColor; 6] = [
        PaletteColor::Red,
        PaletteColor::Blue,
        PaletteColor::Green,
        PaletteColor::Yellow,
        PaletteColor::Purple,
        PaletteColor::Orange,
    ];

    /// Reference RGB value for this palette entry.
    pub fn rgb(&self) -> [f32; 3] {
        match self {
            PaletteColor::Red => [1.0, 0.0, 0.0],
            PaletteColor::Blue => [0.0, 0.0, 1.0],
            PaletteColor::Green => [0.0, 1.0, 0.0],
            PaletteColor::Yellow => [1.0, 1.0, 0.0],
            PaletteColor::Purple => [0.5, 0.0, 0.5],
            PaletteColor::Orange => [1.0, 0.5, 0.0],
        }
    }

    /// Classify an averaged color sample against the palette by nearest
    /// squared RGB distance.  The first declared entry wins ties.
    pub fn classify(color: Rgba) -> PaletteColor {
        let mut best = PaletteColor::ALL[0];
        let mut best_dist = f32::INFINITY;
        for candidate in PaletteColor::ALL {
            let [r, g, b] = candidate.rgb();
            let reference = Rgba::new(r, g, b, 1.0);
            let dist = color.distance_sq_rgb(&reference);
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }
}

impl std::fmt::Display for PaletteColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaletteColor::Red => "red",
            PaletteColor::Blue => "blue",
            PaletteColor::Green => "green",
            PaletteColor::Yellow => "yellow",
            PaletteColor::Purple => "purple",
            PaletteColor::Orange => "orange",
        };
        write!(f, "{name}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_normalises_channels() {
        let c = Rgba::from_u8(255, 0, 128);
        assert!((c.r - 1.0).abs() < 1e-6);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn distance_ignores_alpha() {
        let a = Rgba::new(0.5, 0.5, 0.5, 1.0);
        let b = Rgba::new(0.5, 0.5, 0.5, 0.0);
        assert_eq!(a.distance_sq_rgb(&b), 0.0);
    }

    #[test]
    fn classify_exact_palette_values() {
        for candidate in PaletteColor::ALL {
            let [r, g, b] = candidate.rgb();
            assert_eq!(
                PaletteColor::classify(Rgba::new(r, g, b, 1.0)),
                candidate,
                "exact palette value must classify as itself"
            );
        }
    }

    #[test]
    fn classify_noisy_red() {
        // A dark, slightly washed-out red as the camera would report it.
        let noisy = Rgba::new(0.7, 0.15, 0.1, 1.0);
        assert_eq!(PaletteColor::classify(noisy), PaletteColor::Red);
    }

    #[test]
    fn classify_tie_prefers_declaration_order() {
        // (1, 0, 0.5) is exactly equidistant from red (1,0,0) and purple
        // (0.5,0,0.5): both at squared distance 0.25.  Red is declared first
        // and must win.
        let tie = Rgba::new(1.0, 0.0, 0.5, 1.0);
        assert_eq!(PaletteColor::classify(tie), PaletteColor::Red);
    }

    #[test]
    fn classify_orange_vs_yellow() {
        let orange_ish = Rgba::new(0.9, 0.45, 0.05, 1.0);
        assert_eq!(PaletteColor::classify(orange_ish), PaletteColor::Orange);

        let yellow_ish = Rgba::new(0.9, 0.85, 0.1, 1.0);
        assert_eq!(PaletteColor::classify(yellow_ish), PaletteColor::Yellow);
    }

    #[test]
    fn palette_color_serialization_roundtrip() {
        let json = serde_json::to_string(&PaletteColor::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
        let back: PaletteColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PaletteColor::Purple);
    }

    #[test]
    fn display_matches_serde_casing() {
        for candidate in PaletteColor::ALL {
            let json = serde_json::to_string(&candidate).unwrap();
            assert_eq!(json, format!("\"{candidate}\""));
        }
    }
}
