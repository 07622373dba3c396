use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            RGBColor(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// Parse a `#rrggbb` (or `#rgb`) hex code.
pub fn parse_hex(hex: &str) -> Result<RGBColor> {
    let rgb = Srgb::<u8>::from_str(hex.trim())
        .map_err(|e| Error::InvalidArgument(format!("invalid colour '{hex}': {e}")))?;
    Ok(RGBColor(rgb.red, rgb.green, rgb.blue))
}

/// Format a colour as `#rrggbb`.
pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02X}{:02X}{:02X}", color.0, color.1, color.2)
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Scatter marker shapes, assigned by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Diamond,
    Triangle,
}

impl Marker {
    pub const CYCLE: [Marker; 4] = [
        Marker::Circle,
        Marker::Square,
        Marker::Diamond,
        Marker::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Marker::Circle => "circle",
            Marker::Square => "square",
            Marker::Diamond => "diamond",
            Marker::Triangle => "triangle",
        }
    }
}

// ---------------------------------------------------------------------------
// Position → colour/marker mapping
// ---------------------------------------------------------------------------

/// Colours and marker for one violin position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    pub body: RGBColor,
    pub points: RGBColor,
    pub marker: Marker,
}

/// Assigns body colour, point colour and marker to each display position.
///
/// Positions past the end of a configured palette fall back to generated
/// hues so that every group is still distinguishable.
#[derive(Debug, Clone)]
pub struct ColorMap {
    body: Vec<RGBColor>,
    points: Vec<RGBColor>,
}

impl ColorMap {
    /// Build a colour map from hex codes, extended to cover `positions`.
    pub fn new(body_hex: &[String], points_hex: &[String], positions: usize) -> Result<Self> {
        let parse_all = |codes: &[String]| -> Result<Vec<RGBColor>> {
            codes.iter().map(|c| parse_hex(c)).collect()
        };
        let mut body = parse_all(body_hex)?;
        let mut points = parse_all(points_hex)?;

        let fallback = generate_palette(positions);
        for colors in [&mut body, &mut points] {
            while colors.len() < positions {
                colors.push(fallback[colors.len()]);
            }
        }

        Ok(ColorMap { body, points })
    }

    /// Look up the style of a display position (0-based).
    pub fn style_for(&self, position: usize) -> SeriesStyle {
        SeriesStyle {
            body: self.body[position % self.body.len().max(1)],
            points: self.points[position % self.points.len().max(1)],
            marker: Marker::CYCLE[position % Marker::CYCLE.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexes(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(parse_hex("#B9DC3D").unwrap(), RGBColor(0xB9, 0xDC, 0x3D));
        assert_eq!(parse_hex("3b568a").unwrap(), RGBColor(0x3B, 0x56, 0x8A));
        assert!(matches!(parse_hex("#12"), Err(Error::InvalidArgument(_))));
        assert_eq!(to_hex(RGBColor(0x45, 0x39, 0x7F)), "#45397F");
    }

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let palette = generate_palette(6);
        assert_eq!(palette.len(), 6);
        for i in 0..6 {
            for j in i + 1..6 {
                assert_ne!(palette[i], palette[j]);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn configured_colours_come_first_then_fallback() {
        let map = ColorMap::new(&hexes(&["#000000"]), &hexes(&["#FFFFFF"]), 3).unwrap();
        assert_eq!(map.style_for(0).body, RGBColor(0, 0, 0));
        assert_eq!(map.style_for(0).points, RGBColor(255, 255, 255));
        assert_eq!(map.style_for(2).body, generate_palette(3)[2]);
        assert_eq!(map.style_for(2).marker, Marker::Diamond);
    }

    #[test]
    fn markers_cycle_by_position() {
        let map = ColorMap::new(&[], &[], 5).unwrap();
        assert_eq!(map.style_for(3).marker, Marker::Triangle);
        assert_eq!(map.style_for(4).marker, Marker::Circle);
    }

    #[test]
    fn bad_colour_is_rejected() {
        assert!(ColorMap::new(&hexes(&["#zzzzzz"]), &[], 1).is_err());
    }
}
