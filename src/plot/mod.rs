//! Figure rendering and export.
//!
//! ```text
//!  FigureData ──► figure::draw<DB>  (one routine, any plotters backend)
//!                     │
//!       ┌─────────────┼──────────────┬───────────────┐
//!       ▼             ▼              ▼               ▼
//!  BitMapBackend  SVGBackend   PostScriptBackend  PdfBackend
//!   (png, RGBA)                 (crate-local)     (crate-local)
//! ```
//!
//! All backends draw in a pixel grid of `width_in * dpi` by
//! `height_in * dpi`; the vector backends scale it back to points.

pub mod export;
pub mod figure;
pub mod fonts;
pub mod pdf;
pub mod postscript;
pub mod ticks;
mod vector;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use export::export;
pub use figure::FigureStyle;

/// Supported output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Eps,
    Png,
    Pdf,
    Svg,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 4] = [
        ImageFormat::Eps,
        ImageFormat::Png,
        ImageFormat::Pdf,
        ImageFormat::Svg,
    ];

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Eps => "eps",
            ImageFormat::Png => "png",
            ImageFormat::Pdf => "pdf",
            ImageFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        ImageFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unsupported image format '{s}', expected eps, png, pdf or svg"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_format_names() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!(".svg".parse::<ImageFormat>().unwrap(), ImageFormat::Svg);
        assert!(matches!(
            "tiff".parse::<ImageFormat>(),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(ImageFormat::Eps.to_string(), "eps");
    }
}
