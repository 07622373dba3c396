//! Bundled fonts for text layout and raster rendering.
//!
//! plotters' `ab_glyph` text support only knows fonts registered at run
//! time, so DejaVu Sans (regular and bold) is compiled into the binary and
//! registered under the `sans-serif` family.

use std::sync::Once;

use plotters::style::{register_font, FontStyle};

/// Family name used by every text style of the figure.
pub const FAMILY: &str = "sans-serif";

static REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

static REGISTER: Once = Once::new();

/// Register the bundled fonts. Safe to call any number of times.
pub fn ensure_registered() {
    REGISTER.call_once(|| {
        for (style, bytes) in [(FontStyle::Normal, REGULAR), (FontStyle::Bold, BOLD)] {
            if register_font(FAMILY, style, bytes).is_err() {
                log::error!("Bundled {} font could not be parsed", style.as_str());
            }
        }
    });
}
