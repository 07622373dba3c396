use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::prelude::*;

use super::figure::{self, FigureStyle};
use super::pdf::PdfBackend;
use super::postscript::PostScriptBackend;
use super::ImageFormat;
use crate::error::{Error, Result};
use crate::state::FigureData;

// ---------------------------------------------------------------------------
// Export report
// ---------------------------------------------------------------------------

/// Result of writing one format.
#[derive(Debug)]
pub struct ExportOutcome {
    pub format: ImageFormat,
    pub path: PathBuf,
    pub result: Result<()>,
}

/// Per-format results of one export run, in request order.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportReport {
    /// Paths that were written successfully.
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.path.as_path())
    }

    /// Errors of the formats that failed.
    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// The first failure, if any.
    pub fn into_result(self) -> Result<()> {
        self.outcomes
            .into_iter()
            .find_map(|o| o.result.err())
            .map_or(Ok(()), Err)
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write `<basename>.<ext>` for each requested format.
///
/// A failing format is recorded in the report and the remaining formats are
/// still attempted. Repeated formats are written once.
pub fn export(
    fig: &FigureData,
    style: &FigureStyle,
    basename: &Path,
    formats: &[ImageFormat],
) -> ExportReport {
    let mut report = ExportReport::default();
    for &format in formats {
        if report.outcomes.iter().any(|o| o.format == format) {
            continue;
        }
        let path = output_path(basename, format);
        let result = render(fig, style, format)
            .and_then(|bytes| write_file(&path, &bytes).map_err(|e| e.to_string()))
            .map_err(|message| Error::OutputWrite {
                format,
                path: path.clone(),
                message,
            });

        match &result {
            Ok(()) => log::info!("Wrote {}", path.display()),
            Err(e) => log::warn!("{e}"),
        }
        report.outcomes.push(ExportOutcome {
            format,
            path,
            result,
        });
    }
    report
}

/// `basename` with the format's extension appended, keeping any dots
/// already in the name.
pub fn output_path(basename: &Path, format: ImageFormat) -> PathBuf {
    let mut name = OsString::from(basename.as_os_str());
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, bytes)
}

/// Render the figure into the bytes of one file format.
pub fn render(
    fig: &FigureData,
    style: &FigureStyle,
    format: ImageFormat,
) -> std::result::Result<Vec<u8>, String> {
    let size = (style.width_px, style.height_px);
    match format {
        ImageFormat::Png => render_png(fig, style),
        ImageFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                figure::draw(&root, fig, style).map_err(|e| e.to_string())?;
            }
            Ok(svg.into_bytes())
        }
        ImageFormat::Eps => {
            let mut buf = Vec::new();
            {
                let root = PostScriptBackend::eps(&mut buf, size, style.dpi).into_drawing_area();
                figure::draw(&root, fig, style).map_err(|e| e.to_string())?;
            }
            Ok(buf)
        }
        ImageFormat::Pdf => {
            let mut buf = Vec::new();
            {
                let root = PdfBackend::pdf(&mut buf, size, style.dpi).into_drawing_area();
                figure::draw(&root, fig, style).map_err(|e| e.to_string())?;
            }
            Ok(buf)
        }
    }
}

/// Rasterise into an RGB buffer pre-filled with `background`.
fn rasterize(
    fig: &FigureData,
    style: &FigureStyle,
    background: u8,
) -> std::result::Result<Vec<u8>, String> {
    let (w, h) = (style.width_px, style.height_px);
    let mut buf = vec![background; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        figure::draw(&root, fig, style).map_err(|e| e.to_string())?;
    }
    Ok(buf)
}

fn render_png(fig: &FigureData, style: &FigureStyle) -> std::result::Result<Vec<u8>, String> {
    let (w, h) = (style.width_px, style.height_px);
    let (pixels, color_type) = if style.transparent {
        let over_black = rasterize(fig, style, 0)?;
        let over_white = rasterize(fig, style, 255)?;
        (unmatte(&over_black, &over_white), ExtendedColorType::Rgba8)
    } else {
        (rasterize(fig, style, 255)?, ExtendedColorType::Rgb8)
    };

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, w, h, color_type)
        .map_err(|e| e.to_string())?;
    Ok(png)
}

/// Recover RGBA from two renders over black and over white.
///
/// A pixel of colour `c` and opacity `a` shows as `a*c` over black and
/// `a*c + (1 - a)` over white, so `a = 1 - (white - black)` and
/// `c = black / a`. Computed in 8-bit integers so the result composites
/// back onto either render exactly.
pub fn unmatte(over_black: &[u8], over_white: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(over_black.len() / 3 * 4);
    for (b, w) in over_black.chunks_exact(3).zip(over_white.chunks_exact(3)) {
        let spread: u32 = (0..3).map(|i| u32::from(w[i].saturating_sub(b[i]))).sum();
        let alpha = 255 - ((spread + 1) / 3).min(255);
        if alpha == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        for &c in b {
            out.push(((u32::from(c) * 255 + alpha / 2) / alpha).min(255) as u8);
        }
        out.push(alpha as u8);
    }
    out
}
