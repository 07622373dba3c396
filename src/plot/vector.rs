//! Shared plumbing for the PostScript and PDF backends.
//!
//! Both formats describe a page with nearly the same path and text model,
//! so one [`DrawingBackend`] implementation drives both. Each format only
//! supplies a [`Dialect`] that spells the operators and wraps the page body
//! into a complete document.

use std::fmt::Write as _;

use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
    DrawingErrorKind, FontStyle, FontTransform,
};

/// Points per inch.
const PT_PER_IN: f64 = 72.0;

/// Cubic Bézier control distance for a quarter circle.
const KAPPA: f64 = 0.552_284_75;

/// Superscript size relative to the surrounding text.
const SUPERSCRIPT_SCALE: f64 = 0.7;

/// Superscript baseline shift, in ems of the surrounding text.
const SUPERSCRIPT_RISE: f64 = 0.4;

// ---------------------------------------------------------------------------
// Dialect: how a format spells each drawing operation
// ---------------------------------------------------------------------------

/// Operators of one page description language. Coordinates are in points
/// with the origin at the bottom-left corner of the page.
pub trait Dialect {
    fn move_to(&mut self, out: &mut String, p: (f64, f64));
    fn line_to(&mut self, out: &mut String, p: (f64, f64));
    fn curve_to(&mut self, out: &mut String, c1: (f64, f64), c2: (f64, f64), p: (f64, f64));
    fn close_path(&mut self, out: &mut String);
    fn fill(&mut self, out: &mut String);
    fn stroke(&mut self, out: &mut String);

    fn fill_color(&mut self, out: &mut String, color: BackendColor);
    fn stroke_style(&mut self, out: &mut String, color: BackendColor, width: f64);

    /// Draw text runs with their baseline starting at `origin`, rotated
    /// counter-clockwise by `angle` degrees.
    fn text(&mut self, out: &mut String, runs: &[TextRun], origin: (f64, f64), angle: f64, font: &TextFont);

    /// Wrap the page body into a complete document.
    fn finish(&mut self, body: &str, page: (f64, f64)) -> Vec<u8>;
}

/// Font selection for one text item.
#[derive(Clone, Copy)]
pub struct TextFont {
    pub size: f64,
    pub bold: bool,
    pub color: BackendColor,
}

/// A piece of text at a single size and baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Already escaped for a `( ... )` string literal.
    pub literal: String,
    pub superscript: bool,
}

impl TextRun {
    /// Size and baseline rise of this run, for text of `size`.
    pub fn metrics(&self, size: f64) -> (f64, f64) {
        if self.superscript {
            (size * SUPERSCRIPT_SCALE, size * SUPERSCRIPT_RISE)
        } else {
            (size, 0.0)
        }
    }
}

/// Split `text` into normal and superscript runs and escape each for a
/// Latin-1 string literal. Characters outside Latin-1 become `?`.
pub(crate) fn text_runs(text: &str) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    for c in text.chars() {
        let (c, superscript) = match superscript_base(c) {
            Some(base) => (base, true),
            None => (c, false),
        };
        if runs.last().map_or(true, |r| r.superscript != superscript) {
            runs.push(TextRun {
                literal: String::new(),
                superscript,
            });
        }
        if let Some(run) = runs.last_mut() {
            escape_char(&mut run.literal, c);
        }
    }
    runs
}

/// Number of characters in `text` that [`text_runs`] replaces with `?`.
pub(crate) fn unrepresentable(text: &str) -> usize {
    text.chars()
        .filter(|&c| superscript_base(c).is_none() && !is_latin1_printable(c))
        .count()
}

fn is_latin1_printable(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}')
}

fn superscript_base(c: char) -> Option<char> {
    Some(match c {
        '\u{2070}' => '0',
        '\u{b9}' => '1',
        '\u{b2}' => '2',
        '\u{b3}' => '3',
        '\u{2074}'..='\u{2079}' => char::from_digit(c as u32 - 0x2070, 10)?,
        '\u{207a}' => '+',
        '\u{207b}' => '-',
        _ => return None,
    })
}

fn escape_char(out: &mut String, c: char) {
    match c {
        '\\' | '(' | ')' => {
            out.push('\\');
            out.push(c);
        }
        _ if !is_latin1_printable(c) => out.push('?'),
        ' '..='~' => out.push(c),
        _ => {
            let _ = write!(out, "\\{:03o}", c as u32);
        }
    }
}

/// Format a coordinate compactly: at most three decimals, no trailing zeros.
pub(crate) fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        _ => s.to_string(),
    }
}

/// RGB components in `[0, 1]`.
pub(crate) fn rgb(color: BackendColor) -> String {
    let (r, g, b) = color.rgb;
    let c = |v: u8| num(f64::from(v) / 255.0);
    format!("{} {} {}", c(r), c(g), c(b))
}

// ---------------------------------------------------------------------------
// The backend
// ---------------------------------------------------------------------------

/// A page-description backend writing the finished document into `target`
/// when presented.
pub struct VectorBackend<'a, D: Dialect> {
    target: &'a mut Vec<u8>,
    dialect: D,
    size: (u32, u32),
    /// Points per pixel.
    scale: f64,
    body: String,
    saved: bool,
}

impl<'a, D: Dialect> VectorBackend<'a, D> {
    pub(crate) fn new(target: &'a mut Vec<u8>, dialect: D, size: (u32, u32), dpi: f64) -> Self {
        Self {
            target,
            dialect,
            size,
            scale: PT_PER_IN / dpi,
            body: String::new(),
            saved: false,
        }
    }

    /// Page size in points.
    pub fn page_size(&self) -> (f64, f64) {
        (
            f64::from(self.size.0) * self.scale,
            f64::from(self.size.1) * self.scale,
        )
    }

    fn point(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (x * self.scale, (f64::from(self.size.1) - y) * self.scale)
    }

    fn coord(&self, (x, y): BackendCoord) -> (f64, f64) {
        self.point((f64::from(x), f64::from(y)))
    }

    fn path(&mut self, points: &[(f64, f64)], close: bool) {
        let Some((&first, rest)) = points.split_first() else {
            return;
        };
        let first = self.point(first);
        self.dialect.move_to(&mut self.body, first);
        for &p in rest {
            let p = self.point(p);
            self.dialect.line_to(&mut self.body, p);
        }
        if close {
            self.dialect.close_path(&mut self.body);
        }
    }

    /// Select colour and line width; must precede the path.
    fn set_style<S: BackendStyle>(&mut self, style: &S, fill: bool) {
        let color = style.color();
        if fill {
            self.dialect.fill_color(&mut self.body, color);
        } else {
            let width = f64::from(style.stroke_width()) * self.scale;
            self.dialect.stroke_style(&mut self.body, color, width);
        }
    }

    fn paint(&mut self, fill: bool) {
        if fill {
            self.dialect.fill(&mut self.body);
        } else {
            self.dialect.stroke(&mut self.body);
        }
    }
}

impl<D: Dialect> DrawingBackend for VectorBackend<'_, D> {
    type ErrorType = std::io::Error;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<std::io::Error>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if !self.saved {
            let page = self.page_size();
            let document = self.dialect.finish(&self.body, page);
            self.target.clear();
            self.target.extend_from_slice(&document);
            self.saved = true;
        }
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        self.draw_rect(point, (point.0 + 1, point.1 + 1), &color, true)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        self.draw_path([from, to], style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0.0 {
            return Ok(());
        }
        let (x0, y0) = (f64::from(upper_left.0), f64::from(upper_left.1));
        let (x1, y1) = (f64::from(bottom_right.0), f64::from(bottom_right.1));
        self.set_style(style, fill);
        self.path(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)], true);
        self.paint(fill);
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0.0 {
            return Ok(());
        }
        let points: Vec<(f64, f64)> = path
            .into_iter()
            .map(|(x, y)| (f64::from(x), f64::from(y)))
            .collect();
        if points.len() < 2 {
            return Ok(());
        }
        self.set_style(style, false);
        self.path(&points, false);
        self.paint(false);
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0.0 {
            return Ok(());
        }
        self.set_style(style, fill);
        let (cx, cy) = self.coord(center);
        let r = f64::from(radius) * self.scale;
        let k = r * KAPPA;
        let out = &mut self.body;
        let d = &mut self.dialect;
        d.move_to(out, (cx + r, cy));
        d.curve_to(out, (cx + r, cy + k), (cx + k, cy + r), (cx, cy + r));
        d.curve_to(out, (cx - k, cy + r), (cx - r, cy + k), (cx - r, cy));
        d.curve_to(out, (cx - r, cy - k), (cx - k, cy - r), (cx, cy - r));
        d.curve_to(out, (cx + k, cy - r), (cx + r, cy - k), (cx + r, cy));
        d.close_path(out);
        self.paint(fill);
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0.0 {
            return Ok(());
        }
        let points: Vec<(f64, f64)> = vert
            .into_iter()
            .map(|(x, y)| (f64::from(x), f64::from(y)))
            .collect();
        if points.len() < 3 {
            return Ok(());
        }
        self.set_style(style, true);
        self.path(&points, true);
        self.paint(true);
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        let color = style.color();
        if color.alpha == 0.0 || text.is_empty() {
            return Ok(());
        }

        let ((min_x, _), (max_x, _)) = style
            .layout_box(text)
            .map_err(|e| DrawingErrorKind::FontError(Box::new(e)))?;
        let width = f64::from(max_x - min_x);
        let em = style.size() / 1.24;

        // Offset from the anchor to the baseline start, in unrotated pixels.
        let dx = match style.anchor().h_pos {
            HPos::Left => 0.0,
            HPos::Center => -width / 2.0,
            HPos::Right => -width,
        };
        let dy = match style.anchor().v_pos {
            VPos::Top => 0.76 * em,
            VPos::Center => 0.25 * em,
            VPos::Bottom => -0.25 * em,
        };
        let transform = style.transform();
        let (rx, ry) = rotate(&transform, dx, dy);
        let origin = self.point((f64::from(pos.0) + rx, f64::from(pos.1) + ry));
        let angle = match transform {
            FontTransform::None => 0.0,
            FontTransform::Rotate90 => -90.0,
            FontTransform::Rotate180 => 180.0,
            FontTransform::Rotate270 => 90.0,
        };

        let font = TextFont {
            size: em * self.scale,
            bold: matches!(style.style(), FontStyle::Bold),
            color,
        };
        let lost = unrepresentable(text);
        if lost > 0 {
            log::warn!("{lost} character(s) of {text:?} have no Latin-1 form and print as '?'");
        }
        let runs = text_runs(text);
        self.dialect.text(&mut self.body, &runs, origin, angle, &font);
        Ok(())
    }
}

/// Rotate a pixel-space offset the way plotters rotates glyphs.
fn rotate(transform: &FontTransform, x: f64, y: f64) -> (f64, f64) {
    match transform {
        FontTransform::None => (x, y),
        FontTransform::Rotate90 => (-y, x),
        FontTransform::Rotate180 => (-x, -y),
        FontTransform::Rotate270 => (y, -x),
    }
}

impl<D: Dialect> Drop for VectorBackend<'_, D> {
    fn drop(&mut self) {
        if !self.saved {
            // drop cannot report errors
            let _ = self.present();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superscripts_split_into_runs() {
        let runs = text_runs("W kg\u{207b}\u{b9}");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].literal, "W kg");
        assert!(!runs[0].superscript);
        assert_eq!(runs[1].literal, "-1");
        assert!(runs[1].superscript);
    }

    #[test]
    fn literals_are_escaped() {
        let runs = text_runs("a(b)\\c \u{e9} \u{4e2d}");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].literal, "a\\(b\\)\\\\c \\351 ?");
    }

    #[test]
    fn substituted_characters_are_counted() {
        assert_eq!(unrepresentable("Peak Power (W kg\u{207b}\u{b9})"), 0);
        assert_eq!(unrepresentable("caf\u{e9}"), 0);
        assert_eq!(unrepresentable("\u{4e2d}\u{6587} \u{2192} x"), 3);
        assert_eq!(unrepresentable("tab\there"), 1);
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(1.0), "1");
        assert_eq!(num(0.12345), "0.123");
        assert_eq!(num(-0.0001), "0");
        assert_eq!(num(144.5), "144.5");
    }

    #[test]
    fn colors_are_unit_scaled() {
        let c = BackendColor {
            alpha: 1.0,
            rgb: (255, 0, 51),
        };
        assert_eq!(rgb(c), "1 0 0.2");
    }
}
