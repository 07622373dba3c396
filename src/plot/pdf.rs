//! Single-page PDF 1.4 output.
//!
//! The content stream is written uncompressed. Text uses the standard
//! Helvetica fonts with WinAnsi encoding, so no font program is embedded.
//! Translucency is expressed with one `ExtGState` per distinct alpha.

use std::fmt::Write as _;

use plotters_backend::BackendColor;

use super::vector::{num, rgb, Dialect, TextFont, TextRun, VectorBackend};

/// Backend producing a single-page PDF document.
pub type PdfBackend<'a> = VectorBackend<'a, Pdf>;

impl<'a> VectorBackend<'a, Pdf> {
    /// A `size` pixel page at `dpi`, written into `target` on present.
    pub fn pdf(target: &'a mut Vec<u8>, size: (u32, u32), dpi: f64) -> Self {
        VectorBackend::new(target, Pdf::default(), size, dpi)
    }
}

/// Alpha in thousandths, the key of a graphics state.
type AlphaKey = u16;

const OPAQUE: AlphaKey = 1000;

/// PDF operator spelling and graphics state tracking.
#[derive(Debug, Default)]
pub struct Pdf {
    fill: Option<(u8, u8, u8)>,
    stroke: Option<(u8, u8, u8)>,
    width: Option<f64>,
    alpha: Option<AlphaKey>,
    /// Alpha of each `/GSn` state, indexed by `n`.
    states: Vec<AlphaKey>,
}

impl Pdf {
    fn set_alpha(&mut self, out: &mut String, alpha: f64) {
        let key = (alpha.clamp(0.0, 1.0) * 1000.0).round() as AlphaKey;
        if self.alpha.unwrap_or(OPAQUE) == key {
            return;
        }
        let index = match self.states.iter().position(|&k| k == key) {
            Some(i) => i,
            None => {
                self.states.push(key);
                self.states.len() - 1
            }
        };
        let _ = writeln!(out, "/GS{index} gs");
        self.alpha = Some(key);
    }

    fn set_fill(&mut self, out: &mut String, color: BackendColor) {
        self.set_alpha(out, color.alpha);
        if self.fill != Some(color.rgb) {
            let _ = writeln!(out, "{} rg", rgb(color));
            self.fill = Some(color.rgb);
        }
    }

    fn resources(&self) -> String {
        let mut res = String::from("<< /Font << /F1 5 0 R /F2 6 0 R >>");
        if !self.states.is_empty() {
            res.push_str(" /ExtGState <<");
            for (i, &key) in self.states.iter().enumerate() {
                let a = num(f64::from(key) / 1000.0);
                let _ = write!(res, " /GS{i} << /Type /ExtGState /ca {a} /CA {a} >>");
            }
            res.push_str(" >>");
        }
        res.push_str(" >>");
        res
    }
}

impl Dialect for Pdf {
    fn move_to(&mut self, out: &mut String, (x, y): (f64, f64)) {
        let _ = writeln!(out, "{} {} m", num(x), num(y));
    }

    fn line_to(&mut self, out: &mut String, (x, y): (f64, f64)) {
        let _ = writeln!(out, "{} {} l", num(x), num(y));
    }

    fn curve_to(&mut self, out: &mut String, c1: (f64, f64), c2: (f64, f64), p: (f64, f64)) {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} c",
            num(c1.0),
            num(c1.1),
            num(c2.0),
            num(c2.1),
            num(p.0),
            num(p.1)
        );
    }

    fn close_path(&mut self, out: &mut String) {
        out.push_str("h\n");
    }

    fn fill(&mut self, out: &mut String) {
        out.push_str("f\n");
    }

    fn stroke(&mut self, out: &mut String) {
        out.push_str("S\n");
    }

    fn fill_color(&mut self, out: &mut String, color: BackendColor) {
        self.set_fill(out, color);
    }

    fn stroke_style(&mut self, out: &mut String, color: BackendColor, width: f64) {
        self.set_alpha(out, color.alpha);
        if self.stroke != Some(color.rgb) {
            let _ = writeln!(out, "{} RG", rgb(color));
            self.stroke = Some(color.rgb);
        }
        if self.width != Some(width) {
            let _ = writeln!(out, "{} w", num(width));
            self.width = Some(width);
        }
    }

    fn text(
        &mut self,
        out: &mut String,
        runs: &[TextRun],
        (x, y): (f64, f64),
        angle: f64,
        font: &TextFont,
    ) {
        self.set_fill(out, font.color);
        let face = if font.bold { "/F2" } else { "/F1" };
        let (sin, cos) = angle.to_radians().sin_cos();
        out.push_str("BT\n");
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} Tm",
            num(cos),
            num(sin),
            num(-sin),
            num(cos),
            num(x),
            num(y)
        );
        for run in runs {
            let (size, rise) = run.metrics(font.size);
            let _ = writeln!(out, "{face} {} Tf {} Ts ({}) Tj", num(size), num(rise), run.literal);
        }
        out.push_str("ET\n");
    }

    fn finish(&mut self, body: &str, (w, h): (f64, f64)) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents 4 0 R >>",
                num(w),
                num(h),
                self.resources()
            ),
            format!("<< /Length {} >>\nstream\n{body}endstream", body.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!("<< /Producer (rusty-violin {}) >>", env!("CARGO_PKG_VERSION")),
        ];

        let mut doc: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, object) in objects.iter().enumerate() {
            offsets.push(doc.len());
            doc.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", i + 1).as_bytes());
        }

        let xref_at = doc.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 7 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        );
        doc.extend_from_slice(xref.as_bytes());
        doc
    }
}

#[cfg(test)]
mod tests {
    use plotters::coord::Shift;
    use plotters::prelude::*;

    use super::*;
    use crate::plot::fonts::{self, FAMILY};

    fn render(draw: impl FnOnce(&DrawingArea<PdfBackend<'_>, Shift>)) -> Vec<u8> {
        fonts::ensure_registered();
        let mut buf = Vec::new();
        {
            let root = PdfBackend::pdf(&mut buf, (600, 1200), 300.0).into_drawing_area();
            draw(&root);
            root.present().unwrap();
        }
        buf
    }

    fn text(doc: &[u8]) -> String {
        String::from_utf8_lossy(doc).into_owned()
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let doc = render(|root| {
            root.draw(&Circle::new((300, 300), 20, BLACK.filled())).unwrap();
        });
        let s = text(&doc);
        assert!(doc.starts_with(b"%PDF-1.4\n"));
        assert!(s.contains("/MediaBox [0 0 144 288]"));

        let start = s.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_at: usize = s[start..].lines().next().unwrap().parse().unwrap();
        assert_eq!(&doc[xref_at..xref_at + 4], b"xref");

        let table = text(&doc[xref_at..]);
        for (n, line) in table.lines().skip(3).take(7).enumerate() {
            let offset: usize = line[..10].parse().unwrap();
            let expected = format!("{} 0 obj", n + 1);
            assert_eq!(&doc[offset..offset + expected.len()], expected.as_bytes());
        }
    }

    #[test]
    fn content_length_matches_stream() {
        let doc = render(|root| {
            root.draw(&Rectangle::new([(10, 10), (20, 20)], RED.filled()))
                .unwrap();
        });
        let s = text(&doc);
        let len_at = s.find("/Length ").unwrap() + "/Length ".len();
        let len: usize = s[len_at..].split_whitespace().next().unwrap().parse().unwrap();
        let data_at = s.find("stream\n").unwrap() + "stream\n".len();
        assert_eq!(&s[data_at + len..data_at + len + "endstream".len()], "endstream");
        assert!(s.contains("1 0 0 rg\n"));
    }

    #[test]
    fn translucent_fill_gets_graphics_state() {
        let s = text(&render(|root| {
            root.draw(&Circle::new((300, 300), 20, BLUE.mix(0.5).filled()))
                .unwrap();
            root.draw(&Circle::new((100, 300), 20, BLUE.filled())).unwrap();
        }));
        assert!(s.contains("/GS0 gs\n"));
        assert!(s.contains("/GS1 gs\n"));
        assert!(s.contains("/GS0 << /Type /ExtGState /ca 0.5 /CA 0.5 >>"));
        assert!(s.contains("/GS1 << /Type /ExtGState /ca 1 /CA 1 >>"));
    }

    #[test]
    fn text_is_set_in_helvetica() {
        let s = text(&render(|root| {
            let style = TextStyle::from((FAMILY, 40.0).into_font());
            root.draw_text("Species (n)", &style, (100, 100)).unwrap();
        }));
        assert!(s.contains("BT\n1 0 0 1 24 "));
        assert!(s.contains("(Species \\(n\\)) Tj"));
        assert!(s.contains("/BaseFont /Helvetica "));
    }
}
