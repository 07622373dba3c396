//! Encapsulated PostScript (Level 2) output.
//!
//! PostScript has no transparency: partially transparent shapes are painted
//! opaque, as other plotting tools do for this format.

use std::fmt::Write as _;

use plotters_backend::BackendColor;

use super::vector::{num, rgb, Dialect, TextFont, TextRun, VectorBackend};

/// Backend producing a single-page EPS document.
pub type PostScriptBackend<'a> = VectorBackend<'a, PostScript>;

impl<'a> VectorBackend<'a, PostScript> {
    /// A `size` pixel page at `dpi`, written into `target` on present.
    pub fn eps(target: &'a mut Vec<u8>, size: (u32, u32), dpi: f64) -> Self {
        VectorBackend::new(target, PostScript::default(), size, dpi)
    }
}

// Short operator names and Latin-1 re-encoded Helvetica.
const PROLOG: &str = "\
/m { moveto } bind def
/l { lineto } bind def
/c { curveto } bind def
/cp { closepath } bind def
/f { fill } bind def
/s { stroke } bind def
/rgb { setrgbcolor } bind def
/lw { setlinewidth } bind def
/sf { findfont exch scalefont setfont } bind def
/reencode {
  exch findfont dup length dict begin
  { 1 index /FID ne { def } { pop pop } ifelse } forall
  /Encoding ISOLatin1Encoding def
  currentdict end definefont pop
} bind def
/Helvetica /Helvetica-L1 reencode
/Helvetica-Bold /Helvetica-Bold-L1 reencode
";

/// PostScript operator spelling and graphics state tracking.
#[derive(Debug, Default)]
pub struct PostScript {
    color: Option<(u8, u8, u8)>,
    width: Option<f64>,
    translucent: bool,
}

impl PostScript {
    fn set_color(&mut self, out: &mut String, color: BackendColor) {
        if color.alpha < 1.0 && !self.translucent {
            self.translucent = true;
            log::debug!("EPS output paints translucent shapes opaque");
        }
        if self.color != Some(color.rgb) {
            let _ = writeln!(out, "{} rgb", rgb(color));
            self.color = Some(color.rgb);
        }
    }
}

impl Dialect for PostScript {
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
        out.push_str("cp\n");
    }

    fn fill(&mut self, out: &mut String) {
        out.push_str("f\n");
    }

    fn stroke(&mut self, out: &mut String) {
        out.push_str("s\n");
    }

    fn fill_color(&mut self, out: &mut String, color: BackendColor) {
        self.set_color(out, color);
    }

    fn stroke_style(&mut self, out: &mut String, color: BackendColor, width: f64) {
        self.set_color(out, color);
        if self.width != Some(width) {
            let _ = writeln!(out, "{} lw", num(width));
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
        self.set_color(out, font.color);
        let face = if font.bold {
            "/Helvetica-Bold-L1"
        } else {
            "/Helvetica-L1"
        };
        let _ = write!(out, "gsave {} {} translate", num(x), num(y));
        if angle != 0.0 {
            let _ = write!(out, " {} rotate", num(angle));
        }
        out.push_str(" 0 0 moveto\n");
        for run in runs {
            let (size, rise) = run.metrics(font.size);
            let _ = write!(out, "{} {face} sf ", num(size));
            if rise != 0.0 {
                let _ = write!(out, "0 {} rmoveto ({}) show 0 {} rmoveto", num(rise), run.literal, num(-rise));
            } else {
                let _ = write!(out, "({}) show", run.literal);
            }
            out.push('\n');
        }
        out.push_str("grestore\n");
    }

    fn finish(&mut self, body: &str, (w, h): (f64, f64)) -> Vec<u8> {
        let mut doc = String::with_capacity(body.len() + PROLOG.len() + 512);
        doc.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
        let _ = writeln!(doc, "%%Creator: rusty-violin {}", env!("CARGO_PKG_VERSION"));
        let _ = writeln!(doc, "%%BoundingBox: 0 0 {} {}", w.ceil() as i64, h.ceil() as i64);
        let _ = writeln!(doc, "%%HiResBoundingBox: 0 0 {} {}", num(w), num(h));
        doc.push_str("%%LanguageLevel: 2\n%%Pages: 1\n%%EndComments\n");
        doc.push_str("%%BeginProlog\n");
        doc.push_str(PROLOG);
        doc.push_str("%%EndProlog\n");
        doc.push_str("%%Page: 1 1\ngsave\n1 setlinejoin\n");
        doc.push_str(body);
        doc.push_str("grestore\nshowpage\n%%Trailer\n%%EOF\n");
        doc.into_bytes()
    }
}
