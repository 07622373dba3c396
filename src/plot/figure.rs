use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::fonts::{self, FAMILY};
use super::ticks::{format_tick, nice_ticks};
use crate::color::{parse_hex, Marker, SeriesStyle};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::{FigureData, ViolinSeries};

/// Points per inch.
const PT_PER_IN: f64 = 72.0;

/// plotters sizes fonts by line height; the em is `size / 1.24`.
const EM_TO_FONT_SIZE: f64 = 1.24;

// ---------------------------------------------------------------------------
// Resolved figure style
// ---------------------------------------------------------------------------

/// Figure settings resolved to the pixel grid of one render.
#[derive(Debug, Clone)]
pub struct FigureStyle {
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: f64,
    pub transparent: bool,

    pub tick_font_pt: f64,
    pub label_font_pt: f64,
    pub margin_pt: f64,

    /// Half of the widest violin, in category units.
    pub violin_half_width: f64,
    pub body_alpha: f64,
    pub edge_color: RGBColor,
    pub show_means: bool,
    pub show_medians: bool,
    pub show_extrema: bool,

    /// Marker area in points².
    pub marker_area_pt2: f64,
    pub point_alpha: f64,

    pub x_label: String,
    pub y_label: String,
    pub x_bins: usize,
    pub hide_first_x_label: bool,
}

impl FigureStyle {
    pub fn from_config(config: &Config) -> Result<Self> {
        let fig = &config.figure;
        let dpi = f64::from(fig.dpi);
        let to_px = |inches: f64| (inches * dpi).round();
        let (w, h) = (to_px(fig.width_in), to_px(fig.height_in));
        if !(w >= 1.0 && h >= 1.0 && w <= f64::from(u16::MAX) && h <= f64::from(u16::MAX)) {
            return Err(Error::InvalidArgument(format!(
                "figure of {}x{} in at {} dpi is not drawable",
                fig.width_in, fig.height_in, fig.dpi
            )));
        }

        Ok(Self {
            width_px: w as u32,
            height_px: h as u32,
            dpi,
            transparent: config.output.transparent,
            tick_font_pt: fig.tick_size_pt,
            label_font_pt: fig.label_size_pt,
            margin_pt: fig.margin_pt,
            violin_half_width: config.violin.width / 2.0,
            body_alpha: config.violin.alpha.clamp(0.0, 1.0),
            edge_color: parse_hex(&config.violin.edge_color)?,
            show_means: config.violin.show_means,
            show_medians: config.violin.show_medians,
            show_extrema: config.violin.show_extrema,
            marker_area_pt2: config.scatter.marker_area_pt2.max(0.0),
            point_alpha: config.scatter.alpha.clamp(0.0, 1.0),
            x_label: config.axes.x_label.clone(),
            y_label: config.axes.y_label.clone(),
            x_bins: config.axes.x_bins,
            hide_first_x_label: config.axes.hide_first_x_label,
        })
    }

    /// Convert points to pixels.
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi / PT_PER_IN
    }

    fn px_i32(&self, points: f64) -> i32 {
        self.px(points).round().max(1.0) as i32
    }

    fn stroke(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }

    /// Font of `points` em size.
    fn font(&self, points: f64, style: FontStyle) -> TextStyle<'static> {
        TextStyle::from((FAMILY, self.px(points) * EM_TO_FONT_SIZE, style).into_font())
    }

    fn marker_radius(&self) -> i32 {
        (self.px(self.marker_area_pt2.sqrt()) / 2.0).round().max(1.0) as i32
    }
}

// Matplotlib's rc defaults, in points.
const AXIS_WIDTH_PT: f64 = 0.8;
const TICK_LENGTH_PT: f64 = 3.5;
const LABEL_PAD_PT: f64 = 4.0;
const EDGE_WIDTH_PT: f64 = 1.0;
const PART_WIDTH_PT: f64 = 1.5;

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Draw the whole figure on `root`.
pub fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &FigureData,
    style: &FigureStyle,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    fonts::ensure_registered();

    if !style.transparent {
        root.fill(&WHITE)?;
    }

    let tick_font = style.font(style.tick_font_pt, FontStyle::Normal);
    let label_font = style.font(style.label_font_pt, FontStyle::Bold);
    let tick_len = style.px_i32(TICK_LENGTH_PT);
    let pad = style.px_i32(LABEL_PAD_PT);
    let margin = style.px_i32(style.margin_pt);

    // Space for tick labels and axis titles, measured with the real fonts.
    let mut max_y_tick_w = 0;
    for s in &fig.series {
        max_y_tick_w = max_y_tick_w.max(root.estimate_text_size(&s.label, &tick_font)?.0);
    }
    let (y_title_w, _) = root.estimate_text_size(&style.y_label, &label_font)?;
    let (_, tick_h) = root.estimate_text_size("0", &tick_font)?;
    let (_, x_title_h) = root.estimate_text_size(&style.x_label, &label_font)?;

    let y_area = 2 * tick_len + max_y_tick_w as i32 + pad + y_title_w as i32;
    let x_area = 2 * tick_len + tick_h as i32 + pad + x_title_h as i32;

    let (x_lo, x_hi) = fig.x_range;
    let (y_lo, y_hi) = fig.y_range();

    let mut chart = ChartBuilder::on(root)
        .margin_top(margin)
        .margin_right(margin + style.px_i32(style.tick_font_pt))
        .margin_left(margin)
        .margin_bottom(margin)
        .x_label_area_size(x_area)
        .y_label_area_size(y_area)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    // Axes, ticks and labels are drawn on the root in backend pixels.
    let axis = BLACK.stroke_width(style.stroke(AXIS_WIDTH_PT));
    let (left, bottom) = chart.backend_coord(&(x_lo, y_lo));
    let (right, top) = chart.backend_coord(&(x_hi, y_hi));
    root.draw(&PathElement::new(vec![(left, top), (left, bottom)], axis))?;
    root.draw(&PathElement::new(vec![(left, bottom), (right, bottom)], axis))?;

    let x_tick_font = tick_font.pos(Pos::new(HPos::Center, VPos::Top));
    for (i, tick) in nice_ticks(x_lo, x_hi, style.x_bins).into_iter().enumerate() {
        let (px, _) = chart.backend_coord(&(tick, y_lo));
        root.draw(&PathElement::new(vec![(px, bottom), (px, bottom + tick_len)], axis))?;
        if i == 0 && style.hide_first_x_label {
            continue;
        }
        root.draw_text(&format_tick(tick), &x_tick_font, (px, bottom + 2 * tick_len))?;
    }

    let y_tick_font = tick_font.pos(Pos::new(HPos::Right, VPos::Center));
    for s in &fig.series {
        let (_, py) = chart.backend_coord(&(x_lo, s.position));
        root.draw(&PathElement::new(vec![(left - tick_len, py), (left, py)], axis))?;
        root.draw_text(&s.label, &y_tick_font, (left - 2 * tick_len, py))?;
    }

    root.draw_text(
        &style.x_label,
        &label_font.pos(Pos::new(HPos::Center, VPos::Top)),
        ((left + right) / 2, bottom + 2 * tick_len + tick_h as i32 + pad),
    )?;
    // Horizontal category title, left of the tick labels.
    root.draw_text(
        &style.y_label,
        &label_font.pos(Pos::new(HPos::Left, VPos::Center)),
        (margin, (top + bottom) / 2),
    )?;

    // Points go beneath the violins.
    for series in &fig.series {
        draw_points(&mut chart, fig, series, style)?;
    }
    for series in &fig.series {
        draw_violin(&mut chart, series, style)?;
    }

    root.present()?;
    Ok(())
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_points<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    fig: &FigureData,
    series: &ViolinSeries,
    style: &FigureStyle,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let SeriesStyle { points, marker, .. } = series.style;
    let fill = points.mix(style.point_alpha).filled();
    let r = style.marker_radius();
    let coords = series
        .values
        .iter()
        .zip(&series.jittered)
        .filter(|(v, y)| fig.in_range(**v) && y.is_finite())
        .map(|(&v, &y)| (v, y));

    match marker {
        Marker::Circle => {
            chart.draw_series(coords.map(|c| Circle::new(c, r, fill)))?;
        }
        Marker::Square => {
            // Same area as the circle, as with matplotlib's `s`.
            let h = (f64::from(r) * 0.886).round().max(1.0) as i32;
            chart.draw_series(
                coords.map(|c| EmptyElement::at(c) + Rectangle::new([(-h, -h), (h, h)], fill)),
            )?;
        }
        Marker::Diamond => {
            chart.draw_series(coords.map(|c| {
                EmptyElement::at(c) + Polygon::new(vec![(0, -r), (r, 0), (0, r), (-r, 0)], fill)
            }))?;
        }
        Marker::Triangle => {
            let half = (f64::from(r) * 0.866).round() as i32;
            let base = r / 2;
            chart.draw_series(coords.map(|c| {
                EmptyElement::at(c)
                    + Polygon::new(vec![(0, -r), (half, base), (-half, base)], fill)
            }))?;
        }
    }
    Ok(())
}

fn draw_violin<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    series: &ViolinSeries,
    style: &FigureStyle,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let Some(stats) = &series.stats else {
        return Ok(());
    };
    let pos = series.position;
    let color = series.style.body;

    let outline: Vec<(f64, f64)> = stats
        .outline(style.violin_half_width)
        .into_iter()
        .map(|(v, off)| (v, pos + off))
        .collect();
    if !outline.is_empty() {
        chart.draw_series(std::iter::once(Polygon::new(
            outline.clone(),
            color.mix(style.body_alpha).filled(),
        )))?;
        let mut closed = outline;
        closed.push(closed[0]);
        chart.draw_series(std::iter::once(PathElement::new(
            closed,
            style.edge_color.stroke_width(style.stroke(EDGE_WIDTH_PT)),
        )))?;
    }

    // Reference lines span half the violin width.
    let reach = style.violin_half_width / 2.0;
    let line = color.stroke_width(style.stroke(PART_WIDTH_PT));
    let mut lines = Vec::new();
    if style.show_means {
        lines.push(vec![(stats.mean, pos - reach), (stats.mean, pos + reach)]);
    }
    if style.show_medians {
        lines.push(vec![(stats.median, pos - reach), (stats.median, pos + reach)]);
    }
    if style.show_extrema {
        lines.push(vec![(stats.min, pos - reach), (stats.min, pos + reach)]);
        lines.push(vec![(stats.max, pos - reach), (stats.max, pos + reach)]);
        lines.push(vec![(stats.min, pos), (stats.max, pos)]);
    }
    chart.draw_series(lines.into_iter().map(|l| PathElement::new(l, line)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::data::aggregate::aggregate;
    use crate::data::model::Observation;

    fn figure(config: &Config) -> FigureData {
        let rows: Vec<Observation> = [("A", 40.0), ("A", 70.0), ("A", 55.0), ("B", 150.0)]
            .iter()
            .map(|&(g, v)| Observation::new(g, "", v))
            .collect();
        FigureData::build(&aggregate(&rows), config, &mut StdRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn style_resolves_pixel_grid() {
        let style = FigureStyle::from_config(&Config::default()).unwrap();
        assert_eq!((style.width_px, style.height_px), (600, 1200));
        assert!((style.px(72.0) - 300.0).abs() < 1e-9);
        assert_eq!(style.violin_half_width, 0.25);
    }

    #[test]
    fn oversized_figure_is_rejected() {
        let mut config = Config::default();
        config.figure.width_in = 1000.0;
        assert!(FigureStyle::from_config(&config).is_err());
    }

    fn render_svg(config: &Config) -> String {
        let style = FigureStyle::from_config(config).unwrap();
        let fig = figure(config);
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (style.width_px, style.height_px))
                .into_drawing_area();
            draw(&root, &fig, &style).unwrap();
        }
        svg
    }

    /// Anchor `(x, y)` of the `<text>` element whose content is `label`.
    fn text_anchor(svg: &str, label: &str) -> Option<(f64, f64)> {
        let end = svg.find(&format!(">{label}</text>"))?;
        let start = svg[..end].rfind("<text")?;
        let tag = &svg[start..end];
        Some((attr(tag, "x")?, attr(tag, "y")?))
    }

    fn attr(tag: &str, name: &str) -> Option<f64> {
        let key = format!(" {name}=\"");
        let rest = &tag[tag.find(&key)? + key.len()..];
        rest[..rest.find('"')?].parse().ok()
    }

    #[test]
    fn draws_into_svg_with_labels_and_shapes() {
        let mut config = Config::default();
        config.figure.dpi = 100;
        let svg = render_svg(&config);
        assert!(svg.contains(">Species<"));
        assert!(svg.contains(&format!(">{}<", config.axes.x_label)));
        assert!(svg.contains(">A<"));
        assert!(svg.contains(">B<"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn category_labels_sit_on_their_rows() {
        let mut config = Config::default();
        config.figure.dpi = 100;
        let svg = render_svg(&config);

        // Reversed order: the first group is the top row.
        let (a_x, a_y) = text_anchor(&svg, "A").unwrap();
        let (b_x, b_y) = text_anchor(&svg, "B").unwrap();
        assert!(a_y < b_y);
        assert_eq!(a_x, b_x);

        // The category title is centred between the two rows, left of them.
        let (title_x, title_y) = text_anchor(&svg, "Species").unwrap();
        assert!(((a_y + b_y) / 2.0 - title_y).abs() <= 1.0);
        assert!(title_x < a_x);

        // Rows are a full unit apart; the title sits half a unit from each.
        assert!(((b_y - a_y) - 2.0 * (title_y - a_y)).abs() <= 2.0);
    }

    #[test]
    fn value_ticks_are_evenly_spaced_with_first_label_blank() {
        let mut config = Config::default();
        config.figure.dpi = 100;
        let svg = render_svg(&config);

        assert!(text_anchor(&svg, "0").is_none());
        let anchors: Vec<(f64, f64)> = ["50", "100", "150", "200"]
            .iter()
            .map(|t| text_anchor(&svg, t).unwrap())
            .collect();
        let gaps: Vec<f64> = anchors.windows(2).map(|w| w[1].0 - w[0].0).collect();
        assert!(gaps.iter().all(|g| *g > 0.0));
        assert!(gaps.iter().all(|g| (g - gaps[0]).abs() <= 1.0));
        // All on one line, below the category labels.
        assert!(anchors.iter().all(|a| a.1 == anchors[0].1));
        let (_, b_y) = text_anchor(&svg, "B").unwrap();
        assert!(anchors[0].1 > b_y);
    }

    #[test]
    fn first_value_label_shown_when_not_hidden() {
        let mut config = Config::default();
        config.figure.dpi = 100;
        config.axes.hide_first_x_label = false;
        let svg = render_svg(&config);
        assert!(text_anchor(&svg, "0").is_some());
    }

    #[test]
    fn points_outside_fixed_limits_are_skipped() {
        let mut config = Config::default();
        config.figure.dpi = 100;
        // B is the bottom row and draws circles.
        assert_eq!(render_svg(&config).matches("<circle").count(), 1);
        // Its single value at 150 falls outside.
        config.axes.x_limits = Some([0.0, 120.0]);
        assert_eq!(render_svg(&config).matches("<circle").count(), 0);
    }

    #[test]
    fn opaque_render_paints_background() {
        let mut config = Config::default();
        config.figure.dpi = 50;
        config.output.transparent = false;
        let style = FigureStyle::from_config(&config).unwrap();
        let fig = figure(&config);

        let (w, h) = (style.width_px, style.height_px);
        let mut buf = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            draw(&root, &fig, &style).unwrap();
        }
        // top-left corner is background
        assert_eq!(&buf[..3], &[255, 255, 255]);
    }
}
