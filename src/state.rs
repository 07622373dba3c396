use rand::Rng;

use crate::color::{ColorMap, SeriesStyle};
use crate::config::Config;
use crate::data::aggregate::{Aggregation, GroupSummary};
use crate::data::density::ViolinStats;
use crate::data::order::ordered_groups;
use crate::error::Result;
use crate::jitter::jitter;

// ---------------------------------------------------------------------------
// Figure state
// ---------------------------------------------------------------------------

/// One violin row of the figure.
#[derive(Debug, Clone)]
pub struct ViolinSeries {
    pub label: String,
    /// Position on the categorical axis, 1 at the bottom.
    pub position: f64,
    pub summary: GroupSummary,
    /// `None` when the group has no finite value at all.
    pub stats: Option<ViolinStats>,
    /// Raw values, in input order.
    pub values: Vec<f64>,
    /// Jittered categorical coordinate of each value.
    pub jittered: Vec<f64>,
    pub style: SeriesStyle,
}

/// Everything the renderer needs, computed once per run.
///
/// Building the figure data consumes randomness (the jitter); drawing it is
/// deterministic, so every export format shows the same points.
#[derive(Debug, Clone)]
pub struct FigureData {
    /// Series bottom-to-top.
    pub series: Vec<ViolinSeries>,
    /// Value-axis range.
    pub x_range: (f64, f64),
}

impl FigureData {
    /// Lay out the groups of `aggregation` according to `config`.
    pub fn build<R>(aggregation: &Aggregation, config: &Config, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let groups = ordered_groups(aggregation, config.axes.order);
        let colors = ColorMap::new(&config.violin.colors, &config.scatter.colors, groups.len())?;

        let mut series = Vec::with_capacity(groups.len());
        for (i, group) in groups.into_iter().enumerate() {
            let position = (i + 1) as f64;
            let jittered = jitter(
                rng,
                group.values.len(),
                position,
                config.scatter.amplitude,
                config.scatter.method,
            )?;
            let stats = ViolinStats::new(&group.values, config.violin.points);
            if !stats.as_ref().is_some_and(ViolinStats::has_body) {
                log::warn!(
                    "Group '{}' has too few distinct values for a density, drawing points only",
                    group.label
                );
            }

            series.push(ViolinSeries {
                label: group.label.clone(),
                position,
                summary: group.summary,
                stats,
                values: group.values.clone(),
                jittered,
                style: colors.style_for(i),
            });
        }

        let x_range = match config.axes.x_limits {
            Some([lo, hi]) => (lo, hi),
            None => data_range(&series),
        };

        let fig = Self { series, x_range };
        for s in &fig.series {
            let hidden = s.values.iter().filter(|v| v.is_finite() && !fig.in_range(**v)).count();
            if hidden > 0 {
                log::warn!(
                    "Group '{}': {hidden} value(s) outside the value axis [{}, {}] are not drawn",
                    s.label,
                    x_range.0,
                    x_range.1
                );
            }
        }
        Ok(fig)
    }

    /// Whether `value` lies on the value axis.
    pub fn in_range(&self, value: f64) -> bool {
        value >= self.x_range.0 && value <= self.x_range.1
    }

    /// Categorical axis range, half a row of padding on each side.
    pub fn y_range(&self) -> (f64, f64) {
        (0.5, self.series.len().max(1) as f64 + 0.5)
    }
}

/// Finite data range padded by 5 % on each side.
fn data_range(series: &[ViolinSeries]) -> (f64, f64) {
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad, hi + pad)
}
