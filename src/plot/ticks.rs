//! "Nice" tick positions for the value axis.

/// Multipliers tried for the tick step, per power of ten.
const STEPS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Tick positions within `[lo, hi]` using at most `max_bins` intervals.
///
/// The step is the smallest of 1, 2, 2.5, 5 or 10 times a power of ten that
/// keeps the number of intervals across the range within `max_bins`; ticks
/// are the multiples of that step inside the range.
pub fn nice_ticks(lo: f64, hi: f64, max_bins: usize) -> Vec<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
        return if lo.is_finite() { vec![lo] } else { Vec::new() };
    }
    let bins = max_bins.max(1) as f64;
    let raw = (hi - lo) / bins;
    let scale = 10f64.powf(raw.log10().floor());

    let mut step = scale * 10.0;
    for mult in STEPS {
        let candidate = mult * scale;
        if intervals(lo, hi, candidate) <= bins {
            step = candidate;
            break;
        }
    }

    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last).map(|k| clean(k as f64 * step)).collect()
}

/// Number of whole steps spanned once both ends are snapped outward.
fn intervals(lo: f64, hi: f64, step: f64) -> f64 {
    (hi / step - 1e-9).ceil() - (lo / step + 1e-9).floor()
}

/// Remove floating-point noise such as `0.30000000000000004`.
fn clean(v: f64) -> f64 {
    let rounded = (v * 1e9).round() / 1e9;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format a tick value with no more decimals than it needs.
pub fn format_tick(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
