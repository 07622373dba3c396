//! Kernel density estimates for violin bodies.
//!
//! Each violin is a Gaussian KDE of one group's values, evaluated on an even
//! grid between the group's minimum and maximum, with the bandwidth picked by
//! Scott's rule (`n^(-1/5)` times the sample standard deviation).

use std::f64::consts::PI;

/// Shape and reference statistics of one violin.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolinStats {
    /// Evaluation points along the value axis, ascending.
    pub coords: Vec<f64>,
    /// Density at each of `coords`. Empty when the density is undefined.
    pub density: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl ViolinStats {
    /// Compute the violin of `values`, evaluating the density at `points`
    /// positions.
    ///
    /// Non-finite values are ignored for the shape. Returns `None` when no
    /// finite values remain. With fewer than two distinct values the density
    /// is left empty: there is no spread to estimate.
    #[must_use]
    pub fn new(values: &[f64], points: usize) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let min = sorted[0];
        let max = sorted[n - 1];
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let (coords, density) = match scott_bandwidth(&sorted) {
            Some(bw) if points >= 2 => {
                let coords = linspace(min, max, points);
                let density = coords.iter().map(|&x| gaussian_kde(&sorted, bw, x)).collect();
                (coords, density)
            }
            _ => (Vec::new(), Vec::new()),
        };

        Some(Self {
            coords,
            density,
            mean,
            median,
            min,
            max,
        })
    }

    /// Whether a body can be drawn for this violin.
    pub fn has_body(&self) -> bool {
        !self.density.is_empty()
    }

    /// Peak of the density curve (0 when there is no body).
    pub fn peak_density(&self) -> f64 {
        self.density.iter().copied().fold(0.0, f64::max)
    }

    /// Outline of the body as `(value, offset)` pairs, where `offset` is the
    /// signed distance from the violin's centre line, scaled so that the
    /// widest point has `half_width`. The outline runs along one side and
    /// back along the other, forming a closed polygon.
    pub fn outline(&self, half_width: f64) -> Vec<(f64, f64)> {
        let peak = self.peak_density();
        if !self.has_body() || peak <= 0.0 {
            return Vec::new();
        }
        let scale = half_width / peak;
        let upper = self
            .coords
            .iter()
            .zip(&self.density)
            .map(|(&x, &d)| (x, d * scale));
        let lower = self
            .coords
            .iter()
            .zip(&self.density)
            .rev()
            .map(|(&x, &d)| (x, -d * scale));
        upper.chain(lower).collect()
    }
}

/// Scott's rule bandwidth for one-dimensional data.
///
/// `None` when fewer than two values are given or the values have no spread.
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let sd = var.sqrt();
    if !sd.is_finite() || sd <= 0.0 {
        return None;
    }
    Some(sd * nf.powf(-0.2))
}

/// Gaussian kernel density of `values` at `x` with bandwidth `bw`.
pub fn gaussian_kde(values: &[f64], bw: f64, x: f64) -> f64 {
    let norm = 1.0 / ((2.0 * PI).sqrt() * bw * values.len() as f64);
    values
        .iter()
        .map(|&v| {
            let z = (x - v) / bw;
            (-0.5 * z * z).exp()
        })
        .sum::<f64>()
        * norm
}

/// `count` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}
