//! Random jitter for categorical scatter positions.
//!
//! Points that share a category would sit on top of each other; jitter
//! spreads them around the category's position. The random source is always
//! passed in, so callers decide whether a run is reproducible.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Distribution of the perturbation added to each point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMethod {
    /// Standard normal, scaled by the amplitude.
    #[default]
    Gaussian,
    /// Uniform over `[-1, 1)`, scaled by the amplitude.
    #[serde(alias = "random")]
    Uniform,
}

impl JitterMethod {
    pub fn name(self) -> &'static str {
        match self {
            JitterMethod::Gaussian => "gaussian",
            JitterMethod::Uniform => "uniform",
        }
    }

    /// Draw one unscaled perturbation.
    fn sample<R>(self, rng: &mut R) -> f64
    where
        R: Rng + ?Sized,
    {
        match self {
            JitterMethod::Gaussian => rng.sample(StandardNormal),
            JitterMethod::Uniform => rng.random_range(-1.0..1.0),
        }
    }
}

impl fmt::Display for JitterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JitterMethod {
    type Err = Error;

    /// `random` is accepted as another name for `uniform`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Ok(JitterMethod::Gaussian),
            "uniform" | "random" => Ok(JitterMethod::Uniform),
            _ => Err(Error::InvalidArgument(format!(
                "invalid jitter method '{s}', choose between gaussian or uniform"
            ))),
        }
    }
}

/// Produce `n` jittered copies of `center`.
///
/// Each element is `center + amplitude * sample`, with samples drawn
/// independently from `method`'s distribution. An amplitude of zero yields
/// exact copies of `center`.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if `amplitude` is negative or not finite.
/// Nothing is drawn from `rng` in that case.
pub fn jitter<R>(
    rng: &mut R,
    n: usize,
    center: f64,
    amplitude: f64,
    method: JitterMethod,
) -> Result<Vec<f64>>
where
    R: Rng + ?Sized,
{
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "jitter amplitude must be a finite non-negative number, got {amplitude}"
        )));
    }
    if amplitude == 0.0 {
        return Ok(vec![center; n]);
    }
    Ok((0..n)
        .map(|_| center + amplitude * method.sample(rng))
        .collect())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn zero_amplitude_gives_exact_copies() {
        for method in [JitterMethod::Gaussian, JitterMethod::Uniform] {
            for n in [0, 1, 17] {
                let out = jitter(&mut rng(), n, 3.25, 0.0, method).unwrap();
                assert_eq!(out, vec![3.25; n]);
            }
        }
    }

    #[test]
    fn zero_count_gives_empty() {
        for method in [JitterMethod::Gaussian, JitterMethod::Uniform] {
            assert!(jitter(&mut rng(), 0, -4.0, 2.0, method).unwrap().is_empty());
        }
    }

    #[test]
    fn unknown_method_is_invalid_argument() {
        let err = "bogus".parse::<JitterMethod>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn negative_amplitude_is_invalid_argument() {
        let err = jitter(&mut rng(), 3, 1.0, -0.5, JitterMethod::Gaussian).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn uniform_stays_within_amplitude() {
        let out = jitter(&mut rng(), 2000, 2.0, 0.25, JitterMethod::Uniform).unwrap();
        assert_eq!(out.len(), 2000);
        assert!(out.iter().all(|&y| (1.75..2.25).contains(&y)));
    }

    #[test]
    fn gaussian_is_centered_with_requested_spread() {
        let n = 20_000;
        let out = jitter(&mut rng(), n, 5.0, 0.5, JitterMethod::Gaussian).unwrap();
        let mean = out.iter().sum::<f64>() / n as f64;
        let var = out.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert!((mean - 5.0).abs() < 0.02, "mean = {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.02, "sd = {}", var.sqrt());
    }

    #[test]
    fn same_seed_reproduces_sample() {
        let a = jitter(&mut rng(), 8, 1.0, 0.05, JitterMethod::Gaussian).unwrap();
        let b = jitter(&mut rng(), 8, 1.0, 0.05, JitterMethod::Gaussian).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn method_names_round_trip() {
        assert_eq!("random".parse::<JitterMethod>().unwrap(), JitterMethod::Uniform);
        assert_eq!("Gaussian".parse::<JitterMethod>().unwrap(), JitterMethod::Gaussian);
        assert_eq!(JitterMethod::Uniform.to_string(), "uniform");
    }
}
