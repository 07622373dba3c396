//! Command-line interface argument parsing.
//!
//! Every option here is optional: unset flags leave the value from the
//! configuration file (or its default) in place.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::data::order::GroupOrder;
use crate::error::Error;
use crate::jitter::JitterMethod;
use crate::plot::ImageFormat;

/// rusty-violin - grouped statistics and violin plots from tabular data
///
/// Reads a three-column table (group, individual, value), prints per-group
/// count, mean, standard deviation and standard error, and exports a
/// horizontal violin plot with jittered points.
///
/// Examples:
///   rusty-violin data.tsv
///   rusty-violin data.csv -o figures/power -f png,svg --seed 3
///   rusty-violin data.parquet --order mean-descending --opaque
///   rusty-violin --init-config > rusty-violin.toml
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input table (.tsv, .tab, .txt, .csv, .json, .parquet)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output path without extension; one file is written per format
    #[arg(short, long, value_name = "BASENAME")]
    pub output: Option<PathBuf>,

    /// Output formats (eps, png, pdf, svg)
    ///
    /// Repeat the flag or separate with commas: -f png,svg
    #[arg(short = 'f', long = "format", value_name = "FORMAT", value_delimiter = ',')]
    pub formats: Vec<ImageFormat>,

    /// Paint a white background instead of leaving it transparent
    #[arg(long)]
    pub opaque: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for rusty-violin.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bottom-to-top order of the groups
    ///
    /// Values: first-appearance, reversed, alphabetical, mean-ascending,
    /// mean-descending
    #[arg(long, value_name = "ORDER")]
    pub order: Option<GroupOrder>,

    /// Seed for the jitter random generator
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Jitter distribution (gaussian, uniform)
    #[arg(long, value_name = "METHOD")]
    pub jitter_method: Option<JitterMethod>,

    /// Jitter amplitude in category units
    #[arg(long, value_name = "AMOUNT", allow_negative_numbers = true)]
    pub jitter_amplitude: Option<f64>,

    /// Value-axis limits: "auto" to fit the data, or MIN,MAX
    #[arg(long, value_name = "auto|MIN,MAX", allow_hyphen_values = true)]
    pub x_limits: Option<XLimits>,

    /// Raster resolution in dots per inch
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,

    /// Do not print the summary tables
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a default rusty-violin.toml and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// `--x-limits` value; `None` fits the axis to the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XLimits(pub Option<[f64; 2]>);

impl FromStr for XLimits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(XLimits(None));
        }
        let invalid = || {
            Error::InvalidArgument(format!("invalid x limits '{s}', expected auto or MIN,MAX"))
        };
        let (lo, hi) = s.split_once(',').ok_or_else(invalid)?;
        let lo: f64 = lo.trim().parse().map_err(|_| invalid())?;
        let hi: f64 = hi.trim().parse().map_err(|_| invalid())?;
        Ok(XLimits(Some([lo, hi])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_is_valid() {
        let args = Args::parse_from(["rusty-violin"]);
        assert!(args.input.is_none());
        assert!(args.formats.is_empty());
        assert!(!args.opaque);
    }

    #[test]
    fn formats_accept_commas_and_repeats() {
        let args = Args::parse_from(["rusty-violin", "-f", "png,svg", "--format", "EPS"]);
        assert_eq!(
            args.formats,
            vec![ImageFormat::Png, ImageFormat::Svg, ImageFormat::Eps]
        );
    }

    #[test]
    fn typed_options_are_parsed() {
        let args = Args::parse_from([
            "rusty-violin",
            "in.csv",
            "--order",
            "mean-ascending",
            "--jitter-method",
            "random",
            "--jitter-amplitude",
            "0.1",
            "--dpi",
            "150",
        ]);
        assert_eq!(args.input, Some(PathBuf::from("in.csv")));
        assert_eq!(args.order, Some(GroupOrder::MeanAscending));
        assert_eq!(args.jitter_method, Some(JitterMethod::Uniform));
        assert_eq!(args.jitter_amplitude, Some(0.1));
        assert_eq!(args.dpi, Some(150));
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(Args::try_parse_from(["rusty-violin", "-f", "gif"]).is_err());
        assert!(Args::try_parse_from(["rusty-violin", "--order", "random"]).is_err());
        assert!(Args::try_parse_from(["rusty-violin", "--jitter-method", "beta"]).is_err());
    }

    #[test]
    fn x_limits_accept_auto_and_pairs() {
        let args = Args::parse_from(["rusty-violin", "--x-limits", "AUTO"]);
        assert_eq!(args.x_limits, Some(XLimits(None)));
        let args = Args::parse_from(["rusty-violin", "--x-limits", "-5, 300"]);
        assert_eq!(args.x_limits, Some(XLimits(Some([-5.0, 300.0]))));
        assert!(Args::try_parse_from(["rusty-violin", "--x-limits", "0"]).is_err());
        assert!(Args::try_parse_from(["rusty-violin", "--x-limits", "a,b"]).is_err());
    }

    #[test]
    fn negative_amplitude_reaches_validation() {
        let args = Args::parse_from(["rusty-violin", "--jitter-amplitude", "-0.5"]);
        assert_eq!(args.jitter_amplitude, Some(-0.5));
    }
}
