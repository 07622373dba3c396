//! Configuration file handling.
//!
//! Settings come from a `rusty-violin.toml` file (all keys optional) and are
//! then overridden by command-line arguments.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::order::GroupOrder;
use crate::error::{Error, Result};
use crate::jitter::JitterMethod;
use crate::plot::ImageFormat;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "rusty-violin.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Figure size and text sizes.
    #[serde(default)]
    pub figure: FigureConfig,

    #[serde(default)]
    pub violin: ViolinConfig,

    #[serde(default)]
    pub scatter: ScatterConfig,

    #[serde(default)]
    pub axes: AxesConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Where observations are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("nature25479_f2_formatted.csv")
}

/// Exported image files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the output files without extension.
    #[serde(default = "default_basename")]
    pub basename: PathBuf,

    #[serde(default = "default_formats")]
    pub formats: Vec<ImageFormat>,

    /// Leave the background unpainted.
    #[serde(default = "default_true")]
    pub transparent: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            basename: default_basename(),
            formats: default_formats(),
            transparent: true,
        }
    }
}

fn default_basename() -> PathBuf {
    PathBuf::from("figure")
}

fn default_formats() -> Vec<ImageFormat> {
    ImageFormat::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

/// Figure geometry and text sizes, in inches and points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureConfig {
    #[serde(default = "default_width")]
    pub width_in: f64,

    #[serde(default = "default_height")]
    pub height_in: f64,

    /// Raster resolution; vector formats use it only as their unit grid.
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Tick label size.
    #[serde(default = "default_small")]
    pub tick_size_pt: f64,

    /// Axis label size.
    #[serde(default = "default_medium")]
    pub label_size_pt: f64,

    /// Outer margin around the axes.
    #[serde(default = "default_margin")]
    pub margin_pt: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_in: default_width(),
            height_in: default_height(),
            dpi: default_dpi(),
            tick_size_pt: default_small(),
            label_size_pt: default_medium(),
            margin_pt: default_margin(),
        }
    }
}

fn default_width() -> f64 {
    2.0
}

fn default_height() -> f64 {
    4.0
}

fn default_dpi() -> u32 {
    300
}

fn default_small() -> f64 {
    6.0
}

fn default_medium() -> f64 {
    8.0
}

fn default_margin() -> f64 {
    4.0
}

/// Violin bodies and their reference lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolinConfig {
    /// Full width of the widest violin, in category units.
    #[serde(default = "default_violin_width")]
    pub width: f64,

    /// Number of density evaluation points per violin.
    #[serde(default = "default_points")]
    pub points: usize,

    #[serde(default = "default_one")]
    pub alpha: f64,

    #[serde(default = "default_body_colors")]
    pub colors: Vec<String>,

    #[serde(default = "default_edge_color")]
    pub edge_color: String,

    #[serde(default = "default_true")]
    pub show_means: bool,

    #[serde(default)]
    pub show_medians: bool,

    /// Min/max caps and the bar joining them.
    #[serde(default)]
    pub show_extrema: bool,
}

impl Default for ViolinConfig {
    fn default() -> Self {
        Self {
            width: default_violin_width(),
            points: default_points(),
            alpha: 1.0,
            colors: default_body_colors(),
            edge_color: default_edge_color(),
            show_means: true,
            show_medians: false,
            show_extrema: false,
        }
    }
}

fn default_violin_width() -> f64 {
    0.5
}

fn default_points() -> usize {
    100
}

fn default_one() -> f64 {
    1.0
}

fn default_body_colors() -> Vec<String> {
    ["#B9DC3D", "#78CE5C", "#3B568A", "#45397F"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_edge_color() -> String {
    "#000000".to_string()
}

/// Jittered scatter overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterConfig {
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    #[serde(default)]
    pub method: JitterMethod,

    /// Fixed seed for reproducible jitter; unseeded runs draw from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Marker area in points², as in the notebook's `s=12`.
    #[serde(default = "default_marker_area")]
    pub marker_area_pt2: f64,

    #[serde(default = "default_half")]
    pub alpha: f64,

    #[serde(default = "default_point_colors")]
    pub colors: Vec<String>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            method: JitterMethod::default(),
            seed: None,
            marker_area_pt2: default_marker_area(),
            alpha: default_half(),
            colors: default_point_colors(),
        }
    }
}

fn default_amplitude() -> f64 {
    0.05
}

fn default_marker_area() -> f64 {
    12.0
}

fn default_half() -> f64 {
    0.5
}

fn default_point_colors() -> Vec<String> {
    ["#4473B0", "#C15436", "#6E348C", "#E4AC43"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Axis labels, limits and group order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxesConfig {
    #[serde(default = "default_x_label")]
    pub x_label: String,

    #[serde(default = "default_y_label")]
    pub y_label: String,

    /// Value-axis limits: `[min, max]`, or `"auto"` to fit the data.
    #[serde(default = "default_x_limits", with = "axis_limits")]
    pub x_limits: Option<[f64; 2]>,

    /// Target number of intervals between value-axis ticks.
    #[serde(default = "default_x_bins")]
    pub x_bins: usize,

    /// Blank out the label of the first value-axis tick.
    #[serde(default = "default_true")]
    pub hide_first_x_label: bool,

    #[serde(default)]
    pub order: GroupOrder,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            x_label: default_x_label(),
            y_label: default_y_label(),
            x_limits: default_x_limits(),
            x_bins: default_x_bins(),
            hide_first_x_label: true,
            order: GroupOrder::default(),
        }
    }
}

fn default_x_label() -> String {
    "Peak Power (W kg\u{207b}\u{b9})".to_string()
}

fn default_y_label() -> String {
    "Species".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_x_limits() -> Option<[f64; 2]> {
    Some([0.0, 225.0])
}

fn default_x_bins() -> usize {
    5
}

/// `x_limits` is either a two-element array or the keyword `"auto"`, since
/// TOML has no null.
mod axis_limits {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub const AUTO: &str = "auto";

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Fixed([f64; 2]),
        Keyword(String),
    }

    pub fn serialize<S: Serializer>(limits: &Option<[f64; 2]>, s: S) -> Result<S::Ok, S::Error> {
        match limits {
            Some(range) => Repr::Fixed(*range).serialize(s),
            None => Repr::Keyword(AUTO.to_string()).serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<[f64; 2]>, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Fixed(range) => Ok(Some(range)),
            Repr::Keyword(k) if k.trim().eq_ignore_ascii_case(AUTO) => Ok(None),
            Repr::Keyword(k) => Err(D::Error::custom(format!(
                "expected [min, max] or \"{AUTO}\", got \"{k}\""
            ))),
        }
    }
}

/// Console summary output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Print the table preview and per-group statistics.
    #[serde(default = "default_true")]
    pub show: bool,

    /// Rows shown in the table preview.
    #[serde(default = "default_head_rows")]
    pub head_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show: true,
            head_rows: default_head_rows(),
        }
    }
}

fn default_head_rows() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; only values
    /// given explicitly on the command line override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.clone();
        }
        if let Some(ref output) = args.output {
            self.output.basename = output.clone();
        }
        if !args.formats.is_empty() {
            self.output.formats = args.formats.clone();
        }
        if args.opaque {
            self.output.transparent = false;
        }
        if let Some(dpi) = args.dpi {
            self.figure.dpi = dpi;
        }
        if let Some(order) = args.order {
            self.axes.order = order;
        }
        if let Some(method) = args.jitter_method {
            self.scatter.method = method;
        }
        if let Some(amplitude) = args.jitter_amplitude {
            self.scatter.amplitude = amplitude;
        }
        if let Some(limits) = args.x_limits {
            self.axes.x_limits = limits.0;
        }
        if let Some(seed) = args.seed {
            self.scatter.seed = Some(seed);
        }
        if args.quiet {
            self.report.show = false;
        }
    }

    /// Check values that the TOML types alone cannot rule out.
    pub fn validate(&self) -> Result<()> {
        let fig = &self.figure;
        if !(fig.width_in > 0.0 && fig.height_in > 0.0 && fig.dpi > 0) {
            return Err(Error::InvalidArgument(
                "figure size and dpi must be positive".to_string(),
            ));
        }
        if self.output.formats.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one output format is required".to_string(),
            ));
        }
        if let Some([lo, hi]) = self.axes.x_limits {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(Error::InvalidArgument(format!(
                    "x limits must be finite and increasing, got [{lo}, {hi}]"
                )));
            }
        }
        if !(self.violin.width > 0.0) {
            return Err(Error::InvalidArgument(
                "violin width must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
