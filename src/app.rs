use std::path::PathBuf;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::Args;
use crate::config::Config;
use crate::data::aggregate::aggregate;
use crate::data::loader::load_file;
use crate::plot::{export, FigureStyle};
use crate::report;
use crate::state::FigureData;

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Configuration from the explicit or default file, overridden by `args`.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Load, summarise, draw and export. Returns the paths written.
pub fn run(config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let input = &config.input.path;
    let table = load_file(input)
        .with_context(|| format!("Failed to load observations from {}", input.display()))?;

    if table.is_empty() {
        log::warn!("{} holds no observations; the figure will be empty", input.display());
    }
    let aggregation = aggregate(&table.rows);
    log::info!(
        "Loaded {} observations in {} groups",
        table.len(),
        aggregation.len()
    );
    for group in aggregation.groups() {
        if group.summary.is_degenerate() {
            log::warn!(
                "Group '{}' has {} observation(s); its standard deviation is undefined",
                group.label,
                group.summary.count
            );
        }
    }

    let mut rng = match config.scatter.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let fig = FigureData::build(&aggregation, config, &mut rng)?;

    if config.report.show {
        report::print(&table, &aggregation, &fig, config.report.head_rows);
    }

    let style = FigureStyle::from_config(config)?;
    let result = export(&fig, &style, &config.output.basename, &config.output.formats);
    let total = result.outcomes.len();
    let written: Vec<PathBuf> = result.written().map(PathBuf::from).collect();
    if result.is_success() {
        return Ok(written);
    }
    let failed = result.failures().count();
    result
        .into_result()
        .with_context(|| format!("{failed} of {total} output format(s) failed"))?;
    Ok(written)
}
