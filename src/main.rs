mod app;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod jitter;
mod plot;
mod report;
mod state;

use cli::Args;
use config::Config;

fn main() -> anyhow::Result<()> {
    let args = Args::parse_args();

    if args.init_config {
        print!("{}", Config::default_toml());
        return Ok(());
    }

    // RUST_LOG, when set, takes precedence over the verbosity flag.
    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let config = app::resolve_config(&args)?;
    let written = app::run(&config)?;
    log::debug!("{} file(s) written", written.len());
    Ok(())
}
