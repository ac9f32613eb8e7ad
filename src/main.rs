//! Twist - dump stylesheet assets and rewrite their urls.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use twist_assets::cli::{self, Cli};
use twist_assets::config::TwistConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = TwistConfig::load(&cli)?;
    cli::run(&cli.paths, &config)?;
    Ok(())
}
