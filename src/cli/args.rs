//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Rewrite relative url() references in stylesheets and dump the assets
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Stylesheets or directories to process (directories are searched for *.css)
    #[arg(value_name = "PATH", required = true, value_hint = clap::ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Prefix for rewritten urls (e.g. /static/images)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Directory receiving copied assets (must exist)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dump_dir: Option<PathBuf>,

    /// Write rewritten stylesheets here instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub out_dir: Option<PathBuf>,

    /// Leave a stylesheet unmodified when any of its assets fails to copy
    #[arg(long)]
    pub strict: bool,

    /// Minify the rewritten stylesheets
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Config file path (default: twist.toml, searched upward)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
