//! Command-line argument definitions for the sysviz CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. The view name is kept as a plain string here and
//! validated in [`crate::run`], so a bad view surfaces as the same
//! `InvalidRequest` error the library raises, before any kernel process
//! is spawned.

use clap::Parser;

/// Command-line arguments for the SysML visualization tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Output SVG file path (required unless --check-deps or --diagnose)
    pub output: Option<String>,

    /// Directory scanned for .sysml model files
    #[arg(short, long, default_value = ".")]
    pub source_dir: String,

    /// Specific element to visualize, e.g. 'PackageName::ElementName'
    #[arg(long)]
    pub element: Option<String>,

    /// Visualization view (Default, Tree, State, Interconnection, Action,
    /// Sequence, Case, MIXED)
    #[arg(long)]
    pub view: Option<String>,

    /// Visualization style, e.g. 'stdcolor'
    #[arg(long)]
    pub style: Option<String>,

    /// Render via the standalone PlantUML fallback instead of the kernel
    #[arg(long)]
    pub standalone: bool,

    /// Check dependency status and exit (non-zero when nothing can run)
    #[arg(long)]
    pub check_deps: bool,

    /// Print detailed diagnostics for troubleshooting and exit
    #[arg(long)]
    pub diagnose: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Shorthand for --log-level info
    #[arg(short, long)]
    pub verbose: bool,
}
