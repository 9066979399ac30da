//! sysviz CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use sysviz_cli::{Args, error_adapter::to_reportable};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    // Parse configuration first
    let args = Args::parse();

    // --verbose is a shorthand that only wins over the default level
    let requested = if args.verbose && args.log_level == "warn" {
        "info"
    } else {
        args.log_level.as_str()
    };
    let log_level = LevelFilter::from_str(requested).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {requested}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting sysviz");
    debug!(args:?; "Parsed arguments");

    // Run the application
    if let Err(err) = sysviz_cli::run(&args) {
        let reporter = miette::GraphicalReportHandler::new();

        let mut writer = String::new();
        reporter
            .render_report(&mut writer, &to_reportable(&err))
            .expect("Writing to String buffer is infallible");

        error!("{writer}");

        process::exit(1);
    }

    info!("Completed successfully");
}
