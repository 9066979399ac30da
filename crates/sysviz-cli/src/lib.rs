//! CLI logic for the sysviz tool.
//!
//! This module wires argument parsing, configuration loading, model
//! auto-discovery, and the visualization pipeline together.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::path::{Path, PathBuf};

use log::{info, warn};

use sysviz::{
    View, Visualizer, VizError, VizRequest,
    diagnostics::DependencyReport,
    locate, output,
};

/// Run the sysviz CLI application.
///
/// Dispatches to the diagnostic modes when requested, otherwise processes
/// the discovered models through the visualization pipeline and writes the
/// resulting SVG to the output file.
///
/// # Errors
///
/// Returns `VizError` for every failure category: missing kernel, invalid
/// request, communication breakdown, empty output, no models found, and
/// file I/O errors.
pub fn run(args: &Args) -> Result<(), VizError> {
    let app_config = config::load_config(args.config.as_ref())?;

    if args.check_deps {
        let report = DependencyReport::collect(app_config.kernel().name());
        print!("{}", report.summary());
        return check_deps_result(&report);
    }

    if args.diagnose {
        let report = DependencyReport::collect(app_config.kernel().name());
        print!("{}", report.diagnose());
        return Ok(());
    }

    let Some(output_file) = &args.output else {
        return Err(VizError::InvalidRequest(
            "an output SVG file path is required for visualization".into(),
        ));
    };

    // Build and validate the request before anything is spawned.
    let view = match &args.view {
        Some(name) => name.parse::<View>()?,
        None => View::default(),
    };
    let request = VizRequest::new(view, args.style.clone(), args.element.clone())?;

    let source_dir = PathBuf::from(&args.source_dir);
    let models = locate::find_models(&source_dir);
    if models.is_empty() {
        return Err(VizError::NoModels(source_dir));
    }
    info!(count = models.len(), root = source_dir.display().to_string(); "Discovered models");

    let source = locate::combine_sources(&models)?;
    let visualizer = Visualizer::new(app_config);

    let svg = if args.standalone {
        if args.view.is_some() || args.style.is_some() || args.element.is_some() {
            warn!("--standalone renders a fixed structural diagram; --view, --style, and --element are ignored");
        }
        visualizer.visualize_standalone(&source)?
    } else {
        visualizer.visualize(&source, &request)?
    };

    output::write_svg(Path::new(output_file), &svg)?;
    println!("Generated {} byte SVG: {output_file}", svg.len());

    Ok(())
}

/// `--check-deps` exits non-zero when nothing can run at all.
fn check_deps_result(report: &DependencyReport) -> Result<(), VizError> {
    if report.any_method_available() {
        Ok(())
    } else {
        Err(VizError::KernelUnavailable(
            "no visualization method is available on this machine".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_report() -> DependencyReport {
        DependencyReport {
            kernel_name: "sysml".into(),
            kernel_spec: None,
            search_paths: Vec::new(),
            installed_kernels: Vec::new(),
            jupyter: None,
            conda_root: None,
            graphviz: None,
            plantuml: None,
        }
    }

    #[test]
    fn check_deps_fails_when_nothing_is_installed() {
        let err = check_deps_result(&empty_report()).unwrap_err();
        assert!(matches!(err, VizError::KernelUnavailable(_)));
    }

    #[test]
    fn check_deps_passes_with_fallback_only() {
        let mut report = empty_report();
        report.plantuml = Some(PathBuf::from("/usr/bin/plantuml"));
        assert!(check_deps_result(&report).is_ok());
    }
}
