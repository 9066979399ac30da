//! sysviz - SysML v2 model visualization via the official kernel.
//!
//! The authentic SysML v2 diagram renderer lives inside the SysML Jupyter
//! kernel and is exposed through its `%viz` magic. This crate orchestrates
//! one visualization run end to end: discover `.sysml` sources, build a
//! `%viz` request, drive the kernel through a blocking session, and write
//! the returned SVG to disk. A reduced PlantUML fallback covers machines
//! without the kernel.

pub mod config;
pub mod diagnostics;
pub mod fallback;
pub mod locate;
pub mod output;
pub mod request;

mod error;

pub use error::VizError;
pub use request::{View, VizRequest};

use log::{debug, info, warn};

use sysviz_kernel::{KernelSession, Output, SessionConfig, kernelspec};

use config::AppConfig;

/// Orchestrates visualization runs against the SysML kernel.
///
/// Holds the configuration and nothing else; no state survives a run, and
/// each [`Visualizer::visualize`] call owns its kernel session from launch
/// to teardown.
///
/// # Examples
///
/// ```rust,no_run
/// use sysviz::{Visualizer, VizRequest, View, config::AppConfig};
///
/// let source = "package Demo { part def Vehicle; }";
/// let request = VizRequest::new(View::Tree, None, None)?;
///
/// let visualizer = Visualizer::new(AppConfig::default());
/// let svg = visualizer.visualize(source, &request)?;
/// # Ok::<(), sysviz::VizError>(())
/// ```
#[derive(Default)]
pub struct Visualizer {
    config: AppConfig,
}

impl Visualizer {
    /// Create a visualizer with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Render `source` to SVG through the kernel.
    ///
    /// The model code is executed first, then the `%viz` magic built from
    /// `request`. When a non-Tree view yields no SVG the request is retried
    /// once with the Tree view, matching the kernel's own notebooks; there
    /// is no other retry. The session is torn down on every path.
    ///
    /// # Errors
    ///
    /// - [`VizError::KernelUnavailable`] when no kernelspec is installed or
    ///   the kernel never becomes ready.
    /// - [`VizError::InvalidRequest`] when no element was given and the
    ///   source declares no package to target.
    /// - [`VizError::KernelCommunication`] on protocol failures.
    /// - [`VizError::EmptyOutput`] when no SVG came back.
    pub fn visualize(&self, source: &str, request: &VizRequest) -> Result<Vec<u8>, VizError> {
        let target = self.resolve_target(source, request)?;

        let kernel = self.config.kernel();
        let spec = kernelspec::find(kernel.name())?;
        let session_config = SessionConfig {
            startup_timeout: kernel.startup_timeout(),
            execute_timeout: kernel.execute_timeout(),
        };

        let mut session = KernelSession::start(&spec, &session_config)?;
        let result = self.run_viz(&mut session, source, request, &target);
        session.shutdown();
        result
    }

    fn run_viz(
        &self,
        session: &mut KernelSession,
        source: &str,
        request: &VizRequest,
        target: &str,
    ) -> Result<Vec<u8>, VizError> {
        info!(viz_target = target, view = request.view().to_string(); "Executing model");
        let model_outputs = session.execute(source)?;
        for output in &model_outputs {
            if let Output::Error { ename, evalue, .. } = output {
                warn!(ename = ename.as_str(), evalue = evalue.as_str(); "Model execution reported an error");
            }
        }

        let magic = request.magic(target);
        debug!(command = magic.as_str(); "Requesting visualization");
        let outputs = session.execute(&magic)?;
        if let Some(svg) = extract_svg(&outputs) {
            return Ok(svg.into_bytes());
        }

        // One documented fallback: some views fail on models that the Tree
        // view still renders.
        if request.view() != View::Tree {
            let fallback = request.with_tree_view();
            let magic = fallback.magic(target);
            warn!(command = magic.as_str(); "View produced no SVG, retrying with Tree view");
            let outputs = session.execute(&magic)?;
            if let Some(svg) = extract_svg(&outputs) {
                return Ok(svg.into_bytes());
            }
        }

        Err(VizError::EmptyOutput)
    }

    /// Render `source` to SVG through the standalone PlantUML fallback.
    ///
    /// # Errors
    ///
    /// See [`fallback::render_standalone`].
    pub fn visualize_standalone(&self, source: &str) -> Result<Vec<u8>, VizError> {
        fallback::render_standalone(source, self.config.fallback())
    }

    /// The `%viz` target: the explicit element path when given, otherwise
    /// the first package declared in the source.
    fn resolve_target(&self, source: &str, request: &VizRequest) -> Result<String, VizError> {
        if let Some(element) = request.element() {
            return Ok(element.to_string());
        }
        locate::primary_package(source).ok_or_else(|| {
            VizError::InvalidRequest(
                "no --element given and the model declares no package to visualize".into(),
            )
        })
    }
}

/// First SVG payload in the output stream, if any.
fn extract_svg(outputs: &[Output]) -> Option<String> {
    outputs.iter().find_map(Output::svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_prefers_explicit_element() {
        let visualizer = Visualizer::default();
        let request = VizRequest::new(View::Tree, None, Some("Pkg::Part".into())).unwrap();
        let target = visualizer
            .resolve_target("package Other {}", &request)
            .unwrap();
        assert_eq!(target, "Pkg::Part");
    }

    #[test]
    fn target_falls_back_to_declared_package() {
        let visualizer = Visualizer::default();
        let request = VizRequest::new(View::Tree, None, None).unwrap();
        let target = visualizer
            .resolve_target("package Demo { part def V; }", &request)
            .unwrap();
        assert_eq!(target, "Demo");
    }

    #[test]
    fn missing_target_is_invalid_request() {
        let visualizer = Visualizer::default();
        let request = VizRequest::new(View::Tree, None, None).unwrap();
        let err = visualizer
            .resolve_target("part def Loose;", &request)
            .unwrap_err();
        assert!(matches!(err, VizError::InvalidRequest(_)));
    }
}
