//! Error adapter for converting VizError to miette diagnostics.
//!
//! This module bridges the library's error type and miette's rich
//! diagnostic formatting in the CLI: each variant gets a stable code and,
//! where the operator can act on it, help text with the actual commands to
//! run.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;

use sysviz::{View, VizError, diagnostics::install_guidance};

/// Adapter wrapping a [`VizError`] for miette reporting.
pub struct Reportable<'a>(pub &'a VizError);

impl fmt::Debug for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            VizError::KernelUnavailable(_) => "sysviz::kernel_unavailable",
            VizError::InvalidRequest(_) => "sysviz::invalid_request",
            VizError::KernelCommunication(_) => "sysviz::kernel_communication",
            VizError::EmptyOutput => "sysviz::empty_output",
            VizError::NoModels(_) => "sysviz::no_models",
            VizError::Io(_) => "sysviz::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            VizError::KernelUnavailable(_) => install_guidance(),
            VizError::InvalidRequest(_) => format!(
                "recognized views: {}; element paths use `Package::Element` syntax",
                View::NAMES.join(", ")
            ),
            VizError::EmptyOutput => {
                "the model likely contains syntax errors; re-run with --log-level debug \
                 to see the kernel's messages"
                    .to_string()
            }
            VizError::NoModels(_) => {
                "create a .sysml file or point --source-dir at your models".to_string()
            }
            VizError::KernelCommunication(_) | VizError::Io(_) => return None,
        };
        Some(Box::new(help))
    }
}

/// Wrap an error for rendering.
pub fn to_reportable(err: &VizError) -> Reportable<'_> {
    Reportable(err)
}
