//! Error types for visualization operations.
//!
//! This module provides the main error type [`VizError`] which wraps the
//! failure categories a visualization run can hit. Kernel-side failures
//! are folded into the variants the caller can act on: a kernel that
//! cannot start is [`VizError::KernelUnavailable`], while a kernel that
//! breaks mid-conversation is [`VizError::KernelCommunication`].

use std::{io, path::PathBuf};

use thiserror::Error;

use sysviz_kernel::KernelError;

/// The main error type for visualization operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// The external SysML kernel (or the fallback renderer) is missing or
    /// never became ready. Reported with installation guidance.
    #[error("{0}")]
    KernelUnavailable(String),

    /// The request itself is malformed: unknown view, empty element path.
    /// Raised before any process is spawned.
    #[error("invalid visualization request: {0}")]
    InvalidRequest(String),

    /// The kernel crashed or desynced mid-exchange. The session has been
    /// torn down by the time this surfaces.
    #[error("kernel communication error: {0}")]
    KernelCommunication(String),

    /// The kernel completed but produced no SVG attachment, usually a
    /// model syntax error.
    #[error("diagram generation produced no SVG output")]
    EmptyOutput,

    /// Auto-discovery found no `.sysml` files under the scanned root.
    #[error("no .sysml files found under {}", .0.display())]
    NoModels(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<KernelError> for VizError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::Unavailable(message) => Self::KernelUnavailable(message),
            KernelError::Communication(message) => Self::KernelCommunication(message),
            KernelError::Timeout(elapsed) => {
                Self::KernelCommunication(format!("kernel timed out after {elapsed:?}"))
            }
            KernelError::Io(err) => Self::Io(err),
        }
    }
}
