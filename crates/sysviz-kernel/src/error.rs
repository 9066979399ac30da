//! Error types for kernel client operations.

use std::{io, time::Duration};

use thiserror::Error;

/// Errors raised while locating, launching, or talking to the kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The kernel is not installed, could not be launched, or never became
    /// ready. The message explains what was looked for and where.
    #[error("SysML kernel is not available: {0}")]
    Unavailable(String),

    /// The kernel process is running but the message exchange broke down:
    /// malformed frames, a bad signature, or an unexpected reply.
    #[error("kernel communication failed: {0}")]
    Communication(String),

    /// A request did not complete within the configured window.
    #[error("timed out after {0:?} waiting for the kernel")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<zmq::Error> for KernelError {
    fn from(err: zmq::Error) -> Self {
        Self::Communication(err.to_string())
    }
}

impl From<serde_json::Error> for KernelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Communication(format!("invalid message payload: {err}"))
    }
}
