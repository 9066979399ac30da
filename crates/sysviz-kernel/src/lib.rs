//! Blocking Jupyter client for the SysML v2 kernel.
//!
//! The official SysML v2 visualization lives inside a Jupyter kernel and is
//! reached through its `%viz` magic. This crate speaks just enough of the
//! Jupyter wire protocol to drive that kernel from a command-line process:
//!
//! - **Kernelspec discovery**: find `kernel.json` in the standard Jupyter
//!   data paths and common conda trees ([`kernelspec`]).
//! - **Connection files**: generate loopback ports and an HMAC key for a
//!   fresh kernel launch ([`connection`]).
//! - **Wire codec**: signed multipart ZMQ frames ([`message`]).
//! - **Sessions**: a blocking start / execute / shutdown lifecycle with
//!   guaranteed subprocess teardown ([`session`]).
//!
//! One kernel is driven at a time; nothing here is shared across threads.

pub mod connection;
pub mod error;
pub mod kernelspec;
pub mod message;
pub mod output;
pub mod session;

pub use connection::ConnectionInfo;
pub use error::KernelError;
pub use kernelspec::{KernelSpec, ResolvedKernelSpec};
pub use output::{MimeBundle, Output, SVG_MIME};
pub use session::{KernelSession, SessionConfig};
