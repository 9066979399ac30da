//! Blocking kernel session lifecycle.
//!
//! A [`KernelSession`] owns the kernel subprocess and the ZMQ channels to
//! it. Sessions are created with [`KernelSession::start`], exchange work
//! through [`KernelSession::execute`], and are torn down by
//! [`KernelSession::shutdown`], which also runs from `Drop`, so the
//! subprocess is released on every exit path including panics.

use std::{
    process::{Child, Command, Stdio},
    time::{Duration, Instant},
};

use log::{debug, info, trace, warn};
use serde_json::json;
use tempfile::TempDir;

use crate::{
    connection::ConnectionInfo,
    error::KernelError,
    kernelspec::ResolvedKernelSpec,
    message::WireMessage,
    output::Output,
};

/// Poll granularity while waiting on a channel.
const POLL_INTERVAL_MS: i64 = 250;

/// Grace period for the kernel to honor a shutdown_request before it is
/// killed outright.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Timeouts governing a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for the kernel to answer kernel_info after launch.
    pub startup_timeout: Duration,

    /// How long a single execute exchange may take.
    pub execute_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(30),
            execute_timeout: Duration::from_secs(60),
        }
    }
}

/// A running kernel and its communication channels.
pub struct KernelSession {
    child: Option<Child>,
    connection: ConnectionInfo,
    session_id: String,
    shell: zmq::Socket,
    iopub: zmq::Socket,
    control: zmq::Socket,
    execute_timeout: Duration,
    // Dropped last; holds the connection file the kernel was launched with.
    _connection_dir: TempDir,
    _context: zmq::Context,
}

impl std::fmt::Debug for KernelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelSession")
            .field("connection", &self.connection)
            .field("session_id", &self.session_id)
            .field("execute_timeout", &self.execute_timeout)
            .finish_non_exhaustive()
    }
}

impl KernelSession {
    /// Launch the kernel described by `spec` and block until it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Unavailable`] when the process cannot be
    /// spawned, exits during startup, or does not answer kernel_info
    /// within the startup timeout. The subprocess is torn down on every
    /// error path.
    pub fn start(
        spec: &ResolvedKernelSpec,
        config: &SessionConfig,
    ) -> Result<Self, KernelError> {
        let connection_dir = tempfile::Builder::new()
            .prefix("sysviz-kernel-")
            .tempdir()?;
        let connection_file = connection_dir.path().join("connection.json");
        let connection = ConnectionInfo::generate(&spec.name)?;
        connection.write_to(&connection_file)?;

        let argv = spec.launch_argv(&connection_file);
        info!(kernel = spec.name, command = argv.join(" "); "Launching kernel");

        let child = Command::new(&argv[0])
            .args(&argv[1..])
            .envs(&spec.spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                KernelError::Unavailable(format!(
                    "failed to launch kernel process `{}`: {err}",
                    argv[0]
                ))
            })?;

        let context = zmq::Context::new();
        let shell = Self::channel(&context, zmq::DEALER, &connection, connection.shell_port)?;
        let control = Self::channel(&context, zmq::DEALER, &connection, connection.control_port)?;
        let iopub = Self::channel(&context, zmq::SUB, &connection, connection.iopub_port)?;
        iopub.set_subscribe(b"")?;

        let mut session = Self {
            child: Some(child),
            connection,
            session_id: uuid::Uuid::new_v4().to_string(),
            shell,
            iopub,
            control,
            execute_timeout: config.execute_timeout,
            _connection_dir: connection_dir,
            _context: context,
        };

        // Drop tears the process down if readiness never arrives.
        session.wait_until_ready(config.startup_timeout)?;
        info!(kernel = spec.name; "Kernel is ready");
        Ok(session)
    }

    fn channel(
        context: &zmq::Context,
        kind: zmq::SocketType,
        connection: &ConnectionInfo,
        port: u16,
    ) -> Result<zmq::Socket, KernelError> {
        let socket = context.socket(kind)?;
        socket.set_linger(0)?;
        socket.connect(&connection.endpoint(port))?;
        Ok(socket)
    }

    /// Issue kernel_info_request until the kernel answers or the timeout
    /// elapses. Mirrors the readiness handshake Jupyter clients perform.
    fn wait_until_ready(&mut self, timeout: Duration) -> Result<(), KernelError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    return Err(KernelError::Unavailable(format!(
                        "kernel process exited during startup ({status})"
                    )));
                }
            }
            if Instant::now() >= deadline {
                return Err(KernelError::Unavailable(format!(
                    "kernel did not become ready within {timeout:?} \
                     (is the SysML kernel installed correctly?)"
                )));
            }

            let request = WireMessage::request("kernel_info_request", &self.session_id, json!({}));
            self.shell
                .send_multipart(request.to_frames(&self.connection.key)?, 0)?;

            if self.shell.poll(zmq::POLLIN, 1000)? > 0 {
                let frames = self.shell.recv_multipart(0)?;
                let reply = WireMessage::from_frames(&frames, &self.connection.key)?;
                trace!(msg_type = reply.msg_type(); "Startup reply");
                if reply.msg_type() == "kernel_info_reply" {
                    self.drain_iopub();
                    return Ok(());
                }
            }
        }
    }

    /// Discard pending iopub traffic (busy/idle chatter from startup).
    fn drain_iopub(&self) {
        while matches!(self.iopub.poll(zmq::POLLIN, 0), Ok(n) if n > 0) {
            let _ = self.iopub.recv_multipart(0);
        }
    }

    /// Execute code in the kernel and collect its outputs.
    ///
    /// Blocks until the kernel reports `status: idle` for this request,
    /// accumulating stream, display, result, and error outputs on the way.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Timeout`] when the exchange outlives the
    /// execute timeout and [`KernelError::Communication`] on malformed
    /// traffic or a dead kernel.
    pub fn execute(&mut self, code: &str) -> Result<Vec<Output>, KernelError> {
        debug!(bytes = code.len(); "Executing code in kernel");

        let request = WireMessage::request(
            "execute_request",
            &self.session_id,
            json!({
                "code": code,
                "silent": false,
                "store_history": false,
                "user_expressions": {},
                "allow_stdin": false,
                "stop_on_error": true,
            }),
        );
        let msg_id = request.header.msg_id.clone();
        self.shell
            .send_multipart(request.to_frames(&self.connection.key)?, 0)?;

        let deadline = Instant::now() + self.execute_timeout;
        let mut outputs = Vec::new();

        loop {
            if Instant::now() >= deadline {
                return Err(KernelError::Timeout(self.execute_timeout));
            }
            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    return Err(KernelError::Communication(format!(
                        "kernel process exited mid-request ({status})"
                    )));
                }
            }

            if self.iopub.poll(zmq::POLLIN, POLL_INTERVAL_MS)? == 0 {
                continue;
            }
            let frames = self.iopub.recv_multipart(0)?;
            let message = WireMessage::from_frames(&frames, &self.connection.key)?;
            if message.parent_msg_id() != Some(msg_id.as_str()) {
                continue;
            }

            trace!(msg_type = message.msg_type(); "iopub message");
            if message.msg_type() == "status" {
                if message.content["execution_state"] == "idle" {
                    break;
                }
                continue;
            }
            if let Some(output) = Output::from_iopub(message.msg_type(), &message.content) {
                outputs.push(output);
            }
        }

        // The shell reply carries nothing we use; clear it so the next
        // request starts from an empty queue.
        while self.shell.poll(zmq::POLLIN, 0)? > 0 {
            let _ = self.shell.recv_multipart(0)?;
        }

        debug!(outputs = outputs.len(); "Execution complete");
        Ok(outputs)
    }

    /// Shut the kernel down. Idempotent: later calls are no-ops.
    ///
    /// Sends a shutdown_request on the control channel, waits briefly, and
    /// kills the process if it is still running.
    pub fn shutdown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        let request = WireMessage::request(
            "shutdown_request",
            &self.session_id,
            json!({"restart": false}),
        );
        if let Ok(frames) = request.to_frames(&self.connection.key) {
            let _ = self.control.send_multipart(frames, 0);
        }

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while Instant::now() < deadline {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(status = status.to_string(); "Kernel exited cleanly");
                    return;
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(err) => {
                    warn!(error = err.to_string(); "Could not poll kernel process");
                    break;
                }
            }
        }

        warn!("Kernel ignored shutdown_request, killing process");
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Drop for KernelSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use crate::kernelspec::KernelSpec;

    use super::*;

    fn spec_with_argv(argv: &[&str]) -> ResolvedKernelSpec {
        ResolvedKernelSpec {
            name: "sysml".to_string(),
            resource_dir: std::path::PathBuf::from("/nonexistent/kernels/sysml"),
            spec: KernelSpec {
                argv: argv.iter().map(|arg| arg.to_string()).collect(),
                display_name: String::new(),
                language: String::new(),
                env: Default::default(),
            },
        }
    }

    /// A session wrapping an arbitrary child process. The channels point at
    /// the reserved loopback ports with nothing listening, which is enough
    /// for the lifecycle paths under test.
    fn session_around(child: Child) -> KernelSession {
        let connection_dir = tempfile::tempdir().unwrap();
        let connection = ConnectionInfo::generate("sysml").unwrap();
        let context = zmq::Context::new();
        let shell =
            KernelSession::channel(&context, zmq::DEALER, &connection, connection.shell_port)
                .unwrap();
        let control =
            KernelSession::channel(&context, zmq::DEALER, &connection, connection.control_port)
                .unwrap();
        let iopub =
            KernelSession::channel(&context, zmq::SUB, &connection, connection.iopub_port).unwrap();

        KernelSession {
            child: Some(child),
            connection,
            session_id: "test-session".to_string(),
            shell,
            iopub,
            control,
            execute_timeout: Duration::from_secs(1),
            _connection_dir: connection_dir,
            _context: context,
        }
    }

    #[test]
    fn shutdown_twice_is_a_no_op() {
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .spawn()
            .unwrap();
        let mut session = session_around(child);

        session.shutdown();
        session.shutdown();
        // Drop runs shutdown a third time on the way out.
    }

    #[test]
    fn shutdown_reaps_an_exited_kernel_without_waiting() {
        let child = Command::new("true").spawn().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        let mut session = session_around(child);

        let begin = Instant::now();
        session.shutdown();
        assert!(begin.elapsed() < SHUTDOWN_GRACE);
        session.shutdown();
    }

    #[test]
    fn start_reports_missing_kernel_binary() {
        let spec = spec_with_argv(&["sysviz-test-no-such-kernel-binary"]);
        let err = KernelSession::start(&spec, &SessionConfig::default()).unwrap_err();
        assert!(matches!(err, KernelError::Unavailable(_)), "got {err:?}");
        assert!(err.to_string().contains("failed to launch"));
    }

    #[test]
    fn start_fails_fast_when_kernel_exits_during_startup() {
        let spec = spec_with_argv(&["true"]);
        let config = SessionConfig {
            startup_timeout: Duration::from_secs(10),
            execute_timeout: Duration::from_secs(1),
        };

        let begin = Instant::now();
        let err = KernelSession::start(&spec, &config).unwrap_err();
        assert!(matches!(err, KernelError::Unavailable(_)), "got {err:?}");
        assert!(err.to_string().contains("exited during startup"));
        assert!(begin.elapsed() < config.startup_timeout);
    }
}
