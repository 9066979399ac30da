//! Kernel connection files.
//!
//! Before launching a kernel, the client writes a JSON connection file
//! naming the transport, the five channel ports, and the HMAC key. The
//! kernel reads the file path from its argv (the `{connection_file}`
//! placeholder) and binds the advertised ports.

use std::{fs, io, net::TcpListener, path::Path};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signature scheme advertised to the kernel. Fixed by the protocol.
pub const SIGNATURE_SCHEME: &str = "hmac-sha256";

/// Contents of a Jupyter connection file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub transport: String,
    pub ip: String,
    pub shell_port: u16,
    pub iopub_port: u16,
    pub stdin_port: u16,
    pub control_port: u16,
    pub hb_port: u16,
    pub key: String,
    pub signature_scheme: String,
    pub kernel_name: String,
}

impl ConnectionInfo {
    /// Generate connection info on loopback with five free ports and a
    /// fresh UUID key.
    ///
    /// # Errors
    ///
    /// Returns an error if free ports cannot be reserved.
    pub fn generate(kernel_name: &str) -> io::Result<Self> {
        let ports = ephemeral_ports(5)?;
        Ok(Self {
            transport: "tcp".to_string(),
            ip: "127.0.0.1".to_string(),
            shell_port: ports[0],
            iopub_port: ports[1],
            stdin_port: ports[2],
            control_port: ports[3],
            hb_port: ports[4],
            key: Uuid::new_v4().to_string(),
            signature_scheme: SIGNATURE_SCHEME.to_string(),
            kernel_name: kernel_name.to_string(),
        })
    }

    /// Write the connection file for the kernel to read.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(path, json)
    }

    /// ZMQ endpoint string for one of the advertised ports.
    pub fn endpoint(&self, port: u16) -> String {
        format!("{}://{}:{}", self.transport, self.ip, port)
    }
}

/// Reserve `count` distinct free TCP ports.
///
/// The listeners are held simultaneously so the kernel cannot be handed
/// the same port twice, then dropped just before the kernel launches.
fn ephemeral_ports(count: usize) -> io::Result<Vec<u16>> {
    let mut listeners = Vec::with_capacity(count);
    for _ in 0..count {
        listeners.push(TcpListener::bind("127.0.0.1:0")?);
    }
    listeners
        .iter()
        .map(|listener| Ok(listener.local_addr()?.port()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_ports() {
        let info = ConnectionInfo::generate("sysml").unwrap();
        let mut ports = vec![
            info.shell_port,
            info.iopub_port,
            info.stdin_port,
            info.control_port,
            info.hb_port,
        ];
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), 5, "ports must not collide");
        assert_eq!(info.signature_scheme, SIGNATURE_SCHEME);
        assert!(!info.key.is_empty());
    }

    #[test]
    fn connection_file_round_trips_jupyter_schema() {
        let info = ConnectionInfo::generate("sysml").unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("connection.json");
        info.write_to(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for field in [
            "transport",
            "ip",
            "shell_port",
            "iopub_port",
            "stdin_port",
            "control_port",
            "hb_port",
            "key",
            "signature_scheme",
            "kernel_name",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }

        let parsed: ConnectionInfo = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.key, info.key);
        assert_eq!(parsed.shell_port, info.shell_port);
    }

    #[test]
    fn endpoint_formats_tcp_address() {
        let info = ConnectionInfo::generate("sysml").unwrap();
        assert_eq!(
            info.endpoint(info.shell_port),
            format!("tcp://127.0.0.1:{}", info.shell_port)
        );
    }
}
