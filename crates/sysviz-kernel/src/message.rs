//! Jupyter wire-protocol codec.
//!
//! Messages cross the ZMQ channels as multipart frames:
//!
//! ```text
//! [identities…] <IDS|MSG> signature header parent_header metadata content
//! ```
//!
//! The signature is the hex HMAC-SHA256 of the four JSON frames, keyed by
//! the connection file's `key`. Version 5.3 of the protocol is spoken; the
//! SysML kernel does not rely on anything newer.

use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::KernelError;

/// Frame separating routing identities from message payload.
pub const DELIMITER: &[u8] = b"<IDS|MSG>";

/// Protocol version stamped into every header.
pub const PROTOCOL_VERSION: &str = "5.3";

type HmacSha256 = Hmac<Sha256>;

/// Message header, common to requests and replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub msg_id: String,
    pub session: String,
    pub username: String,
    pub date: String,
    pub msg_type: String,
    pub version: String,
}

impl Header {
    /// Fresh header for an outgoing request.
    pub fn new(msg_type: &str, session: &str) -> Self {
        Self {
            msg_id: Uuid::new_v4().to_string(),
            session: session.to_string(),
            username: "sysviz".to_string(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            msg_type: msg_type.to_string(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }
}

/// A decoded protocol message.
#[derive(Debug, Clone)]
pub struct WireMessage {
    pub identities: Vec<Vec<u8>>,
    pub header: Header,
    pub parent_header: Option<Header>,
    pub metadata: Value,
    pub content: Value,
}

impl WireMessage {
    /// Build an outgoing request with the given content.
    pub fn request(msg_type: &str, session: &str, content: Value) -> Self {
        Self {
            identities: Vec::new(),
            header: Header::new(msg_type, session),
            parent_header: None,
            metadata: Value::Object(Default::default()),
            content,
        }
    }

    pub fn msg_type(&self) -> &str {
        &self.header.msg_type
    }

    /// The msg_id of the request this message answers, if any.
    pub fn parent_msg_id(&self) -> Option<&str> {
        self.parent_header.as_ref().map(|header| header.msg_id.as_str())
    }

    /// Serialize and sign into multipart frames ready for `send_multipart`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Communication`] if a payload fails to
    /// serialize.
    pub fn to_frames(&self, key: &str) -> Result<Vec<Vec<u8>>, KernelError> {
        let header = serde_json::to_vec(&self.header)?;
        let parent = match &self.parent_header {
            Some(parent) => serde_json::to_vec(parent)?,
            None => b"{}".to_vec(),
        };
        let metadata = serde_json::to_vec(&self.metadata)?;
        let content = serde_json::to_vec(&self.content)?;

        let signature = sign(key, [&header, &parent, &metadata, &content])?;

        let mut frames = self.identities.clone();
        frames.push(DELIMITER.to_vec());
        frames.push(signature.into_bytes());
        frames.push(header);
        frames.push(parent);
        frames.push(metadata);
        frames.push(content);
        Ok(frames)
    }

    /// Parse received multipart frames, verifying the signature.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Communication`] on missing frames, a
    /// signature mismatch, or unparseable JSON payloads.
    pub fn from_frames(frames: &[Vec<u8>], key: &str) -> Result<Self, KernelError> {
        let delim = frames
            .iter()
            .position(|frame| frame == DELIMITER)
            .ok_or_else(|| {
                KernelError::Communication("message frames lack the <IDS|MSG> delimiter".into())
            })?;

        let payload = &frames[delim + 1..];
        if payload.len() < 5 {
            return Err(KernelError::Communication(format!(
                "expected 5 payload frames after delimiter, got {}",
                payload.len()
            )));
        }

        let received = String::from_utf8_lossy(&payload[0]);
        let expected = sign(key, [&payload[1], &payload[2], &payload[3], &payload[4]])?;
        if received != expected {
            return Err(KernelError::Communication(
                "message signature mismatch".into(),
            ));
        }

        let header: Header = serde_json::from_slice(&payload[1])?;
        let parent_header = parse_optional_header(&payload[2])?;
        let metadata: Value = serde_json::from_slice(&payload[3])?;
        let content: Value = serde_json::from_slice(&payload[4])?;

        Ok(Self {
            identities: frames[..delim].to_vec(),
            header,
            parent_header,
            metadata,
            content,
        })
    }
}

/// Parent headers arrive as `{}` on unparented messages.
fn parse_optional_header(raw: &[u8]) -> Result<Option<Header>, KernelError> {
    let value: Value = serde_json::from_slice(raw)?;
    match &value {
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Null => Ok(None),
        _ => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Hex HMAC-SHA256 over the payload frames.
fn sign(key: &str, parts: [&[u8]; 4]) -> Result<String, KernelError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|err| KernelError::Communication(format!("invalid signing key: {err}")))?;
    for part in parts {
        mac.update(part);
    }
    let digest = mac.finalize().into_bytes();
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}
