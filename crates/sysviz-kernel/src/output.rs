//! Typed view of the kernel's iopub output stream.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Mime type carrying SVG payloads in display data.
pub const SVG_MIME: &str = "image/svg+xml";

/// A `data` bundle from display_data or execute_result messages, keyed by
/// mime type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MimeBundle(BTreeMap<String, Value>);

impl MimeBundle {
    pub fn get(&self, mime: &str) -> Option<&Value> {
        self.0.get(mime)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Text payload for a mime type. Jupyter allows either a string or a
    /// list of string fragments; fragments are joined.
    pub fn text(&self, mime: &str) -> Option<String> {
        match self.0.get(mime)? {
            Value::String(text) => Some(text.clone()),
            Value::Array(parts) => Some(
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .concat(),
            ),
            _ => None,
        }
    }

    /// The SVG payload, if one is present.
    pub fn svg(&self) -> Option<String> {
        self.text(SVG_MIME)
    }
}

/// One output item produced while executing a request.
#[derive(Debug, Clone)]
pub enum Output {
    /// stdout/stderr text from the kernel.
    Stream { name: String, text: String },
    /// Rich display payload, where `%viz` SVG arrives.
    DisplayData { data: MimeBundle },
    /// The result value of the executed code.
    ExecuteResult { data: MimeBundle },
    /// An execution error reported by the kernel.
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}

#[derive(Deserialize)]
struct StreamContent {
    name: String,
    text: String,
}

#[derive(Deserialize)]
struct DataContent {
    data: MimeBundle,
}

#[derive(Deserialize)]
struct ErrorContent {
    ename: String,
    evalue: String,
    #[serde(default)]
    traceback: Vec<String>,
}

impl Output {
    /// Decode an iopub message into an output item. Messages that carry no
    /// output (status transitions, execute_input echoes) map to `None`.
    pub fn from_iopub(msg_type: &str, content: &Value) -> Option<Self> {
        match msg_type {
            "stream" => {
                let content: StreamContent = serde_json::from_value(content.clone()).ok()?;
                Some(Self::Stream {
                    name: content.name,
                    text: content.text,
                })
            }
            "display_data" => {
                let content: DataContent = serde_json::from_value(content.clone()).ok()?;
                Some(Self::DisplayData { data: content.data })
            }
            "execute_result" => {
                let content: DataContent = serde_json::from_value(content.clone()).ok()?;
                Some(Self::ExecuteResult { data: content.data })
            }
            "error" => {
                let content: ErrorContent = serde_json::from_value(content.clone()).ok()?;
                Some(Self::Error {
                    ename: content.ename,
                    evalue: content.evalue,
                    traceback: content.traceback,
                })
            }
            _ => None,
        }
    }

    /// SVG payload carried by this output, if any.
    pub fn svg(&self) -> Option<String> {
        match self {
            Self::DisplayData { data } | Self::ExecuteResult { data } => data.svg(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn display_data_svg_is_extracted() {
        let content = json!({
            "data": {
                "image/svg+xml": "<svg xmlns=\"http://www.w3.org/2000/svg\"/>",
                "text/plain": "diagram"
            },
            "metadata": {}
        });
        let output = Output::from_iopub("display_data", &content).unwrap();
        assert_eq!(
            output.svg().unwrap(),
            "<svg xmlns=\"http://www.w3.org/2000/svg\"/>"
        );
    }

    #[test]
    fn svg_fragments_are_joined() {
        let content = json!({
            "data": {"image/svg+xml": ["<svg>", "<g/>", "</svg>"]}
        });
        let output = Output::from_iopub("execute_result", &content).unwrap();
        assert_eq!(output.svg().unwrap(), "<svg><g/></svg>");
    }

    #[test]
    fn stream_and_error_carry_no_svg() {
        let stream = Output::from_iopub("stream", &json!({"name": "stdout", "text": "ok"})).unwrap();
        assert!(stream.svg().is_none());

        let error = Output::from_iopub(
            "error",
            &json!({"ename": "SyntaxError", "evalue": "bad model", "traceback": []}),
        )
        .unwrap();
        assert!(error.svg().is_none());
        assert!(matches!(error, Output::Error { ename, .. } if ename == "SyntaxError"));
    }

    #[test]
    fn status_messages_are_not_outputs() {
        assert!(Output::from_iopub("status", &json!({"execution_state": "idle"})).is_none());
        assert!(Output::from_iopub("execute_input", &json!({"code": "x"})).is_none());
    }
}
