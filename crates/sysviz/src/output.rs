//! SVG artifact persistence.

use std::{fs, path::Path};

use log::info;

use crate::error::VizError;

/// Write the SVG payload to `path`, creating parent directories as needed.
///
/// The bytes are written verbatim; nothing is inspected beyond
/// non-emptiness.
///
/// # Errors
///
/// Returns [`VizError::EmptyOutput`] for an empty payload and
/// [`VizError::Io`] for filesystem failures.
pub fn write_svg(path: &Path, svg: &[u8]) -> Result<(), VizError> {
    if svg.is_empty() {
        return Err(VizError::EmptyOutput);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, svg)?;
    info!(path = path.display().to_string(), bytes = svg.len(); "SVG written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_bytes_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.svg");
        write_svg(&path, b"<svg/>").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"<svg/>");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("deep/nested/out.svg");
        write_svg(&path, b"<svg/>").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn empty_payload_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.svg");
        let err = write_svg(&path, b"").unwrap_err();
        assert!(matches!(err, VizError::EmptyOutput));
        assert!(!path.exists());
    }
}
