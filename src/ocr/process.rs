//! Running OCR engines as external executables

use image::{GrayImage, ImageFormat};
use std::process::Command;
use tempfile::NamedTempFile;

use super::error::{OcrError, OcrResult};

/// Check that `binary` can be started, using a cheap informational flag.
pub fn ensure_available(engine: &'static str, binary: &str, probe: &str) -> OcrResult<()> {
    match Command::new(binary).arg(probe).output() {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => Err(OcrError::BackendUnavailable {
            engine,
            reason: format!("'{binary} {probe}' returned non-zero ({})", out.status),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(OcrError::BackendUnavailable {
                engine,
                reason: format!("'{binary}' binary not found in PATH"),
            })
        }
        Err(e) => Err(OcrError::BackendUnavailable {
            engine,
            reason: format!("failed to invoke '{binary}': {e}"),
        }),
    }
}

/// Write `region` to a temporary PNG that lives as long as the returned handle.
pub fn write_region(region: &GrayImage) -> OcrResult<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("ocr-region-")
        .suffix(".png")
        .tempfile()
        .map_err(|source| OcrError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
    region.save_with_format(file.path(), ImageFormat::Png)?;
    Ok(file)
}

/// Run a prepared command and return its stdout.
pub fn run(engine: &'static str, command: &mut Command) -> OcrResult<String> {
    let output = command
        .output()
        .map_err(|source| OcrError::Spawn { engine, source })?;
    if !output.status.success() {
        return Err(OcrError::ProcessFailed {
            engine,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
