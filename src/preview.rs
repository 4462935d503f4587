//! Presentation to PDF conversion through a headless LibreOffice.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::PreviewConfig;
use crate::{DriveError, Result};

/// Extensions the converter accepts.
pub const PRESENTATION_EXTENSIONS: &[&str] = &["ppt", "pptx", "odp"];

/// Maximum number of stderr characters included in a conversion error.
const STDERR_LIMIT: usize = 500;

/// Whether a file name has a convertible extension.
pub fn is_presentation(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PRESENTATION_EXTENSIONS
                .iter()
                .any(|p| p.eq_ignore_ascii_case(ext))
        })
}

/// Name of the converted document (`deck.pptx` -> `deck.pdf`).
pub fn pdf_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    format!("{stem}.pdf")
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Runs `soffice --convert-to pdf` in a private scratch directory.
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    soffice_path: String,
    timeout: Duration,
}

impl DocumentConverter {
    /// Create a converter from the preview configuration.
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            soffice_path: config.soffice_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Convert a presentation to PDF and return the PDF bytes.
    ///
    /// Each conversion gets its own temp directory and LibreOffice profile,
    /// both removed when the call returns. A converter still running at the
    /// timeout is killed.
    pub async fn convert_to_pdf(&self, file_name: &str, data: &[u8]) -> Result<Vec<u8>> {
        if !is_presentation(file_name) {
            return Err(DriveError::Validation(format!(
                "{file_name} is not a presentation"
            )));
        }
        let source_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DriveError::InvalidPath(file_name.to_string()))?;

        let workdir = tempfile::Builder::new().prefix("pptpdf_").tempdir()?;
        let source = workdir.path().join(source_name);
        tokio::fs::write(&source, data).await?;

        let profile = workdir.path().join("lo_profile");
        let mut command = Command::new(&self.soffice_path);
        command
            .arg(format!("-env:UserInstallation=file://{}", profile.display()))
            .args([
                "--headless",
                "--invisible",
                "--nologo",
                "--nofirststartwizard",
                "--norestore",
                "--convert-to",
                "pdf",
                "--outdir",
            ])
            .arg(workdir.path())
            .arg(&source)
            .env("SAL_USE_VCLPLUGIN", "svp")
            .env("JAVA_HOME", "")
            .env("JRE_HOME", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            DriveError::Conversion(format!("failed to start {}: {e}", self.soffice_path))
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(file = file_name, timeout = ?self.timeout, "Document conversion timed out");
                return Err(DriveError::Conversion(format!(
                    "conversion timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let pdf_path = workdir.path().join(pdf_name(source_name));
        match tokio::fs::read(&pdf_path).await {
            Ok(pdf) => {
                debug!(file = file_name, bytes = pdf.len(), "Converted document to PDF");
                Ok(pdf)
            }
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(file = file_name, status = %output.status, "Document conversion failed");
                Err(DriveError::Conversion(format!(
                    "soffice exited with {}: {}",
                    output
                        .status
                        .code()
                        .map_or_else(|| "a signal".to_string(), |code| format!("code {code}")),
                    truncate_chars(stderr.trim(), STDERR_LIMIT)
                )))
            }
        }
    }
}
