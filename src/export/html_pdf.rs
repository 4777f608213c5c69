//! PDF export through the external `wkhtmltopdf` renderer

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result};

/// Renders minimal HTML pages to PDF with a local `wkhtmltopdf` binary
#[derive(Debug, Clone)]
pub struct HtmlPdfRenderer {
    binary: PathBuf,
}

impl HtmlPdfRenderer {
    /// Use `binary` if given, otherwise look `wkhtmltopdf` up on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if the binary cannot be found
    pub fn new(binary: Option<&Path>) -> Result<Self> {
        let binary = match binary {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => {
                return Err(Error::Export(format!(
                    "wkhtmltopdf not found at {}",
                    path.display()
                )));
            }
            None => which::which("wkhtmltopdf")
                .map_err(|e| Error::Export(format!("wkhtmltopdf not found on PATH: {e}")))?,
        };

        tracing::debug!(binary = %binary.display(), "using wkhtmltopdf");
        Ok(Self { binary })
    }

    /// Render `content` and write the PDF to `{dir}/{stem}.pdf`
    ///
    /// # Errors
    ///
    /// Returns error if the renderer fails or exits unsuccessfully
    pub fn save_pdf(&self, content: &str, dir: &Path, stem: &str) -> Result<PathBuf> {
        let output_path = dir.join(format!("{stem}.pdf"));

        let mut input = tempfile::Builder::new()
            .prefix("summarizer-")
            .suffix(".html")
            .tempfile()
            .map_err(|e| Error::Export(format!("failed to create temp file: {e}")))?;
        input
            .write_all(render_html(content).as_bytes())
            .map_err(|e| Error::Export(format!("failed to write HTML: {e}")))?;

        let output = Command::new(&self.binary)
            .args(["--quiet", "--encoding", "UTF-8"])
            .arg(input.path())
            .arg(&output_path)
            .output()
            .map_err(|e| Error::Export(format!("failed to run wkhtmltopdf: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Export(format!(
                "wkhtmltopdf exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!(path = %output_path.display(), "pdf saved");
        Ok(output_path)
    }
}

/// Wrap `content` in a minimal UTF-8 HTML page
#[must_use]
pub fn render_html(content: &str) -> String {
    let body = escape_html(content).replace('\n', "<br>\n");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{
            font-family: Arial, sans-serif;
            font-size: 14px;
        }}
    </style>
</head>
<body>
    {body}
</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
