use crate::download::DownloadError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Reads the pixel dimensions of an image file
#[async_trait]
pub trait DimensionProbe: Send + Sync {
    /// Returns `(width, height)` in pixels
    async fn dimensions(&self, path: &Path) -> Result<(u32, u32), DownloadError>;
}

/// ImageMagick `identify` probe
#[derive(Debug, Clone)]
pub struct IdentifyProbe {
    program: PathBuf,
}

impl IdentifyProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl DimensionProbe for IdentifyProbe {
    async fn dimensions(&self, path: &Path) -> Result<(u32, u32), DownloadError> {
        let output = Command::new(&self.program)
            .args(["-ping", "-format", "%w %h"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::Probe {
                path: path.to_path_buf(),
                message: format!("identify failed: {} ({})", output.status, stderr.trim()),
            });
        }

        parse_dimensions(&stdout).ok_or_else(|| DownloadError::Probe {
            path: path.to_path_buf(),
            message: format!("unexpected identify output: {:?}", stdout.trim()),
        })
    }
}

/// Parses `"<width> <height>"` output
///
/// Both numbers must be positive. Anything after the second number is ignored.
///
/// # Examples
///
/// ```
/// use image_harvester::download::parse_dimensions;
///
/// assert_eq!(parse_dimensions("640 480\n"), Some((640, 480)));
/// assert_eq!(parse_dimensions("0 480"), None);
/// assert_eq!(parse_dimensions(""), None);
/// ```
pub fn parse_dimensions(output: &str) -> Option<(u32, u32)> {
    let mut fields = output.split_whitespace();
    let width: u32 = fields.next()?.parse().ok()?;
    let height: u32 = fields.next()?.parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}
