//! External transfer commands
//!
//! Images are fetched by shelling out to curl or wget. Both send the same
//! browser-like headers and follow up to ten redirects.

use crate::download::DownloadError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const IMAGE_ACCEPT: &str = "Accept: image/webp,image/apng,image/*,*/*;q=0.8";
const IMAGE_ACCEPT_LANGUAGE: &str = "Accept-Language: en-US,en;q=0.9";
const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: u32 = 10;
const WGET_TRIES: u32 = 3;

/// Fetches one URL into a file
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Downloads `url` to `dest`
    ///
    /// On error a partial file may be left at `dest`; the caller removes it.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Runs a transfer command and maps a non-zero exit to a transfer error
async fn run_transfer(
    program: &Path,
    args: Vec<OsString>,
    url: &str,
) -> Result<(), DownloadError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(DownloadError::Transfer {
        url: url.to_string(),
        message: format!("{} ({})", output.status, stderr.trim()),
    })
}

/// curl-based transfer backend
#[derive(Debug, Clone)]
pub struct CurlBackend {
    program: PathBuf,
    user_agent: String,
    timeout: Duration,
}

impl CurlBackend {
    /// Creates a backend running `program` (usually the result of a PATH lookup)
    pub fn new(program: impl Into<PathBuf>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    /// Command-line arguments for one transfer
    pub fn args(&self, url: &str, dest: &Path) -> Vec<OsString> {
        vec![
            "-s".into(),
            "-L".into(),
            "-o".into(),
            dest.as_os_str().to_owned(),
            "--user-agent".into(),
            self.user_agent.clone().into(),
            "--referer".into(),
            url.into(),
            "-H".into(),
            IMAGE_ACCEPT.into(),
            "-H".into(),
            IMAGE_ACCEPT_LANGUAGE.into(),
            "--compressed".into(),
            "--connect-timeout".into(),
            CONNECT_TIMEOUT_SECS.to_string().into(),
            "--max-time".into(),
            self.timeout.as_secs().to_string().into(),
            "--max-redirs".into(),
            MAX_REDIRECTS.to_string().into(),
            url.into(),
        ]
    }
}

#[async_trait]
impl TransferBackend for CurlBackend {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        run_transfer(&self.program, self.args(url, dest), url).await
    }
}

/// wget-based transfer backend
#[derive(Debug, Clone)]
pub struct WgetBackend {
    program: PathBuf,
    user_agent: String,
}

impl WgetBackend {
    pub fn new(program: impl Into<PathBuf>, user_agent: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Command-line arguments for one transfer
    pub fn args(&self, url: &str, dest: &Path) -> Vec<OsString> {
        vec![
            "-q".into(),
            "-O".into(),
            dest.as_os_str().to_owned(),
            format!("--user-agent={}", self.user_agent).into(),
            format!("--referer={}", url).into(),
            format!("--header={}", IMAGE_ACCEPT).into(),
            format!("--header={}", IMAGE_ACCEPT_LANGUAGE).into(),
            format!("--timeout={}", CONNECT_TIMEOUT_SECS).into(),
            format!("--tries={}", WGET_TRIES).into(),
            format!("--max-redirect={}", MAX_REDIRECTS).into(),
            url.into(),
        ]
    }
}

#[async_trait]
impl TransferBackend for WgetBackend {
    fn name(&self) -> &'static str {
        "wget"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        run_transfer(&self.program, self.args(url, dest), url).await
    }
}
