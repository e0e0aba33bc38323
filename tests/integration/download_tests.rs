//! Integration tests for the downloader
//!
//! Transfers and dimension probes are replaced by in-process fakes so no
//! external tools are needed.

use async_trait::async_trait;
use image_harvester::download::{
    DimensionProbe, DownloadError, DownloadSummary, Downloader, TransferBackend,
};
use image_harvester::HarvestError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Writes canned bytes per URL; unknown URLs fail the transfer
struct FakeBackend {
    responses: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeBackend {
    fn new(responses: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            responses: responses
                .iter()
                .map(|(url, body)| (url.to_string(), body.as_bytes().to_vec()))
                .collect(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    async fn write_response(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        match self.responses.get(url) {
            Some(body) => {
                tokio::fs::write(dest, body).await?;
                Ok(())
            }
            None => {
                // Leave a partial file behind like a real tool would
                tokio::fs::write(dest, b"partial").await?;
                Err(DownloadError::Transfer {
                    url: url.to_string(),
                    message: "exit status: 22".to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl TransferBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = self.write_response(url, dest).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Reports fixed dimensions, or fails for files whose content is `corrupt`
struct FakeProbe {
    width: u32,
    height: u32,
}

#[async_trait]
impl DimensionProbe for FakeProbe {
    async fn dimensions(&self, path: &Path) -> Result<(u32, u32), DownloadError> {
        let content = tokio::fs::read(path).await?;
        if content == b"corrupt" {
            return Err(DownloadError::Probe {
                path: path.to_path_buf(),
                message: "no image data".to_string(),
            });
        }
        Ok((self.width, self.height))
    }
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn test_downloads_into_output_dir() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new(&[
        ("https://example.com/a/cat.jpg", "jpeg-bytes"),
        ("https://example.com/b/My%20Cat.png?w=200", "png"),
    ]);
    let downloader = Downloader::with_backend(dir.path(), 2, backend.clone());

    let summary = downloader
        .download_images(&urls(&[
            "https://example.com/a/cat.jpg",
            "https://example.com/b/My%20Cat.png?w=200",
        ]))
        .await
        .unwrap();

    assert_eq!(
        summary,
        DownloadSummary {
            succeeded: 2,
            failed: 0,
            filtered: 0,
            bytes: 13,
        }
    );
    assert_eq!(std::fs::read(dir.path().join("cat.jpg")).unwrap(), b"jpeg-bytes");
    assert!(dir.path().join("My_Cat.png").exists());
}

#[tokio::test]
async fn test_empty_download_counts_as_failed_and_is_removed() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new(&[("https://example.com/empty-cat.jpg", "")]);
    let downloader = Downloader::with_backend(dir.path(), 1, backend);

    let summary = downloader
        .download_images(&urls(&["https://example.com/empty-cat.jpg"]))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 0);
    assert!(!dir.path().join("empty-cat.jpg").exists());
}

#[tokio::test]
async fn test_failed_transfer_removes_partial_file() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new(&[]);
    let downloader = Downloader::with_backend(dir.path(), 1, backend);

    let summary = downloader
        .download_images(&urls(&["https://example.com/gone-cat.jpg"]))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert!(!dir.path().join("gone-cat.jpg").exists());
}

#[tokio::test]
async fn test_small_image_is_filtered_and_removed() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new(&[("https://example.com/cat.jpg", "300px wide")]);
    let downloader = Downloader::with_backend(dir.path(), 1, backend).with_dimension_filter(
        500,
        0,
        Arc::new(FakeProbe {
            width: 300,
            height: 900,
        }),
    );

    let summary = downloader
        .download_images(&urls(&["https://example.com/cat.jpg"]))
        .await
        .unwrap();

    assert_eq!(summary.filtered, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.succeeded, 0);
    assert!(!dir.path().join("cat.jpg").exists());
}

#[tokio::test]
async fn test_probe_failure_counts_as_failed() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new(&[
        ("https://example.com/broken-cat.jpg", "corrupt"),
        ("https://example.com/big-cat.jpg", "fine"),
    ]);
    let downloader = Downloader::with_backend(dir.path(), 2, backend).with_dimension_filter(
        500,
        500,
        Arc::new(FakeProbe {
            width: 800,
            height: 600,
        }),
    );

    let summary = downloader
        .download_images(&urls(&[
            "https://example.com/broken-cat.jpg",
            "https://example.com/big-cat.jpg",
        ]))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(!dir.path().join("broken-cat.jpg").exists());
    assert!(dir.path().join("big-cat.jpg").exists());
}

#[tokio::test]
async fn test_existing_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("cat.jpg"), b"already here").unwrap();

    let backend = FakeBackend::new(&[("https://example.com/cat.jpg", "new bytes")]);
    let downloader = Downloader::with_backend(dir.path(), 1, backend.clone());

    let summary = downloader
        .download_images(&urls(&["https://example.com/cat.jpg"]))
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.bytes, 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        std::fs::read(dir.path().join("cat.jpg")).unwrap(),
        b"already here"
    );
}

#[tokio::test]
async fn test_empty_url_list_is_an_error() {
    let dir = TempDir::new().unwrap();
    let downloader = Downloader::with_backend(dir.path(), 1, FakeBackend::new(&[]));

    let result = downloader.download_images(&[]).await;
    assert!(matches!(result, Err(HarvestError::NoImages)));
}

#[tokio::test]
async fn test_creates_missing_output_dir() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("nested").join("cats");
    let backend = FakeBackend::new(&[("https://example.com/cat.gif", "GIF89a")]);
    let downloader = Downloader::with_backend(&output_dir, 3, backend);

    let summary = downloader
        .download_images(&urls(&["https://example.com/cat.gif"]))
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert!(output_dir.join("cat.gif").exists());
}

#[tokio::test]
async fn test_transfers_never_exceed_concurrency() {
    let dir = TempDir::new().unwrap();
    let all: Vec<String> = (0..25)
        .map(|i| format!("https://example.com/cat-{}.jpg", i))
        .collect();
    let pairs: Vec<(&str, &str)> = all.iter().map(|u| (u.as_str(), "img")).collect();
    let backend = FakeBackend::new(&pairs);
    let downloader = Downloader::with_backend(dir.path(), 3, backend.clone());

    let summary = downloader.download_images(&all).await.unwrap();

    assert_eq!(summary.succeeded, 25);
    assert_eq!(summary.total(), 25);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 25);

    let peak = backend.peak_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "{} transfers ran at once", peak);
    assert!(peak > 1, "transfers never overlapped");
}
