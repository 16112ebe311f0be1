//! Image side-effect sink
//!
//! Decoded image bytes are handed to an [`ImageSink`] exactly once per
//! successful image request. The default sink writes them to a file and can
//! launch a viewer command on the written path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// File stem of the default output path; the extension follows the image format
pub const DEFAULT_IMAGE_STEM: &str = "output_generated_image";

/// Default output file for generated images
pub const DEFAULT_IMAGE_PATH: &str = "output_generated_image.png";

/// Default output path for images in `extension` format
pub fn default_image_path(extension: &str) -> PathBuf {
    PathBuf::from(DEFAULT_IMAGE_STEM).with_extension(extension)
}

/// Image sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write image to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for decoded image bytes
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Materialize the image and return where it ended up
    async fn deliver(&self, image: &[u8]) -> Result<PathBuf, SinkError>;
}

/// Writes images to a fixed path, overwriting the previous one
#[derive(Debug, Clone)]
pub struct FileImageSink {
    path: PathBuf,
    viewer: Option<String>,
}

impl FileImageSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            viewer: None,
        }
    }

    /// Launch `viewer <path>` after each write. Viewer failures are logged,
    /// not reported, since the image is already on disk.
    pub fn with_viewer(mut self, viewer: Option<String>) -> Self {
        self.viewer = viewer.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Spawn the viewer and reap it in the background once it exits
    fn open_viewer(&self, viewer: &str) {
        let mut child = match Command::new(viewer).arg(&self.path).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(viewer, "failed to launch image viewer: {}", e);
                return;
            }
        };
        debug!(viewer, pid = child.id(), "image viewer launched");

        let viewer = viewer.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!(%viewer, "image viewer exited"),
                Ok(status) => warn!(%viewer, %status, "image viewer exited with failure"),
                Err(e) => warn!(%viewer, "failed to wait for image viewer: {}", e),
            }
        });
    }

    fn write_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FileImageSink {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_PATH)
    }
}

#[async_trait]
impl ImageSink for FileImageSink {
    async fn deliver(&self, image: &[u8]) -> Result<PathBuf, SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        tokio::fs::write(&self.path, image)
            .await
            .map_err(|e| self.write_error(e))?;
        info!(path = %self.path.display(), bytes = image.len(), "image written");

        if let Some(viewer) = &self.viewer {
            self.open_viewer(viewer);
        }

        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_sink_writes_bytes() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.png");
        let sink = FileImageSink::new(&target);

        let written = sink.deliver(b"\x89PNG fake").await.unwrap();

        assert_eq!(written, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_file_sink_overwrites_previous_image() {
        let dir = TempDir::new().unwrap();
        let sink = FileImageSink::new(dir.path().join("out.png"));

        sink.deliver(b"first image").await.unwrap();
        sink.deliver(b"second").await.unwrap();

        assert_eq!(std::fs::read(sink.path()).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_file_sink_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("images").join("today").join("out.png");
        let sink = FileImageSink::new(&target);

        sink.deliver(b"bytes").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_file_sink_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();
        let sink = FileImageSink::new(blocker.join("out.png"));

        let err = sink.deliver(b"bytes").await.unwrap_err();
        assert!(matches!(err, SinkError::Write { .. }));
        assert!(err.to_string().contains("out.png"));
    }

    #[tokio::test]
    async fn test_missing_viewer_does_not_fail_delivery() {
        let dir = TempDir::new().unwrap();
        let sink = FileImageSink::new(dir.path().join("out.png"))
            .with_viewer(Some("definitely-not-a-real-viewer-binary".to_string()));

        assert!(sink.deliver(b"bytes").await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_viewer_is_launched_with_image_path() {
        let dir = TempDir::new().unwrap();
        let sink =
            FileImageSink::new(dir.path().join("out.png")).with_viewer(Some("true".to_string()));

        assert!(sink.deliver(b"bytes").await.is_ok());
    }

    #[test]
    fn test_blank_viewer_is_ignored() {
        let sink = FileImageSink::default().with_viewer(Some("  ".to_string()));
        assert!(sink.viewer.is_none());
        assert_eq!(sink.path(), Path::new(DEFAULT_IMAGE_PATH));
    }

    #[test]
    fn test_default_image_path_follows_extension() {
        assert_eq!(default_image_path("png"), PathBuf::from(DEFAULT_IMAGE_PATH));
        assert_eq!(
            default_image_path("jpeg"),
            PathBuf::from("output_generated_image.jpeg")
        );
    }
}
