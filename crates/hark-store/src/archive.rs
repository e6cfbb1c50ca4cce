//! Durable copy of every uploaded audio stream.
//!
//! Each request gets exactly one file, named by a millisecond-precision
//! timestamp, appended to as audio passes through the bridge. Files are
//! private to their request; there is no cross-request contention.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use hark_core::errors::TranscribeError;

/// A directory of archived uploads.
pub struct AudioArchive {
    dir: PathBuf,
}

impl AudioArchive {
    /// Open the archive, creating `dir` and its parents if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Open a fresh archive file for one request.
    pub async fn create(&self) -> Result<AudioFile, TranscribeError> {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
        let path = self.dir.join(format!("audio-{timestamp}.wav"));
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                TranscribeError::StorageWrite(format!("{}: {e}", path.display()))
            })?;
        Ok(AudioFile {
            file,
            path,
            bytes_written: 0,
        })
    }
}

/// Append-only writer for one request's audio.
pub struct AudioFile {
    file: File,
    path: PathBuf,
    bytes_written: u64,
}

impl AudioFile {
    pub async fn append(&mut self, data: &[u8]) -> Result<(), TranscribeError> {
        self.file.write_all(data).await.map_err(|e| {
            TranscribeError::StorageWrite(format!("{}: {e}", self.path.display()))
        })?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flush buffered bytes and log what was archived.
    pub async fn close(mut self) -> Result<(), TranscribeError> {
        self.file.flush().await.map_err(|e| {
            TranscribeError::StorageWrite(format!("{}: {e}", self.path.display()))
        })?;
        info!(path = %self.path.display(), size = self.bytes_written, "archived audio");
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let archive = AudioArchive::new(&nested).unwrap();
        assert!(archive.dir().is_dir());
    }

    #[tokio::test]
    async fn appended_bytes_land_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let archive = AudioArchive::new(root.path()).unwrap();

        let mut file = archive.create().await.unwrap();
        file.append(b"first ").await.unwrap();
        file.append(b"second").await.unwrap();
        assert_eq!(file.bytes_written(), 12);
        let path = file.path().to_path_buf();
        file.close().await.unwrap();

        let on_disk = std::fs::read(path).unwrap();
        assert_eq!(on_disk, b"first second");
    }

    #[tokio::test]
    async fn file_names_carry_timestamp_prefix_and_extension() {
        let root = tempfile::tempdir().unwrap();
        let archive = AudioArchive::new(root.path()).unwrap();

        let file = archive.create().await.unwrap();
        let name = file.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("audio-"), "unexpected name {name}");
        assert!(name.ends_with(".wav"), "unexpected name {name}");
        // audio-YYYYMMDD-HHMMSS.mmm.wav
        assert_eq!(name.len(), "audio-20240101-120000.000.wav".len());
    }

    #[tokio::test]
    async fn unwritable_directory_is_storage_error() {
        let root = tempfile::tempdir().unwrap();
        let archive = AudioArchive::new(root.path()).unwrap();
        // Remove the directory out from under the archive.
        std::fs::remove_dir_all(root.path()).unwrap();

        let result = archive.create().await;
        assert!(matches!(result, Err(TranscribeError::StorageWrite(_))));
    }

    #[tokio::test]
    async fn empty_file_is_created_even_with_no_appends() {
        let root = tempfile::tempdir().unwrap();
        let archive = AudioArchive::new(root.path()).unwrap();

        let file = archive.create().await.unwrap();
        let path = file.path().to_path_buf();
        file.close().await.unwrap();

        assert_eq!(std::fs::metadata(path).unwrap().len(), 0);
    }
}
