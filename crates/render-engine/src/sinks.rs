//! Export sinks and the collaborators they write through.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use photostamp_common::{PhotostampError, PhotostampResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::{ExportBatch, ExportMethod, ExportSink, ProgressReporter, TierOutcome};

/// Delivers a named buffer to the user, like a browser download.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Deliver `bytes` as `file_name`; returns where it ended up.
    async fn download(&self, file_name: &str, bytes: Vec<u8>) -> PhotostampResult<PathBuf>;
}

/// Downloads into a folder, never overwriting existing files.
#[derive(Debug, Clone)]
pub struct FolderDownloader {
    dir: PathBuf,
}

impl FolderDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl Downloader for FolderDownloader {
    async fn download(&self, file_name: &str, bytes: Vec<u8>) -> PhotostampResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = unique_path(&self.dir, file_name);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "Downloaded file");
        Ok(path)
    }
}

/// `dir/name`, or `dir/stem (n).ext` for the first free `n`.
fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Lets the user choose a destination folder.
#[async_trait::async_trait]
pub trait DirectoryPicker: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// The chosen folder, or a `Cancelled` error if the user backed out.
    async fn pick_directory(&self) -> PhotostampResult<PathBuf>;
}

/// A picker that always answers with the same folder.
#[derive(Debug, Clone)]
pub struct PresetDirectoryPicker {
    dir: PathBuf,
}

impl PresetDirectoryPicker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl DirectoryPicker for PresetDirectoryPicker {
    fn name(&self) -> &str {
        "preset"
    }

    async fn pick_directory(&self) -> PhotostampResult<PathBuf> {
        Ok(self.dir.clone())
    }
}

async fn write_batch_to(
    dir: &Path,
    batch: &ExportBatch<'_>,
    progress: &mut ProgressReporter<'_>,
) -> PhotostampResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    for index in 0..batch.len() {
        let bytes = batch.encode(index)?;
        tokio::fs::write(dir.join(batch.file_name(index)), bytes).await?;
        progress.photo_done(index + 1);
    }
    Ok(())
}

/// Writes into the app-managed folder of the native shell.
#[derive(Debug, Clone)]
pub struct NativeFolderSink {
    dir: PathBuf,
}

impl NativeFolderSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl ExportSink for NativeFolderSink {
    fn method(&self) -> ExportMethod {
        ExportMethod::NativeFilesystem
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn attempt(
        &mut self,
        batch: &ExportBatch<'_>,
        progress: &mut ProgressReporter<'_>,
    ) -> TierOutcome {
        match write_batch_to(&self.dir, batch, progress).await {
            Ok(()) => TierOutcome::Completed,
            Err(e) => TierOutcome::Terminal(e),
        }
    }
}

/// Asks once for a folder, then writes every photo into it.
pub struct DirectoryPickerSink {
    picker: Box<dyn DirectoryPicker>,
}

impl DirectoryPickerSink {
    pub fn new(picker: Box<dyn DirectoryPicker>) -> Self {
        Self { picker }
    }
}

#[async_trait::async_trait]
impl ExportSink for DirectoryPickerSink {
    fn method(&self) -> ExportMethod {
        ExportMethod::Filesystem
    }

    fn is_available(&self) -> bool {
        self.picker.is_available()
    }

    async fn attempt(
        &mut self,
        batch: &ExportBatch<'_>,
        progress: &mut ProgressReporter<'_>,
    ) -> TierOutcome {
        let dir = match self.picker.pick_directory().await {
            Ok(dir) => dir,
            Err(e) if e.is_cancelled() => return TierOutcome::Terminal(e),
            Err(e) => return TierOutcome::FallThrough(e),
        };
        tracing::info!(picker = self.picker.name(), dir = %dir.display(), "Writing to picked folder");
        match write_batch_to(&dir, batch, progress).await {
            Ok(()) => TierOutcome::Completed,
            Err(e) => TierOutcome::FallThrough(e),
        }
    }
}

/// Packs every photo into one deflate-compressed zip download.
pub struct ArchiveSink {
    downloader: Arc<dyn Downloader>,
}

impl ArchiveSink {
    pub fn new(downloader: Arc<dyn Downloader>) -> Self {
        Self { downloader }
    }
}

/// Build the archive for `batch` in memory.
pub fn build_archive(
    batch: &ExportBatch<'_>,
    progress: &mut ProgressReporter<'_>,
) -> PhotostampResult<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for index in 0..batch.len() {
        let bytes = batch.encode(index)?;
        zip.start_file(batch.file_name(index), options)
            .map_err(|e| PhotostampError::export(format!("Failed to add archive entry: {e}")))?;
        zip.write_all(&bytes)?;
        progress.photo_done(index + 1);
    }
    let cursor = zip
        .finish()
        .map_err(|e| PhotostampError::export(format!("Failed to finish archive: {e}")))?;
    Ok(cursor.into_inner())
}

#[async_trait::async_trait]
impl ExportSink for ArchiveSink {
    fn method(&self) -> ExportMethod {
        ExportMethod::Zip
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn attempt(
        &mut self,
        batch: &ExportBatch<'_>,
        progress: &mut ProgressReporter<'_>,
    ) -> TierOutcome {
        let archive = match build_archive(batch, progress) {
            Ok(archive) => archive,
            Err(e) => return TierOutcome::FallThrough(e),
        };
        tracing::debug!(size = archive.len(), "Archive built");
        match self.downloader.download(&batch.archive_name(), archive).await {
            Ok(_) => TierOutcome::Completed,
            Err(e) => TierOutcome::FallThrough(e),
        }
    }
}

/// One download per photo, paced by a fixed delay.
pub struct SequentialDownloadSink {
    downloader: Arc<dyn Downloader>,
    delay: Duration,
}

impl SequentialDownloadSink {
    pub fn new(downloader: Arc<dyn Downloader>, delay: Duration) -> Self {
        Self { downloader, delay }
    }
}

#[async_trait::async_trait]
impl ExportSink for SequentialDownloadSink {
    fn method(&self) -> ExportMethod {
        ExportMethod::Sequential
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn attempt(
        &mut self,
        batch: &ExportBatch<'_>,
        progress: &mut ProgressReporter<'_>,
    ) -> TierOutcome {
        for index in 0..batch.len() {
            let bytes = match batch.encode(index) {
                Ok(bytes) => bytes,
                Err(e) => return TierOutcome::Terminal(e),
            };
            if let Err(e) = self.downloader.download(&batch.file_name(index), bytes).await {
                return TierOutcome::Terminal(e);
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            progress.photo_done(index + 1);
        }
        TierOutcome::Completed
    }
}
