//! Export orchestration: naming, progress, and the tiered fallback chain.
//!
//! [`Exporter::export_all`] walks an ordered list of [`ExportSink`]s. Each
//! sink either completes the batch, fails terminally (the call ends with
//! `success: false`), or falls through to the next sink.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use photostamp_common::{Clock, PhotostampError, PhotostampResult};
use photostamp_photo_model::{DownloadFormat, Photo, RenderSettings};
use serde::{Deserialize, Serialize};

use crate::compositor::Compositor;
use crate::encode::encode_composite;
use crate::sinks::{
    ArchiveSink, DirectoryPicker, DirectoryPickerSink, Downloader, NativeFolderSink,
    SequentialDownloadSink,
};

/// Pause between downloads in the sequential tier.
pub const DEFAULT_SEQUENTIAL_DELAY: Duration = Duration::from_millis(400);

/// Which mechanism handled (or last handled) an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMethod {
    None,
    NativeFilesystem,
    Filesystem,
    Zip,
    Sequential,
}

impl ExportMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NativeFilesystem => "native-filesystem",
            Self::Filesystem => "filesystem",
            Self::Zip => "zip",
            Self::Sequential => "sequential",
        }
    }
}

impl fmt::Display for ExportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a bulk export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub method: ExportMethod,
    pub success: bool,
}

impl ExportOutcome {
    pub fn none() -> Self {
        Self {
            method: ExportMethod::None,
            success: false,
        }
    }
}

/// A single exported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub method: ExportMethod,
    pub path: PathBuf,
}

/// `TS_YYYYMMDD_HHMMSS_NNN.ext`, numbered from 1.
pub fn file_name(started_at: &NaiveDateTime, index: usize, format: DownloadFormat) -> String {
    format!(
        "TS_{}_{:03}.{}",
        started_at.format("%Y%m%d_%H%M%S"),
        index + 1,
        format.extension()
    )
}

/// `Timestamp_YYYYMMDD.zip`.
pub fn archive_name(started_at: &NaiveDateTime) -> String {
    format!("Timestamp_{}.zip", started_at.format("%Y%m%d"))
}

/// Photos to export and how to render them.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub photos: &'a [Photo],
    pub settings: &'a RenderSettings,
    pub format: DownloadFormat,
    pub quality: f32,
}

/// One export call's worth of work, shared by every tier.
pub struct ExportBatch<'a> {
    request: ExportRequest<'a>,
    compositor: &'a Compositor,
    started_at: NaiveDateTime,
}

impl<'a> ExportBatch<'a> {
    pub fn new(
        request: ExportRequest<'a>,
        compositor: &'a Compositor,
        started_at: NaiveDateTime,
    ) -> Self {
        Self {
            request,
            compositor,
            started_at,
        }
    }

    pub fn len(&self) -> usize {
        self.request.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request.photos.is_empty()
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn format(&self) -> DownloadFormat {
        self.request.format
    }

    pub fn file_name(&self, index: usize) -> String {
        file_name(&self.started_at, index, self.request.format)
    }

    pub fn archive_name(&self) -> String {
        archive_name(&self.started_at)
    }

    /// Render and encode photo `index` at full output size.
    pub fn encode(&self, index: usize) -> PhotostampResult<Vec<u8>> {
        let photo = self
            .request
            .photos
            .get(index)
            .ok_or_else(|| PhotostampError::export(format!("No photo at index {index}")))?;
        let composite = self
            .compositor
            .render_photo(photo, self.request.settings, 1.0)?;
        encode_composite(&composite, self.request.format, self.request.quality)
    }
}

/// Forwards per-photo progress to a callback.
///
/// Counts are reported at most once each and only in increasing order, so a
/// later tier redoing photos an earlier tier already reported stays silent
/// until it passes the previous high-water mark.
pub struct ProgressReporter<'a> {
    total: usize,
    reported: usize,
    callback: &'a mut (dyn FnMut(usize, usize) + Send),
}

impl<'a> ProgressReporter<'a> {
    pub fn new(total: usize, callback: &'a mut (dyn FnMut(usize, usize) + Send)) -> Self {
        Self {
            total,
            reported: 0,
            callback,
        }
    }

    /// Record that `completed` photos are done in the current tier.
    pub fn photo_done(&mut self, completed: usize) {
        if completed > self.reported && completed <= self.total {
            self.reported = completed;
            (self.callback)(completed, self.total);
        }
    }

    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// How a tier ended.
#[derive(Debug)]
pub enum TierOutcome {
    /// Every photo was delivered.
    Completed,
    /// Stop trying further tiers; the export failed.
    Terminal(PhotostampError),
    /// Try the next tier.
    FallThrough(PhotostampError),
}

/// One export mechanism in the fallback chain.
#[async_trait::async_trait]
pub trait ExportSink: Send + Sync {
    fn method(&self) -> ExportMethod;

    /// Whether this mechanism can be used in the current environment.
    fn is_available(&self) -> bool;

    async fn attempt(
        &mut self,
        batch: &ExportBatch<'_>,
        progress: &mut ProgressReporter<'_>,
    ) -> TierOutcome;
}

/// Where a single-photo export is written.
pub enum SingleTarget {
    /// App-managed folder of the native shell.
    NativeFolder(PathBuf),
    /// A direct download.
    Download(Arc<dyn Downloader>),
}

/// What the runtime environment offers for exporting.
pub struct ExportEnvironment {
    /// App export folder when running inside the native shell.
    pub native_dir: Option<PathBuf>,
    pub downloader: Arc<dyn Downloader>,
    pub picker: Option<Box<dyn DirectoryPicker>>,
    pub sequential_delay: Duration,
}

/// Drives single and bulk exports.
pub struct Exporter {
    compositor: Arc<Compositor>,
    clock: Arc<dyn Clock>,
    single: SingleTarget,
    sinks: Vec<Box<dyn ExportSink>>,
}

impl Exporter {
    /// An exporter with no bulk tiers; add them with [`Exporter::with_sink`].
    pub fn new(compositor: Arc<Compositor>, clock: Arc<dyn Clock>, single: SingleTarget) -> Self {
        Self {
            compositor,
            clock,
            single,
            sinks: Vec::new(),
        }
    }

    /// The standard tier order for `env`.
    ///
    /// Inside the native shell only the app folder is used. Otherwise the
    /// chain is directory picker (when present), archive, then sequential
    /// downloads.
    pub fn standard(compositor: Arc<Compositor>, clock: Arc<dyn Clock>, env: ExportEnvironment) -> Self {
        if let Some(dir) = env.native_dir {
            return Self::new(compositor, clock, SingleTarget::NativeFolder(dir.clone()))
                .with_sink(Box::new(NativeFolderSink::new(dir)));
        }

        let mut exporter = Self::new(
            compositor,
            clock,
            SingleTarget::Download(env.downloader.clone()),
        );
        if let Some(picker) = env.picker {
            exporter = exporter.with_sink(Box::new(DirectoryPickerSink::new(picker)));
        }
        exporter
            .with_sink(Box::new(ArchiveSink::new(env.downloader.clone())))
            .with_sink(Box::new(SequentialDownloadSink::new(
                env.downloader,
                env.sequential_delay,
            )))
    }

    pub fn with_sink(mut self, sink: Box<dyn ExportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Configured tiers in order, with their availability.
    pub fn tiers(&self) -> Vec<(ExportMethod, bool)> {
        self.sinks
            .iter()
            .map(|sink| (sink.method(), sink.is_available()))
            .collect()
    }

    /// Render, encode, and write one photo through the single-file target.
    pub async fn export_one(
        &self,
        photo: &Photo,
        settings: &RenderSettings,
        format: DownloadFormat,
        quality: f32,
        index: usize,
    ) -> PhotostampResult<ExportedFile> {
        let name = file_name(&self.clock.now_local(), index, format);
        self.compositor.warn_missing_glyphs(&photo.time_value, settings);
        let composite = self.compositor.render_photo(photo, settings, 1.0)?;
        let bytes = encode_composite(&composite, format, quality)?;

        let exported = match &self.single {
            SingleTarget::NativeFolder(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let path = dir.join(&name);
                tokio::fs::write(&path, bytes).await?;
                ExportedFile {
                    method: ExportMethod::NativeFilesystem,
                    path,
                }
            }
            SingleTarget::Download(downloader) => ExportedFile {
                method: ExportMethod::Sequential,
                path: downloader.download(&name, bytes).await?,
            },
        };
        tracing::info!(path = %exported.path.display(), method = %exported.method, "Exported photo");
        Ok(exported)
    }

    /// Export every photo through the first tier that succeeds.
    ///
    /// `on_progress(completed, total)` fires after each photo is delivered.
    /// An empty request returns `{none, false}` without reporting progress.
    pub async fn export_all(
        &mut self,
        request: ExportRequest<'_>,
        mut on_progress: impl FnMut(usize, usize) + Send,
    ) -> ExportOutcome {
        let total = request.photos.len();
        if total == 0 {
            tracing::info!("Nothing to export");
            return ExportOutcome::none();
        }

        self.compositor
            .warn_missing_glyphs(&request.photos[0].time_value, request.settings);

        // One clock reading names every file of this call.
        let batch = ExportBatch::new(request, &self.compositor, self.clock.now_local());
        let mut progress = ProgressReporter::new(total, &mut on_progress);

        for sink in self.sinks.iter_mut() {
            let method = sink.method();
            if !sink.is_available() {
                tracing::debug!(%method, "Export tier unavailable");
                continue;
            }

            tracing::info!(%method, photos = total, "Attempting export tier");
            match sink.attempt(&batch, &mut progress).await {
                TierOutcome::Completed => {
                    tracing::info!(%method, photos = total, "Export complete");
                    return ExportOutcome {
                        method,
                        success: true,
                    };
                }
                TierOutcome::Terminal(e) => {
                    if e.is_cancelled() {
                        tracing::info!(%method, "Export cancelled");
                    } else {
                        tracing::error!(%method, error = %e, "Export failed");
                    }
                    return ExportOutcome {
                        method,
                        success: false,
                    };
                }
                TierOutcome::FallThrough(e) => {
                    tracing::warn!(%method, error = %e, "Export tier failed, trying next");
                }
            }
        }

        tracing::warn!("No export tier succeeded");
        ExportOutcome::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn started() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            file_name(&started(), 0, DownloadFormat::Jpeg),
            "TS_20240309_140509_001.jpg"
        );
        assert_eq!(
            file_name(&started(), 41, DownloadFormat::Png),
            "TS_20240309_140509_042.png"
        );
        assert_eq!(
            file_name(&started(), 1233, DownloadFormat::Png),
            "TS_20240309_140509_1234.png"
        );
        assert_eq!(archive_name(&started()), "Timestamp_20240309.zip");
    }

    #[test]
    fn test_method_names() {
        assert_eq!(ExportMethod::NativeFilesystem.to_string(), "native-filesystem");
        assert_eq!(
            serde_json::to_string(&ExportMethod::Zip).unwrap(),
            "\"zip\""
        );
        assert_eq!(ExportOutcome::none().method.as_str(), "none");
    }

    #[test]
    fn test_progress_reports_each_count_once() {
        let mut seen = Vec::new();
        let mut record = |done: usize, total: usize| seen.push((done, total));
        {
            let mut progress = ProgressReporter::new(3, &mut record);
            progress.photo_done(1);
            progress.photo_done(2);
            // A fallback tier starts over.
            progress.photo_done(1);
            progress.photo_done(2);
            progress.photo_done(3);
            progress.photo_done(4);
            assert_eq!(progress.reported(), 3);
        }
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
