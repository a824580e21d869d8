use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use common::{Album, AlbumArtist, CoverImage, Genre, LogEntry, Performer, Track};
use metadata::TagReader;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

mod browse;
mod builder;
mod config;
mod error;
mod interner;
mod log;
mod scan;
pub mod views;

pub use browse::{
    AlbumFilters, AlbumRow, LibraryView, NamedFilters, NamedRow, NamedView, SortDirection,
    SortState, SortValue, Sortable, Totals, TrackFilters, TrackQuery, ViewKind, YearRow,
};
pub use builder::TrackBuilder;
pub use config::{
    config_path_from_env, load_or_create_config, resolve_path, save_config, ConfigError,
    ConfigFile, ConfigSource, ScanConfig,
};
pub use error::LibraryError;
pub use interner::Interner;
pub use log::{LogChannel, LogSubscription, SubscriptionId};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub roots_scanned: usize,
    pub roots_skipped: usize,
    pub roots_failed: usize,
    pub files_discovered: usize,
    pub files_failed: usize,
    pub tracks: usize,
}

pub struct Library {
    config: Box<dyn ConfigSource>,
    reader: Arc<dyn TagReader>,
    log: LogChannel,
    total_files_count: AtomicI64,
    tracks: RwLock<Vec<Arc<Track>>>,
    scanning: AtomicBool,
}

impl Library {
    pub fn new(config: impl ConfigSource + 'static, reader: impl TagReader + 'static) -> Self {
        Self {
            config: Box::new(config),
            reader: Arc::new(reader),
            log: LogChannel::new(),
            total_files_count: AtomicI64::new(-1),
            tracks: RwLock::new(Vec::new()),
            scanning: AtomicBool::new(false),
        }
    }

    pub fn load_and_scan(
        config: impl ConfigSource + 'static,
        reader: impl TagReader + 'static,
    ) -> Result<(Self, ScanStats), LibraryError> {
        let library = Self::new(config, reader);
        let stats = library.reload()?;
        Ok((library, stats))
    }

    pub fn log(&self) -> &LogChannel {
        &self.log
    }

    pub fn total_files_count(&self) -> i64 {
        self.total_files_count.load(Ordering::SeqCst)
    }

    pub fn tracks(&self) -> Vec<Arc<Track>> {
        self.tracks.read().clone()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.read().len()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub fn album_artists(&self) -> Vec<Arc<AlbumArtist>> {
        views::album_artists(&self.tracks.read())
    }

    pub fn albums(&self) -> Vec<Arc<Album>> {
        views::albums(&self.tracks.read())
    }

    pub fn genres(&self) -> Vec<Arc<Genre>> {
        views::genres(&self.tracks.read())
    }

    pub fn performers(&self) -> Vec<Arc<Performer>> {
        views::performers(&self.tracks.read())
    }

    pub fn years(&self) -> Vec<u32> {
        views::years(&self.tracks.read())
    }

    /// Discards every track and entity, re-reads the configuration and scans
    /// from scratch. Rejected while another scan on this library is running.
    pub fn reload(&self) -> Result<ScanStats, LibraryError> {
        let _guard = ScanGuard::acquire(&self.scanning).ok_or_else(|| {
            warn!("Reload requested while a scan is running; rejected");
            LibraryError::ScanInProgress
        })?;

        let config = self.config.load()?;
        self.total_files_count.store(-1, Ordering::SeqCst);
        self.tracks.write().clear();

        let interner = Interner::new();
        let builder = TrackBuilder::new(&interner, &self.log);
        let failed = AtomicUsize::new(0);
        let mut stats = ScanStats::default();

        for root in &config.roots {
            if !root.exists() {
                debug!("Skipping missing root {:?}", root);
                stats.roots_skipped += 1;
                continue;
            }

            let files = match scan::discover_files(root, &config.extensions) {
                Ok(files) => files,
                Err(err) => {
                    stats.roots_failed += 1;
                    self.emit_root_failure(root, &LibraryError::from(err));
                    continue;
                }
            };
            info!("Found {} audio files under {:?}", files.len(), root);
            self.total_files_count
                .store(i64::try_from(files.len()).unwrap_or(i64::MAX), Ordering::SeqCst);
            stats.files_discovered = files.len();
            stats.roots_scanned += 1;

            scan::process_files(&files, config.parallel, |path, index| {
                match builder.process(&*self.reader, path, index) {
                    Some(track) => self.tracks.write().push(Arc::new(track)),
                    None => {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }

        stats.files_failed = failed.into_inner();
        stats.tracks = self.track_count();
        info!(
            "Library scan finished: {} tracks from {} roots ({} skipped, {} failed, {} files failed)",
            stats.tracks, stats.roots_scanned, stats.roots_skipped, stats.roots_failed, stats.files_failed
        );
        Ok(stats)
    }

    pub fn replace_front_cover(
        &self,
        track: &Arc<Track>,
        image: &Path,
    ) -> Result<Arc<Track>, LibraryError> {
        if !self.contains(track) {
            return Err(LibraryError::TrackNotInLibrary(track.file_path().to_path_buf()));
        }

        self.reader.write_front_cover(track.file_path(), image)?;
        let cover = self
            .reader
            .read_front_cover(track.file_path())?
            .map(|cover| CoverImage {
                mime_type: cover.mime,
                data: cover.data,
            });
        let updated = Arc::new(track.with_front_cover(cover));

        let mut tracks = self.tracks.write();
        let slot = tracks
            .iter_mut()
            .find(|candidate| Arc::ptr_eq(candidate, track))
            .ok_or_else(|| LibraryError::TrackNotInLibrary(track.file_path().to_path_buf()))?;
        *slot = Arc::clone(&updated);
        info!("Replaced front cover of {:?}", track.file_path());
        Ok(updated)
    }

    fn contains(&self, track: &Arc<Track>) -> bool {
        self.tracks
            .read()
            .iter()
            .any(|candidate| Arc::ptr_eq(candidate, track))
    }

    fn emit_root_failure(&self, root: &Path, err: &LibraryError) {
        let entry = LogEntry::critical("Failed to enumerate root")
            .with_data("root", root.display().to_string())
            .and_then(|entry| entry.with_data("exception", err.to_string()));
        match entry {
            Ok(entry) => self.log.emit(entry),
            Err(log_err) => warn!("Dropped root failure entry for {:?}: {}", root, log_err),
        }
    }
}

struct ScanGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
