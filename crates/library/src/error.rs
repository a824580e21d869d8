use std::path::PathBuf;

use common::TrackError;
use metadata::MetadataError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("a scan is already running")]
    ScanInProgress,
    #[error("track is not part of the current library: {}", .0.display())]
    TrackNotInLibrary(PathBuf),
}
