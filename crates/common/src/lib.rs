use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

mod log;

pub use log::{LogEntry, LogEntryError, LogLevel, NO_FILE_INDEX};

pub const KEY_SEP: char = '\x1f';

pub trait Entity {
    fn name(&self) -> &str;
    fn is_default(&self) -> bool;
}

pub trait NamedKind: Send + Sync + 'static {
    const LABEL: &'static str;
    const UNKNOWN_NAME: &'static str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlbumArtistKind {}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenreKind {}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PerformerKind {}

impl NamedKind for AlbumArtistKind {
    const LABEL: &'static str = "album artist";
    const UNKNOWN_NAME: &'static str = "Unknown Album Artist";
}

impl NamedKind for GenreKind {
    const LABEL: &'static str = "genre";
    const UNKNOWN_NAME: &'static str = "Unknown Genre";
}

impl NamedKind for PerformerKind {
    const LABEL: &'static str = "performer";
    const UNKNOWN_NAME: &'static str = "Unknown Performer";
}

pub struct Named<K: NamedKind> {
    name: String,
    is_default: bool,
    _kind: PhantomData<fn() -> K>,
}

pub type AlbumArtist = Named<AlbumArtistKind>;
pub type Genre = Named<GenreKind>;
pub type Performer = Named<PerformerKind>;

impl<K: NamedKind> Named<K> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
            _kind: PhantomData,
        }
    }

    pub fn unknown() -> Self {
        Self {
            name: K::UNKNOWN_NAME.to_string(),
            is_default: true,
            _kind: PhantomData,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        K::LABEL
    }
}

impl<K: NamedKind> Entity for Named<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_default(&self) -> bool {
        self.is_default
    }
}

impl<K: NamedKind> fmt::Debug for Named<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Named")
            .field("kind", &K::LABEL)
            .field("name", &self.name)
            .field("is_default", &self.is_default)
            .finish()
    }
}

#[derive(Debug)]
pub struct Album {
    name: String,
    album_artist: Arc<AlbumArtist>,
    is_default: bool,
}

impl Album {
    pub const UNKNOWN_NAME: &'static str = "Unknown Album";

    pub fn new(name: impl Into<String>, album_artist: Arc<AlbumArtist>) -> Self {
        Self {
            name: name.into(),
            album_artist,
            is_default: false,
        }
    }

    pub fn unknown(unknown_artist: Arc<AlbumArtist>) -> Self {
        Self {
            name: Self::UNKNOWN_NAME.to_string(),
            album_artist: unknown_artist,
            is_default: true,
        }
    }

    pub fn album_artist(&self) -> &Arc<AlbumArtist> {
        &self.album_artist
    }
}

impl Entity for Album {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_default(&self) -> bool {
        self.is_default
    }
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("track file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[derive(Debug)]
pub struct TrackDraft {
    pub number: u32,
    pub title: String,
    pub album: Arc<Album>,
    pub performers: Vec<Arc<Performer>>,
    pub genres: Vec<Arc<Genre>>,
    pub year: u32,
    pub length: Duration,
    pub file_path: PathBuf,
    pub mime_type: String,
    pub front_cover: Option<CoverImage>,
    pub source_album_artist_names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Track {
    number: u32,
    title: String,
    album: Arc<Album>,
    performers: Vec<Arc<Performer>>,
    genres: Vec<Arc<Genre>>,
    year: u32,
    length: Duration,
    file_path: PathBuf,
    mime_type: String,
    front_cover_mime_type: String,
    front_cover_bytes: Vec<u8>,
    source_album_artist_names: Vec<String>,
}

impl Track {
    pub fn new(draft: TrackDraft) -> Result<Self, TrackError> {
        if !draft.file_path.is_file() {
            return Err(TrackError::FileNotFound(draft.file_path));
        }
        let (front_cover_mime_type, front_cover_bytes) = match draft.front_cover {
            Some(cover) => (cover.mime_type, cover.data),
            None => (String::new(), Vec::new()),
        };
        Ok(Self {
            number: draft.number,
            title: draft.title,
            album: draft.album,
            performers: dedup_by_identity(draft.performers),
            genres: dedup_by_identity(draft.genres),
            year: draft.year,
            length: draft.length,
            file_path: draft.file_path,
            mime_type: draft.mime_type,
            front_cover_mime_type,
            front_cover_bytes,
            source_album_artist_names: draft.source_album_artist_names,
        })
    }

    pub fn with_front_cover(&self, cover: Option<CoverImage>) -> Self {
        let mut track = self.clone();
        match cover {
            Some(cover) => {
                track.front_cover_mime_type = cover.mime_type;
                track.front_cover_bytes = cover.data;
            }
            None => {
                track.front_cover_mime_type.clear();
                track.front_cover_bytes.clear();
            }
        }
        track
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn album(&self) -> &Arc<Album> {
        &self.album
    }

    pub fn album_artist(&self) -> &Arc<AlbumArtist> {
        self.album.album_artist()
    }

    pub fn performers(&self) -> &[Arc<Performer>] {
        &self.performers
    }

    pub fn genres(&self) -> &[Arc<Genre>] {
        &self.genres
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn front_cover_mime_type(&self) -> &str {
        &self.front_cover_mime_type
    }

    pub fn front_cover_bytes(&self) -> &[u8] {
        &self.front_cover_bytes
    }

    pub fn has_front_cover(&self) -> bool {
        !self.front_cover_bytes.is_empty()
    }

    pub fn source_album_artist_names(&self) -> &[String] {
        &self.source_album_artist_names
    }
}

fn dedup_by_identity<T>(items: Vec<Arc<T>>) -> Vec<Arc<T>> {
    let mut out: Vec<Arc<T>> = Vec::with_capacity(items.len());
    for item in items {
        if !out.iter().any(|seen| Arc::ptr_eq(seen, &item)) {
            out.push(item);
        }
    }
    out
}

pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn album_key(album_name: &str, album_artist_name: &str) -> String {
    let mut out = String::new();
    out.push_str(&normalize_key(album_name));
    out.push(KEY_SEP);
    out.push_str(&normalize_key(album_artist_name));
    out
}

pub fn loose_key(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_space = true;
    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_space = false;
        } else if ch.is_whitespace() && !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(path: PathBuf) -> TrackDraft {
        let artist = Arc::new(AlbumArtist::new("The Beatles"));
        TrackDraft {
            number: 1,
            title: "Come Together".to_string(),
            album: Arc::new(Album::new("Abbey Road", artist)),
            performers: Vec::new(),
            genres: Vec::new(),
            year: 1969,
            length: Duration::from_secs(259),
            file_path: path,
            mime_type: "audio/mpeg".to_string(),
            front_cover: None,
            source_album_artist_names: vec!["The Beatles".to_string()],
        }
    }

    #[test]
    fn track_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.mp3");
        match Track::new(draft(missing.clone())) {
            Err(TrackError::FileNotFound(path)) => assert_eq!(path, missing),
            Ok(_) => panic!("track built for a missing file"),
        }
    }

    #[test]
    fn track_dedups_performers_by_identity() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let lennon = Arc::new(Performer::new("John Lennon"));
        let other_lennon = Arc::new(Performer::new("John Lennon"));
        let mut draft = draft(file.path().to_path_buf());
        draft.performers = vec![lennon.clone(), lennon.clone(), other_lennon.clone()];
        let track = Track::new(draft).unwrap();
        assert_eq!(track.performers().len(), 2);
        assert!(Arc::ptr_eq(&track.performers()[0], &lennon));
        assert!(Arc::ptr_eq(&track.performers()[1], &other_lennon));
    }

    #[test]
    fn with_front_cover_keeps_entities() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let track = Track::new(draft(file.path().to_path_buf())).unwrap();
        assert!(!track.has_front_cover());
        let covered = track.with_front_cover(Some(CoverImage {
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }));
        assert!(Arc::ptr_eq(covered.album(), track.album()));
        assert_eq!(covered.front_cover_mime_type(), "image/png");
        assert_eq!(covered.front_cover_bytes(), &[1, 2, 3]);
        assert!(!covered.with_front_cover(None).has_front_cover());
    }

    #[test]
    fn sentinels_are_flagged() {
        let artist = Arc::new(AlbumArtist::unknown());
        assert!(artist.is_default());
        assert_eq!(artist.name(), AlbumArtistKind::UNKNOWN_NAME);
        let album = Album::unknown(artist.clone());
        assert!(album.is_default());
        assert!(Arc::ptr_eq(album.album_artist(), &artist));
        assert!(!Genre::new("Rock").is_default());
    }

    #[test]
    fn keys_fold_case_and_whitespace() {
        assert_eq!(normalize_key("  ABBEY Road "), "abbey road");
        assert_eq!(album_key("Abbey Road", " The Beatles"), album_key("ABBEY ROAD", "the beatles"));
        assert_ne!(album_key("Abbey Road", "The Beatles"), album_key("Abbey Road", "Others"));
        assert_eq!(loose_key("AC/DC"), loose_key("acdc"));
        assert_eq!(loose_key("  The   Beatles! "), "the beatles");
    }
}
