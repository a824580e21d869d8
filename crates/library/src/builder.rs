use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::{CoverImage, LogLevel, Track, TrackDraft, TrackError};
use metadata::{cover_from_picture, AudioFileTags, RawTags, TagReader};
use tracing::debug;

use crate::error::LibraryError;
use crate::interner::Interner;
use crate::log::LogChannel;

pub struct TrackBuilder<'a> {
    interner: &'a Interner,
    log: &'a LogChannel,
}

impl<'a> TrackBuilder<'a> {
    pub fn new(interner: &'a Interner, log: &'a LogChannel) -> Self {
        Self { interner, log }
    }

    pub fn process(&self, reader: &dyn TagReader, path: &Path, index: u64) -> Option<Track> {
        let index = log_index(index);
        let result = reader
            .read(path)
            .map_err(LibraryError::from)
            .and_then(|read| self.build(path, index, read).map_err(LibraryError::from));

        match result {
            Ok(track) => {
                self.log.emit_with(
                    LogLevel::Information,
                    index,
                    "Processed file",
                    &[("path", path.display().to_string())],
                );
                Some(track)
            }
            Err(err) => {
                self.log.emit_with(
                    LogLevel::Error,
                    index,
                    "Failed to process file",
                    &[
                        ("path", path.display().to_string()),
                        ("exception", err.to_string()),
                    ],
                );
                None
            }
        }
    }

    pub fn build(
        &self,
        path: &Path,
        index: i64,
        read: Option<AudioFileTags>,
    ) -> Result<Track, TrackError> {
        let file = match read {
            Some(file) => file,
            None => {
                debug!("No audio handle for {:?}; building a bare track", path);
                return Track::new(self.bare_draft(path, Duration::ZERO, String::new()));
            }
        };

        let tags = match file.tags {
            Some(tags) => tags,
            None => return Track::new(self.bare_draft(path, file.duration, file.mime_type)),
        };
        let album_artists = (tags.album_artists.len() > 1).then(|| tags.album_artists.join("; "));
        let track = Track::new(self.tagged_draft(path, file.duration, file.mime_type, tags))?;
        if let Some(album_artists) = album_artists {
            self.log.emit_with(
                LogLevel::Warning,
                index,
                "Multiple album artists; using the first",
                &[
                    ("path", path.display().to_string()),
                    ("album_artists", album_artists),
                ],
            );
        }
        Ok(track)
    }

    fn bare_draft(&self, path: &Path, length: Duration, mime_type: String) -> TrackDraft {
        TrackDraft {
            number: 0,
            title: String::new(),
            album: self.interner.unknown_album(),
            performers: Vec::new(),
            genres: Vec::new(),
            year: 0,
            length,
            file_path: path.to_path_buf(),
            mime_type,
            front_cover: None,
            source_album_artist_names: Vec::new(),
        }
    }

    fn tagged_draft(
        &self,
        path: &Path,
        length: Duration,
        mime_type: String,
        tags: RawTags,
    ) -> TrackDraft {
        let album_artist = self.interner.album_artist(tags.first_album_artist());
        let album = self.interner.album(tags.album.as_deref(), &album_artist);

        let mut performers = Vec::with_capacity(tags.performers.len());
        for raw in &tags.performers {
            push_unique(&mut performers, self.interner.performer(Some(raw)));
        }
        let mut genres = Vec::with_capacity(tags.genres.len());
        for raw in &tags.genres {
            push_unique(&mut genres, self.interner.genre(Some(raw)));
        }

        let front_cover = tags.front_cover().map(|picture| {
            let cover = cover_from_picture(picture);
            CoverImage {
                mime_type: cover.mime,
                data: cover.data,
            }
        });

        TrackDraft {
            number: tags.track_no.unwrap_or(0),
            title: tags.title.unwrap_or_default(),
            album,
            performers,
            genres,
            year: tags.year.unwrap_or(0),
            length,
            file_path: path.to_path_buf(),
            mime_type,
            front_cover,
            source_album_artist_names: tags.album_artists,
        }
    }
}

fn push_unique<T>(items: &mut Vec<Arc<T>>, item: Arc<T>) {
    if !items.iter().any(|seen| Arc::ptr_eq(seen, &item)) {
        items.push(item);
    }
}

fn log_index(index: u64) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}
