use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use common::{
    album_key, loose_key, normalize_key, Album, AlbumArtist, Entity, Genre, Performer, Track,
    KEY_SEP,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NamedFilters {
    pub duplicates: bool,
    pub near_duplicates: bool,
    pub empty: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlbumFilters {
    pub duplicates: bool,
    pub near_duplicates: bool,
    pub empty: bool,
    pub invalid_track_sequence: bool,
    pub multiple_years: bool,
    pub inconsistent_front_cover: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackFilters {
    pub duplicates: bool,
    pub near_duplicates: bool,
    pub empty: bool,
    pub invalid_track_sequence: bool,
    pub multiple_years: bool,
    pub inconsistent_front_cover: bool,
    pub missing_performer: bool,
    pub duplicate_performers: bool,
    pub missing_genre: bool,
    pub duplicate_genres: bool,
    pub invalid_year: bool,
    pub missing_front_cover: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TrackQuery {
    pub album_artist: Option<Arc<AlbumArtist>>,
    pub album: Option<Arc<Album>>,
    pub performer: Option<Arc<Performer>>,
    pub genre: Option<Arc<Genre>>,
    pub year: Option<u32>,
}

impl TrackQuery {
    pub fn matches(&self, track: &Track) -> bool {
        if let Some(artist) = &self.album_artist {
            if !Arc::ptr_eq(artist, track.album_artist()) {
                return false;
            }
        }
        if let Some(album) = &self.album {
            if !Arc::ptr_eq(album, track.album()) {
                return false;
            }
        }
        if let Some(performer) = &self.performer {
            if !track.performers().iter().any(|p| Arc::ptr_eq(p, performer)) {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if !track.genres().iter().any(|g| Arc::ptr_eq(g, genre)) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if track.year() != year {
                return false;
            }
        }
        true
    }
}

pub fn is_blank_or_default(entity: &impl Entity) -> bool {
    entity.is_default() || entity.name().trim().is_empty()
}

pub fn repeated_keys<T>(items: &[T], key: impl Fn(&T) -> String) -> HashSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect()
}

pub fn album_duplicate_key(album: &Album) -> String {
    album_key(album.name(), album.album_artist().name())
}

pub fn album_near_duplicate_key(album: &Album) -> String {
    let mut out = loose_key(album.name());
    out.push(KEY_SEP);
    out.push_str(&loose_key(album.album_artist().name()));
    out
}

pub fn track_duplicate_key(track: &Track) -> String {
    title_in_album(normalize_key(track.title()), track)
}

pub fn track_near_duplicate_key(track: &Track) -> String {
    title_in_album(loose_key(track.title()), track)
}

fn title_in_album(title: String, track: &Track) -> String {
    format!("{}{}{:p}", title, KEY_SEP, Arc::as_ptr(track.album()))
}

pub fn has_invalid_track_sequence(tracks: &[Arc<Track>]) -> bool {
    let mut numbers: Vec<u32> = tracks.iter().map(|track| track.number()).collect();
    numbers.sort_unstable();
    !numbers
        .iter()
        .enumerate()
        .all(|(position, number)| u64::from(*number) == position as u64 + 1)
}

pub fn has_multiple_years(tracks: &[Arc<Track>]) -> bool {
    match tracks.split_first() {
        Some((first, rest)) => rest.iter().any(|track| track.year() != first.year()),
        None => false,
    }
}

/// A missing cover on any track counts as inconsistent, as does any pair of
/// byte-wise different covers.
pub fn has_inconsistent_front_cover(tracks: &[Arc<Track>]) -> bool {
    if tracks.iter().any(|track| !track.has_front_cover()) {
        return true;
    }
    match tracks.split_first() {
        Some((first, rest)) => rest
            .iter()
            .any(|track| track.front_cover_bytes() != first.front_cover_bytes()),
        None => false,
    }
}

pub fn has_missing_performer(track: &Track) -> bool {
    track.performers().iter().all(|p| is_blank_or_default(&**p))
}

pub fn has_missing_genre(track: &Track) -> bool {
    track.genres().iter().all(|g| is_blank_or_default(&**g))
}

pub fn has_duplicate_names<T: Entity>(items: &[Arc<T>]) -> bool {
    let mut seen = HashSet::new();
    items.iter().any(|item| !seen.insert(normalize_key(item.name())))
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AlbumFlags {
    pub invalid_track_sequence: bool,
    pub multiple_years: bool,
    pub inconsistent_front_cover: bool,
}

impl AlbumFlags {
    pub fn of(tracks: &[Arc<Track>]) -> Self {
        Self {
            invalid_track_sequence: has_invalid_track_sequence(tracks),
            multiple_years: has_multiple_years(tracks),
            inconsistent_front_cover: has_inconsistent_front_cover(tracks),
        }
    }
}
