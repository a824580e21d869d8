use std::collections::HashSet;
use std::sync::Arc;

use common::{Album, AlbumArtist, Genre, Performer, Track};

pub fn album_artists(tracks: &[Arc<Track>]) -> Vec<Arc<AlbumArtist>> {
    distinct(tracks.iter().map(|track| track.album_artist()))
}

pub fn albums(tracks: &[Arc<Track>]) -> Vec<Arc<Album>> {
    distinct(tracks.iter().map(|track| track.album()))
}

pub fn genres(tracks: &[Arc<Track>]) -> Vec<Arc<Genre>> {
    distinct(tracks.iter().flat_map(|track| track.genres()))
}

pub fn performers(tracks: &[Arc<Track>]) -> Vec<Arc<Performer>> {
    distinct(tracks.iter().flat_map(|track| track.performers()))
}

pub fn years(tracks: &[Arc<Track>]) -> Vec<u32> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .map(|track| track.year())
        .filter(|year| seen.insert(*year))
        .collect()
}

pub(crate) fn distinct<'a, T: 'a>(items: impl Iterator<Item = &'a Arc<T>>) -> Vec<Arc<T>> {
    let mut seen: HashSet<*const T> = HashSet::new();
    items
        .filter(|item| seen.insert(Arc::as_ptr(item)))
        .map(Arc::clone)
        .collect()
}
