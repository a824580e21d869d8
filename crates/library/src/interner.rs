use std::collections::HashMap;
use std::sync::Arc;

use common::{
    album_key, normalize_key, Album, AlbumArtist, AlbumArtistKind, Entity, Genre, GenreKind,
    Named, NamedKind, Performer, PerformerKind,
};
use parking_lot::Mutex;

struct NamedPool<K: NamedKind> {
    unknown: Arc<Named<K>>,
    by_key: HashMap<String, Arc<Named<K>>>,
}

impl<K: NamedKind> NamedPool<K> {
    fn new() -> Self {
        Self {
            unknown: Arc::new(Named::unknown()),
            by_key: HashMap::new(),
        }
    }

    fn resolve(&mut self, raw: Option<&str>) -> Arc<Named<K>> {
        let raw = match raw.filter(|value| !value.is_empty()) {
            Some(raw) => raw,
            None => return Arc::clone(&self.unknown),
        };
        let entity = self
            .by_key
            .entry(normalize_key(raw))
            .or_insert_with(|| Arc::new(Named::new(raw)));
        Arc::clone(entity)
    }
}

struct AlbumPool {
    unknown: Arc<Album>,
    by_key: HashMap<String, Arc<Album>>,
}

impl AlbumPool {
    fn new(unknown_artist: Arc<AlbumArtist>) -> Self {
        Self {
            unknown: Arc::new(Album::unknown(unknown_artist)),
            by_key: HashMap::new(),
        }
    }

    fn resolve(&mut self, raw: Option<&str>, album_artist: &Arc<AlbumArtist>) -> Arc<Album> {
        let raw = match raw.filter(|value| !value.is_empty()) {
            Some(raw) => raw,
            None => return Arc::clone(&self.unknown),
        };
        // The sentinel artist keys as "" so it never merges with a real
        // artist that happens to share its placeholder name.
        let artist_name = if album_artist.is_default() {
            ""
        } else {
            album_artist.name()
        };
        let album = self
            .by_key
            .entry(album_key(raw, artist_name))
            .or_insert_with(|| Arc::new(Album::new(raw, Arc::clone(album_artist))));
        Arc::clone(album)
    }
}

pub struct Interner {
    album_artists: Mutex<NamedPool<AlbumArtistKind>>,
    albums: Mutex<AlbumPool>,
    genres: Mutex<NamedPool<GenreKind>>,
    performers: Mutex<NamedPool<PerformerKind>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let album_artists = NamedPool::new();
        let albums = AlbumPool::new(Arc::clone(&album_artists.unknown));
        Self {
            album_artists: Mutex::new(album_artists),
            albums: Mutex::new(albums),
            genres: Mutex::new(NamedPool::new()),
            performers: Mutex::new(NamedPool::new()),
        }
    }

    pub fn album_artist(&self, raw: Option<&str>) -> Arc<AlbumArtist> {
        self.album_artists.lock().resolve(raw)
    }

    pub fn album(&self, raw: Option<&str>, album_artist: &Arc<AlbumArtist>) -> Arc<Album> {
        self.albums.lock().resolve(raw, album_artist)
    }

    pub fn genre(&self, raw: Option<&str>) -> Arc<Genre> {
        self.genres.lock().resolve(raw)
    }

    pub fn performer(&self, raw: Option<&str>) -> Arc<Performer> {
        self.performers.lock().resolve(raw)
    }

    pub fn unknown_album(&self) -> Arc<Album> {
        Arc::clone(&self.albums.lock().unknown)
    }

    pub fn album_count(&self) -> usize {
        self.albums.lock().by_key.len()
    }

    pub fn album_artist_count(&self) -> usize {
        self.album_artists.lock().by_key.len()
    }
}
