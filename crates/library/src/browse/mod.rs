mod filter;
mod sort;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use common::{
    loose_key, normalize_key, Album, AlbumArtistKind, Entity, GenreKind, Named, NamedKind,
    PerformerKind, Track,
};
use tracing::debug;

use crate::views;
use crate::Library;

pub use filter::{
    album_duplicate_key, album_near_duplicate_key, has_duplicate_names,
    has_inconsistent_front_cover, has_invalid_track_sequence, has_multiple_years,
    is_blank_or_default, AlbumFilters, NamedFilters, TrackFilters, TrackQuery,
};
pub use sort::{canonical_column, SortDirection, SortState, SortValue, Sortable, ViewKind};

use filter::{
    has_missing_genre, has_missing_performer, repeated_keys, track_duplicate_key,
    track_near_duplicate_key, AlbumFlags,
};

pub trait NamedView: NamedKind + Sized {
    const VIEW: ViewKind;

    fn members(track: &Track) -> &[Arc<Named<Self>>];
}

impl NamedView for AlbumArtistKind {
    const VIEW: ViewKind = ViewKind::AlbumArtists;

    fn members(track: &Track) -> &[Arc<Named<Self>>] {
        std::slice::from_ref(track.album_artist())
    }
}

impl NamedView for GenreKind {
    const VIEW: ViewKind = ViewKind::Genres;

    fn members(track: &Track) -> &[Arc<Named<Self>>] {
        track.genres()
    }
}

impl NamedView for PerformerKind {
    const VIEW: ViewKind = ViewKind::Performers;

    fn members(track: &Track) -> &[Arc<Named<Self>>] {
        track.performers()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub albums_count: usize,
    pub tracks_count: usize,
    pub total_length: Duration,
}

impl Totals {
    fn of<'a>(tracks: impl Iterator<Item = &'a Arc<Track>>) -> Self {
        let mut albums: HashSet<*const Album> = HashSet::new();
        let mut totals = Totals::default();
        for track in tracks {
            albums.insert(Arc::as_ptr(track.album()));
            totals.tracks_count += 1;
            totals.total_length += track.length();
        }
        totals.albums_count = albums.len();
        totals
    }
}

#[derive(Clone, Debug)]
pub struct NamedRow<K: NamedKind> {
    pub entity: Arc<Named<K>>,
    pub totals: Totals,
}

#[derive(Clone, Debug)]
pub struct AlbumRow {
    pub album: Arc<Album>,
    pub tracks_count: usize,
    pub total_length: Duration,
    pub years: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearRow {
    pub year: u32,
    pub totals: Totals,
}

const NAMED_COLUMNS: &[&str] = &["Name", "AlbumsCount", "TracksCount", "TotalLength"];

fn totals_value(totals: &Totals, column: &str) -> Option<SortValue> {
    let value = match column {
        "AlbumsCount" => SortValue::Number(totals.albums_count as u64),
        "TracksCount" => SortValue::Number(totals.tracks_count as u64),
        "TotalLength" => SortValue::Length(totals.total_length),
        _ => return None,
    };
    Some(value)
}

impl<K: NamedView> Sortable for NamedRow<K> {
    const VIEW: ViewKind = K::VIEW;
    const COLUMNS: &'static [&'static str] = NAMED_COLUMNS;

    fn sort_value(&self, column: &str) -> Option<SortValue> {
        match column {
            "Name" => Some(SortValue::text(self.entity.name())),
            _ => totals_value(&self.totals, column),
        }
    }
}

impl Sortable for AlbumRow {
    const VIEW: ViewKind = ViewKind::Albums;
    const COLUMNS: &'static [&'static str] =
        &["Name", "AlbumArtist", "TracksCount", "TotalLength", "Year"];

    fn sort_value(&self, column: &str) -> Option<SortValue> {
        let value = match column {
            "Name" => SortValue::text(self.album.name()),
            "AlbumArtist" => SortValue::text(self.album.album_artist().name()),
            "TracksCount" => SortValue::Number(self.tracks_count as u64),
            "TotalLength" => SortValue::Length(self.total_length),
            "Year" => SortValue::Number(u64::from(self.years.first().copied().unwrap_or(0))),
            _ => return None,
        };
        Some(value)
    }
}

impl Sortable for YearRow {
    const VIEW: ViewKind = ViewKind::Years;
    const COLUMNS: &'static [&'static str] = &["Year", "AlbumsCount", "TracksCount", "TotalLength"];

    fn sort_value(&self, column: &str) -> Option<SortValue> {
        match column {
            "Year" => Some(SortValue::Number(u64::from(self.year))),
            _ => totals_value(&self.totals, column),
        }
    }
}

pub struct LibraryView {
    library: Arc<Library>,
    sorting: SortState,
}

impl LibraryView {
    pub fn new(library: Arc<Library>) -> Self {
        Self {
            library,
            sorting: SortState::default(),
        }
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn album_artists(&self, filters: NamedFilters) -> Vec<NamedRow<AlbumArtistKind>> {
        self.named_rows(filters)
    }

    pub fn genres(&self, filters: NamedFilters) -> Vec<NamedRow<GenreKind>> {
        self.named_rows(filters)
    }

    pub fn performers(&self, filters: NamedFilters) -> Vec<NamedRow<PerformerKind>> {
        self.named_rows(filters)
    }

    fn named_rows<K: NamedView>(&self, filters: NamedFilters) -> Vec<NamedRow<K>> {
        let tracks = self.library.tracks();
        let mut entities: Vec<Arc<Named<K>>> =
            views::distinct(tracks.iter().flat_map(|track| K::members(track)));

        if filters.duplicates {
            keep_repeated(&mut entities, |entity| normalize_key(entity.name()));
        }
        if filters.near_duplicates {
            keep_repeated(&mut entities, |entity| loose_key(entity.name()));
        }
        if filters.empty {
            entities.retain(|entity| is_blank_or_default(&**entity));
        }

        let mut rows: Vec<NamedRow<K>> = entities
            .into_iter()
            .map(|entity| {
                let totals = Totals::of(
                    tracks
                        .iter()
                        .filter(|track| K::members(track).iter().any(|m| Arc::ptr_eq(m, &entity))),
                );
                NamedRow { entity, totals }
            })
            .collect();
        rows.sort_by_cached_key(|row| name_order(&*row.entity));
        rows
    }

    pub fn albums(&self, filters: AlbumFilters) -> Vec<AlbumRow> {
        let tracks = self.library.tracks();
        let groups = group_by_album(&tracks);
        let mut albums = views::albums(&tracks);

        if filters.duplicates {
            keep_repeated(&mut albums, |album| album_duplicate_key(album));
        }
        if filters.near_duplicates {
            keep_repeated(&mut albums, |album| album_near_duplicate_key(album));
        }
        if filters.empty {
            albums.retain(|album| is_blank_or_default(&**album));
        }
        if filters.invalid_track_sequence {
            albums.retain(|album| has_invalid_track_sequence(album_group(&groups, album)));
        }
        if filters.multiple_years {
            albums.retain(|album| has_multiple_years(album_group(&groups, album)));
        }
        if filters.inconsistent_front_cover {
            albums.retain(|album| has_inconsistent_front_cover(album_group(&groups, album)));
        }

        let mut rows: Vec<AlbumRow> = albums
            .into_iter()
            .map(|album| {
                let members = album_group(&groups, &album);
                let mut years = views::years(members);
                years.sort_unstable();
                AlbumRow {
                    tracks_count: members.len(),
                    total_length: members.iter().map(|track| track.length()).sum(),
                    years,
                    album,
                }
            })
            .collect();
        rows.sort_by_cached_key(|row| {
            (
                name_order(&*row.album),
                name_order(&**row.album.album_artist()),
            )
        });
        rows
    }

    pub fn years(&self) -> Vec<YearRow> {
        let tracks = self.library.tracks();
        let mut years = views::years(&tracks);
        years.sort_unstable();
        years
            .into_iter()
            .map(|year| YearRow {
                year,
                totals: Totals::of(tracks.iter().filter(|track| track.year() == year)),
            })
            .collect()
    }

    pub fn tracks(&self, query: &TrackQuery, filters: TrackFilters) -> Vec<Arc<Track>> {
        let all = self.library.tracks();
        let groups = group_by_album(&all);
        let flags: HashMap<*const Album, AlbumFlags> = groups
            .iter()
            .map(|(album, members)| (*album, AlbumFlags::of(members)))
            .collect();
        let album_flags = |track: &Arc<Track>| {
            flags
                .get(&Arc::as_ptr(track.album()))
                .copied()
                .unwrap_or_default()
        };

        let mut tracks: Vec<Arc<Track>> = all
            .iter()
            .filter(|track| query.matches(track))
            .cloned()
            .collect();

        if filters.duplicates {
            keep_repeated(&mut tracks, |track| track_duplicate_key(track));
        }
        if filters.near_duplicates {
            keep_repeated(&mut tracks, |track| track_near_duplicate_key(track));
        }
        if filters.empty {
            tracks.retain(|track| track.title().trim().is_empty());
        }
        if filters.invalid_track_sequence {
            tracks.retain(|track| album_flags(track).invalid_track_sequence);
        }
        if filters.multiple_years {
            tracks.retain(|track| album_flags(track).multiple_years);
        }
        if filters.inconsistent_front_cover {
            tracks.retain(|track| album_flags(track).inconsistent_front_cover);
        }
        if filters.missing_performer {
            tracks.retain(|track| has_missing_performer(track));
        }
        if filters.duplicate_performers {
            tracks.retain(|track| has_duplicate_names(track.performers()));
        }
        if filters.missing_genre {
            tracks.retain(|track| has_missing_genre(track));
        }
        if filters.duplicate_genres {
            tracks.retain(|track| has_duplicate_names(track.genres()));
        }
        if filters.invalid_year {
            tracks.retain(|track| track.year() == 0);
        }
        if filters.missing_front_cover {
            tracks.retain(|track| !track.has_front_cover());
        }

        tracks.sort_by_cached_key(|track| {
            (
                name_order(&**track.album_artist()),
                name_order(&**track.album()),
                track.number(),
            )
        });
        tracks
    }

    /// Sorts `rows` by `column`, alternating direction on repeated requests
    /// for the same view and column. Unknown columns leave both the rows and
    /// the remembered directions untouched and return `None`.
    pub fn sort<R: Sortable>(&mut self, rows: &mut [R], column: &str) -> Option<SortDirection> {
        let column = match canonical_column(R::COLUMNS, column) {
            Some(column) => column,
            None => {
                debug!("Ignoring sort by unknown column '{}' for {:?}", column, R::VIEW);
                return None;
            }
        };
        let direction = self.sorting.advance(R::VIEW, column);
        sort::sort_rows(rows, column, direction);
        Some(direction)
    }

    pub fn last_sort(&self, view: ViewKind, column: &str) -> Option<SortDirection> {
        self.sorting.last(view, column)
    }
}

fn keep_repeated<T>(items: &mut Vec<T>, key: impl Fn(&T) -> String) {
    let repeated = repeated_keys(items.as_slice(), &key);
    items.retain(|item| repeated.contains(&key(item)));
}

fn name_order(entity: &impl Entity) -> (String, String) {
    (normalize_key(entity.name()), entity.name().to_string())
}

fn group_by_album(tracks: &[Arc<Track>]) -> HashMap<*const Album, Vec<Arc<Track>>> {
    let mut groups: HashMap<*const Album, Vec<Arc<Track>>> = HashMap::new();
    for track in tracks {
        groups
            .entry(Arc::as_ptr(track.album()))
            .or_default()
            .push(Arc::clone(track));
    }
    groups
}

fn album_group<'a>(
    groups: &'a HashMap<*const Album, Vec<Arc<Track>>>,
    album: &Arc<Album>,
) -> &'a [Arc<Track>] {
    groups
        .get(&Arc::as_ptr(album))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
