use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{normalize_key, Entity, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    AlbumArtists,
    Albums,
    Genres,
    Performers,
    Years,
    Tracks,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Number(u64),
    Length(Duration),
    Text(String),
}

impl SortValue {
    pub fn text(value: &str) -> Self {
        SortValue::Text(normalize_key(value))
    }
}

pub trait Sortable {
    const VIEW: ViewKind;
    const COLUMNS: &'static [&'static str];

    fn sort_value(&self, column: &str) -> Option<SortValue>;
}

pub fn canonical_column(columns: &[&'static str], requested: &str) -> Option<&'static str> {
    let requested = requested.trim();
    columns
        .iter()
        .copied()
        .find(|column| column.eq_ignore_ascii_case(requested))
}

#[derive(Debug, Default)]
pub struct SortState {
    directions: HashMap<(ViewKind, &'static str), SortDirection>,
}

impl SortState {
    pub fn advance(&mut self, view: ViewKind, column: &'static str) -> SortDirection {
        let next = match self.directions.get(&(view, column)) {
            Some(previous) => previous.flipped(),
            None => SortDirection::Descending,
        };
        self.directions.insert((view, column), next);
        next
    }

    pub fn last(&self, view: ViewKind, column: &str) -> Option<SortDirection> {
        self.directions
            .iter()
            .find(|((v, c), _)| *v == view && *c == column)
            .map(|(_, direction)| *direction)
    }
}

pub fn sort_rows<R: Sortable>(rows: &mut [R], column: &'static str, direction: SortDirection) {
    match direction {
        SortDirection::Ascending => rows.sort_by_cached_key(|row| row.sort_value(column)),
        SortDirection::Descending => rows.sort_by_cached_key(|row| Reverse(row.sort_value(column))),
    }
}

impl Sortable for Arc<Track> {
    const VIEW: ViewKind = ViewKind::Tracks;
    const COLUMNS: &'static [&'static str] = &[
        "Number",
        "Title",
        "Album",
        "AlbumArtist",
        "Performers",
        "Genres",
        "Year",
        "Length",
        "FilePath",
        "MimeType",
    ];

    fn sort_value(&self, column: &str) -> Option<SortValue> {
        let value = match column {
            "Number" => SortValue::Number(u64::from(self.number())),
            "Title" => SortValue::text(self.title()),
            "Album" => SortValue::text(self.album().name()),
            "AlbumArtist" => SortValue::text(self.album_artist().name()),
            "Performers" => SortValue::text(&joined(self.performers().iter().map(|p| p.name()))),
            "Genres" => SortValue::text(&joined(self.genres().iter().map(|g| g.name()))),
            "Year" => SortValue::Number(u64::from(self.year())),
            "Length" => SortValue::Length(self.length()),
            "FilePath" => SortValue::Text(self.file_path().to_string_lossy().to_string()),
            "MimeType" => SortValue::text(self.mime_type()),
            _ => return None,
        };
        Some(value)
    }
}

fn joined<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
