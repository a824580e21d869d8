use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::error::{ErrorKind, LoftyError};
use lofty::picture::{Picture, PictureType};
use lofty::prelude::{AudioFile, ItemKey, TagExt, TaggedFileExt};
use lofty::tag::Tag;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct AudioFileTags {
    pub duration: Duration,
    pub mime_type: String,
    pub tags: Option<RawTags>,
}

#[derive(Debug, Default, Clone)]
pub struct RawTags {
    pub title: Option<String>,
    pub track_no: Option<u32>,
    pub year: Option<u32>,
    pub album: Option<String>,
    pub album_artists: Vec<String>,
    pub performers: Vec<String>,
    pub genres: Vec<String>,
    pub pictures: Vec<RawPicture>,
}

impl RawTags {
    pub fn first_album_artist(&self) -> Option<&str> {
        self.album_artists.first().map(String::as_str)
    }

    pub fn front_cover(&self) -> Option<&RawPicture> {
        self.pictures
            .iter()
            .find(|picture| picture.kind == PictureKind::FrontCover)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PictureKind {
    FrontCover,
    Other,
}

#[derive(Debug, Clone)]
pub struct RawPicture {
    pub kind: PictureKind,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tag error: {0}")]
    Lofty(#[from] LoftyError),
    #[error("no writable tag in {}", .0.display())]
    NoTag(PathBuf),
}

pub trait TagReader: Send + Sync {
    /// `Ok(None)` means the file is not a recognizable audio format.
    fn read(&self, path: &Path) -> Result<Option<AudioFileTags>, MetadataError>;

    fn write_front_cover(&self, path: &Path, image: &Path) -> Result<(), MetadataError>;

    fn read_front_cover(&self, path: &Path) -> Result<Option<CoverArt>, MetadataError> {
        let cover = self
            .read(path)?
            .and_then(|file| file.tags)
            .and_then(|tags| tags.front_cover().map(cover_from_picture));
        Ok(cover)
    }
}

pub fn cover_from_picture(picture: &RawPicture) -> CoverArt {
    let mime = picture
        .mime_type
        .clone()
        .filter(|mime| !mime.trim().is_empty())
        .or_else(|| guess_mime(&picture.data))
        .unwrap_or_default();
    CoverArt {
        data: picture.data.clone(),
        mime,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }
}

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<Option<AudioFileTags>, MetadataError> {
        let tagged_file = match lofty::read_from_path(path) {
            Ok(file) => file,
            Err(err) if matches!(err.kind(), ErrorKind::UnknownFormat) => {
                debug!("Unrecognized audio format: {:?}", path);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let mut info = AudioFileTags {
            duration: tagged_file.properties().duration(),
            mime_type: file_mime(path),
            tags: None,
        };

        if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            info.tags = Some(raw_tags(tag));
        }

        Ok(Some(info))
    }

    fn write_front_cover(&self, path: &Path, image: &Path) -> Result<(), MetadataError> {
        let mut tagged_file = lofty::read_from_path(path)?;
        let mut reader = BufReader::new(File::open(image)?);
        let mut picture = Picture::from_reader(&mut reader)?;
        picture.set_pic_type(PictureType::CoverFront);

        if tagged_file.primary_tag().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .primary_tag_mut()
            .ok_or_else(|| MetadataError::NoTag(path.to_path_buf()))?;
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(picture);
        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }
}

fn raw_tags(tag: &Tag) -> RawTags {
    RawTags {
        title: tag.get_string(&ItemKey::TrackTitle).map(|v| v.to_string()),
        track_no: tag
            .get_string(&ItemKey::TrackNumber)
            .and_then(parse_number),
        year: tag
            .get_string(&ItemKey::Year)
            .or_else(|| tag.get_string(&ItemKey::RecordingDate))
            .and_then(parse_year),
        album: tag.get_string(&ItemKey::AlbumTitle).map(|v| v.to_string()),
        album_artists: split_values(tag.get_strings(&ItemKey::AlbumArtist)),
        performers: split_values(tag.get_strings(&ItemKey::TrackArtist)),
        genres: split_values(tag.get_strings(&ItemKey::Genre)),
        pictures: tag
            .pictures()
            .iter()
            .map(|picture| RawPicture {
                kind: if picture.pic_type() == PictureType::CoverFront {
                    PictureKind::FrontCover
                } else {
                    PictureKind::Other
                },
                mime_type: picture.mime_type().map(|mime| mime.as_str().to_string()),
                data: picture.data().to_vec(),
            })
            .collect(),
    }
}

fn file_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn parse_number(text: &str) -> Option<u32> {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().ok()
}

fn parse_year(text: &str) -> Option<u32> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            if digits.len() == 4 {
                break;
            }
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

fn split_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out = Vec::new();
    for value in values {
        for part in value.split(&['\0', ';'][..]) {
            if part.trim().is_empty() {
                continue;
            }
            out.push(part.to_string());
        }
    }
    out
}

fn guess_mime(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg".to_string())
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png".to_string())
    } else {
        None
    }
}
