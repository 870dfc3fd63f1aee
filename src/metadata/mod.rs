//! Media classification and metadata extraction.
//!
//! - [`MediaKind::probe`]: sniff whether a file is an image, a video, or neither
//! - [`read_metadata`]: collect EXIF, container and file system metadata
//! - [`extract`]: derive the [`DestinationFields`] for a file, applying the capture-date
//!   fallback chain
//!
//! The capture date is taken from the first source in [`CAPTURE_DATE_SOURCES`] that has a
//! value. Images carry EXIF timestamps and videos a container creation time, so the same
//! ordered chain serves both kinds.

mod probe;
mod reader;

pub use probe::MediaKind;
pub use reader::{MediaMetadata, read_metadata};

use anyhow::{Result, bail};
use chrono::{DateTime, Datelike, Local};
use std::path::Path;

use crate::config::Config;
use crate::geocode::Coordinate;
use crate::pattern::DestinationFields;

/// A capture-date strategy: a name for logging and an accessor returning its timestamp.
pub type CaptureDateSource = (&'static str, fn(&MediaMetadata) -> Option<DateTime<Local>>);

/// Capture-date strategies, tried in order until one yields a timestamp.
pub const CAPTURE_DATE_SOURCES: &[CaptureDateSource] = &[
    ("exif digitized", |m| m.digitized),
    ("exif original", |m| m.original),
    ("container creation", |m| m.container_created),
    ("file modified", |m| m.modified),
];

/// The outcome of extracting one file: the destination fields (location still empty) and
/// the GPS coordinate to resolve it from, if any.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub kind: MediaKind,
    pub fields: DestinationFields,
    pub coordinate: Option<Coordinate>,
    /// Which entry of [`CAPTURE_DATE_SOURCES`] supplied the date.
    pub date_source: &'static str,
}

/// Pick the capture date from `data` using [`CAPTURE_DATE_SOURCES`].
pub fn capture_date(data: &MediaMetadata) -> Option<(&'static str, DateTime<Local>)> {
    CAPTURE_DATE_SOURCES
        .iter()
        .find_map(|(name, source)| source(data).map(|date| (*name, date)))
}

/// `"{make} - {model}"` when both are present and non-empty, otherwise empty.
pub fn camera_label(make: Option<&str>, model: Option<&str>) -> String {
    match (make.map(str::trim), model.map(str::trim)) {
        (Some(make), Some(model)) if !make.is_empty() && !model.is_empty() => {
            format!("{make} - {model}")
        }
        _ => String::new(),
    }
}

/// Build the destination fields for an already-read file.
///
/// Fails when no capture date source produced a timestamp.
pub fn fields_from_metadata(
    filename: &str,
    kind: MediaKind,
    data: &MediaMetadata,
    config: &Config,
) -> Result<Extracted> {
    let Some((date_source, date)) = capture_date(data) else {
        bail!("No capture date in metadata and no file modification time");
    };

    let (fixed_path, separator) = match kind {
        MediaKind::Image => ("", config.separator.as_str()),
        MediaKind::Video => (config.video.fixed_path.as_str(), config.video.separator.as_str()),
    };

    let fields = DestinationFields::new(date.year(), date.month(), filename)
        .with_camera(camera_label(data.make.as_deref(), data.model.as_deref()))
        .with_fixed_path(fixed_path)
        .with_separator(separator);

    Ok(Extracted {
        kind,
        fields,
        coordinate: data.gps,
        date_source,
    })
}

/// Read `path` and derive its destination fields.
pub fn extract(path: &Path, kind: MediaKind, config: &Config) -> Result<Extracted> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let data = read_metadata(path, kind)?;
    let extracted = fields_from_metadata(&filename, kind, &data, config)?;

    log::debug!(
        "  date {}-{:02} from {}, camera '{}'",
        extracted.fields.year,
        extracted.fields.month,
        extracted.date_source,
        extracted.fields.camera
    );
    Ok(extracted)
}
