use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use exif::{Exif, In, Tag, Value};
use nom_exif::{EntryValue, LatLng, MediaParser, MediaSource, TrackInfo, TrackInfoTag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::probe::MediaKind;
use crate::geocode::Coordinate;

/// Raw metadata gathered from one media file.
///
/// Every field is optional; which ones end up populated depends on the media kind and
/// on what the file actually carries. All timestamps are in local time.
#[derive(Debug, Clone, Default)]
pub struct MediaMetadata {
    /// EXIF `DateTimeDigitized`.
    pub digitized: Option<DateTime<Local>>,
    /// EXIF `DateTimeOriginal`.
    pub original: Option<DateTime<Local>>,
    /// Container creation time (QuickTime `mvhd`, Matroska `DateUTC`).
    pub container_created: Option<DateTime<Local>>,
    /// File system last-modified time.
    pub modified: Option<DateTime<Local>>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub gps: Option<Coordinate>,
}

/// Read the metadata of a media file of the given kind.
///
/// Missing or corrupt embedded metadata is not an error: the affected fields stay `None`
/// and the file system timestamp is still collected. Only failing to open the file is.
pub fn read_metadata(path: &Path, kind: MediaKind) -> Result<MediaMetadata> {
    let fs_meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file attributes of {}", path.display()))?;

    let mut data = MediaMetadata {
        modified: fs_meta.modified().ok().map(DateTime::<Local>::from),
        ..Default::default()
    };

    match kind {
        MediaKind::Image => match read_exif(path) {
            Ok(exif) => apply_exif(&exif, &mut data),
            Err(e) => log::debug!("No EXIF data in {}: {e:#}", path.display()),
        },
        MediaKind::Video => match read_track(path) {
            Ok(info) => apply_track(&info, &mut data),
            Err(e) => log::debug!("No container metadata in {}: {e:#}", path.display()),
        },
    }

    Ok(data)
}

fn read_exif(path: &Path) -> Result<Exif> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    exif::Reader::new()
        .read_from_container(&mut reader)
        .context("Failed to read EXIF data")
}

fn read_track(path: &Path) -> Result<TrackInfo> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open video file")?;
    let info: TrackInfo = parser.parse(ms).context("Failed to parse container")?;
    Ok(info)
}

/// Unix time of 1904-01-01. A zero QuickTime timestamp decodes to it and means unset.
const QUICKTIME_EPOCH: i64 = -2_082_844_800;

fn apply_track(info: &TrackInfo, data: &mut MediaMetadata) {
    data.container_created = info
        .get(TrackInfoTag::CreateDate)
        .and_then(EntryValue::as_time)
        .filter(|t| t.timestamp() > QUICKTIME_EPOCH)
        .map(|t| t.with_timezone(&Local));
    data.make = info.get(TrackInfoTag::Make).and_then(entry_to_string);
    data.model = info.get(TrackInfoTag::Model).and_then(entry_to_string);
    data.gps = info.get_gps_info().and_then(|gps| {
        Coordinate::new(
            latlng_to_decimal(&gps.latitude, gps.latitude_ref),
            latlng_to_decimal(&gps.longitude, gps.longitude_ref),
        )
    });
}

fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn latlng_to_decimal(latlng: &LatLng, reference: char) -> f64 {
    let degrees = latlng.0.0 as f64 / latlng.0.1 as f64;
    let minutes = latlng.1.0 as f64 / latlng.1.1 as f64;
    let seconds = latlng.2.0 as f64 / latlng.2.1 as f64;
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if reference == 'S' || reference == 'W' { -decimal } else { decimal }
}

fn apply_exif(exif: &Exif, data: &mut MediaMetadata) {
    data.digitized = exif_datetime(exif, Tag::DateTimeDigitized, Tag::OffsetTimeDigitized);
    data.original = exif_datetime(exif, Tag::DateTimeOriginal, Tag::OffsetTimeOriginal);
    data.make = ascii_field(exif, Tag::Make);
    data.model = ascii_field(exif, Tag::Model);
    data.gps = gps_coordinate(exif);
}

/// First string of an ASCII field, trimmed of NUL padding and whitespace.
fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref values) => {
            let raw = values.first()?;
            let s = String::from_utf8_lossy(raw);
            let s = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        _ => None,
    }
}

fn ascii_first(exif: &Exif, tag: Tag) -> Option<&[u8]> {
    match exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(ref values) => values.first().map(Vec::as_slice),
        _ => None,
    }
}

/// Parse an EXIF date/time field into local time.
///
/// EXIF timestamps have no zone. Without the matching offset tag they are taken as local
/// wall-clock time; with it they are converted to local time.
fn exif_datetime(exif: &Exif, tag: Tag, offset_tag: Tag) -> Option<DateTime<Local>> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let raw = match field.value {
        Value::Ascii(ref values) => values.first()?,
        _ => return None,
    };

    let mut dt = exif::DateTime::from_ascii(raw).ok()?;
    if let Some(offset) = ascii_first(exif, offset_tag) {
        if let Err(e) = dt.parse_offset(offset) {
            log::debug!(
                "Ignoring malformed {offset_tag} '{}': {e}",
                String::from_utf8_lossy(offset)
            );
        }
    }

    let naive = NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?
        .and_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into())?;

    match dt.offset {
        Some(minutes) => {
            let offset = FixedOffset::east_opt(i32::from(minutes) * 60)?;
            let fixed = offset.from_local_datetime(&naive).single()?;
            Some(fixed.with_timezone(&Local))
        }
        None => Local.from_local_datetime(&naive).earliest(),
    }
}

/// GPS position from the GPS IFD, if complete and in range.
fn gps_coordinate(exif: &Exif) -> Option<Coordinate> {
    let latitude = gps_degrees(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = gps_degrees(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    Coordinate::new(latitude, longitude)
}

/// Decimal degrees from a degrees/minutes/seconds rational triple and its hemisphere.
fn gps_degrees(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let dms = match exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(ref parts) if !parts.is_empty() => parts.clone(),
        _ => return None,
    };
    let hemisphere = match exif.get_field(ref_tag, In::PRIMARY)?.value {
        Value::Ascii(ref values) => *values.first()?.first()?,
        _ => return None,
    };

    let mut degrees = 0.0;
    for (part, scale) in dms.iter().zip([1.0, 60.0, 3600.0]) {
        if part.denom == 0 {
            return None;
        }
        degrees += part.to_f64() / scale;
    }

    if hemisphere.eq_ignore_ascii_case(&negative_ref) {
        degrees = -degrees;
    }
    Some(degrees)
}
