use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

// Olympus Wi-Fi API commands.
pub const GET_MODE_PLAY: &str = "/switch_cammode.cgi?mode=play";
pub const GET_IMGLIST: &str = "/get_imglist.cgi";
pub const GET_THUMBNAIL: &str = "/get_thumbnail.cgi";
pub const GET_CAMINFO: &str = "/get_caminfo.cgi";

// DCIM directory attribute bits.
pub const ATTRIB_NONE: u32 = 0;
pub const ATTRIB_HIDDEN: u32 = 2;
pub const ATTRIB_SYSTEM: u32 = 4;
pub const ATTRIB_VOLUME: u32 = 8;
pub const ATTRIB_DIRECTORY: u32 = 16;

/// Timestamp format used for thumbnail cache keys and display.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One line of a `get_imglist.cgi` response.
///
/// ```text
/// VER_100
/// /DCIM,100OLYMP,0,16,22278,35850
/// /DCIM/100OLYMP,P8060001.JPG,8924081,0,22278,35850
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    pub dir: String,
    pub name: String,
    pub size: u64,
    pub attributes: u32,
    pub date: u16,
    pub time: u16,
}

impl ListingLine {
    /// Full camera path of the entry.
    pub fn path(&self) -> String {
        format!("{}/{}", self.dir.trim_end_matches('/'), self.name)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & ATTRIB_DIRECTORY != 0
    }

    /// Hidden, system and volume entries are never shown.
    pub fn is_ignored(&self) -> bool {
        self.attributes & (ATTRIB_HIDDEN | ATTRIB_SYSTEM | ATTRIB_VOLUME) != 0
    }

    pub fn is_plain_file(&self) -> bool {
        self.attributes == ATTRIB_NONE
    }
}

/// Parse a single listing line.
pub fn parse_listing_line(line: &str) -> Result<ListingLine> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != 6 {
        bail!("expected 6 fields, found {}", parts.len());
    }
    Ok(ListingLine {
        dir: parts[0].to_string(),
        name: parts[1].to_string(),
        size: parts[2].trim().parse().context("bad size")?,
        attributes: parts[3].trim().parse().context("bad attributes")?,
        date: parts[4].trim().parse().context("bad date")?,
        time: parts[5].trim().parse().context("bad time")?,
    })
}

/// Parse a whole listing body. The `VER_` header and blank lines are skipped,
/// malformed lines are logged and dropped.
pub fn parse_listing(body: &str) -> Vec<ListingLine> {
    let mut lines = Vec::new();
    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with("VER_") {
            continue;
        }
        match parse_listing_line(line) {
            Ok(parsed) => lines.push(parsed),
            Err(e) => log::warn!("Malformed line from {GET_IMGLIST}: \"{line}\": {e}"),
        }
    }
    lines
}

/// Decode the packed FAT date/time pair the camera reports.
///
/// Returns `None` when the fields do not form a real date (a camera with an
/// unset clock reports zeros).
pub fn decode_timestamp(date: u16, time: u16) -> Option<NaiveDateTime> {
    let year = 1980 + i32::from(date >> 9);
    let month = u32::from((date >> 5) & 15);
    let day = u32::from(date & 31);
    let hour = u32::from(time >> 11);
    let minute = u32::from((time >> 5) & 63);
    let second = 2 * u32::from(time & 31);
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Format the packed date/time the same way whether or not it is a valid date.
pub fn format_timestamp(date: u16, time: u16) -> String {
    format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}",
        1980 + u32::from(date >> 9),
        (date >> 5) & 15,
        date & 31,
        time >> 11,
        (time >> 5) & 63,
        2 * (time & 31)
    )
}

/// A file on the camera, as shown in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteImage {
    /// Full camera path, e.g. `/DCIM/100OLYMP/P8060001.JPG`.
    pub path: String,
    pub size: u64,
    #[serde(skip)]
    pub date: u16,
    #[serde(skip)]
    pub time: u16,
    /// Formatted capture time.
    pub timestamp: String,
}

impl RemoteImage {
    pub fn from_line(line: &ListingLine) -> Self {
        Self {
            path: line.path(),
            size: line.size,
            date: line.date,
            time: line.time,
            timestamp: format_timestamp(line.date, line.time),
        }
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name().rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn is_video(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("MOV"))
    }

    pub fn captured_at(&self) -> Option<NaiveDateTime> {
        decode_timestamp(self.date, self.time)
    }

    /// Path and query of the thumbnail request.
    pub fn thumbnail_request(&self) -> String {
        format!("{GET_THUMBNAIL}?DIR={}", self.path)
    }
}

/// Sort newest first; ties (and undated entries) fall back to the path, also descending.
pub fn sort_newest_first(images: &mut [RemoteImage]) {
    images.sort_by(|a, b| {
        b.captured_at()
            .cmp(&a.captured_at())
            .then_with(|| b.path.cmp(&a.path))
    });
}
