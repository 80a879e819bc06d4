//! EXIF image file directories
//!
//! The four directories an EXIF blob carries, as parsed by an
//! [`ExifPacker`](crate::files::handler::ExifPacker), plus the optional
//! embedded thumbnail.

use std::collections::BTreeMap;
use std::fmt;

/// Tag ids used by the field mapper and value codec
pub mod tags {
    /// IFD0 ImageDescription
    pub const IMAGE_DESCRIPTION: u16 = 270;
    /// IFD0 Make
    pub const MAKE: u16 = 271;
    /// IFD0 Model
    pub const MODEL: u16 = 272;
    /// IFD0 Orientation
    pub const ORIENTATION: u16 = 274;
    /// IFD0 XResolution
    pub const X_RESOLUTION: u16 = 282;
    /// IFD0 YResolution
    pub const Y_RESOLUTION: u16 = 283;
    /// IFD0 ResolutionUnit
    pub const RESOLUTION_UNIT: u16 = 296;
    /// IFD0 Software
    pub const SOFTWARE: u16 = 305;
    /// IFD0 DateTime
    pub const DATE_TIME: u16 = 306;
    /// IFD0 Artist
    pub const ARTIST: u16 = 315;
    /// IFD0 Copyright
    pub const COPYRIGHT: u16 = 33432;
    /// Pointer to the Exif IFD
    pub const EXIF_IFD_POINTER: u16 = 34665;
    /// Pointer to the GPS IFD
    pub const GPS_IFD_POINTER: u16 = 34853;
    /// Exif DateTimeOriginal
    pub const DATE_TIME_ORIGINAL: u16 = 36867;
    /// Exif DateTimeDigitized
    pub const DATE_TIME_DIGITIZED: u16 = 36868;
    /// Exif UserComment (charset-prefixed)
    pub const USER_COMMENT: u16 = 37510;
    /// Windows XPTitle (UTF-16LE)
    pub const XP_TITLE: u16 = 40091;
    /// Windows XPComment (UTF-16LE)
    pub const XP_COMMENT: u16 = 40092;
    /// Windows XPAuthor (UTF-16LE)
    pub const XP_AUTHOR: u16 = 40093;
    /// Windows XPKeywords (UTF-16LE)
    pub const XP_KEYWORDS: u16 = 40094;
    /// Windows XPSubject (UTF-16LE)
    pub const XP_SUBJECT: u16 = 40095;
}

/// Which of the four directories an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IfdKind {
    /// Primary image directory ("0th")
    Zeroth,
    /// EXIF sub-directory
    Exif,
    /// GPS sub-directory
    Gps,
    /// Thumbnail directory ("1st")
    First,
}

impl IfdKind {
    /// Conventional directory name
    pub fn name(self) -> &'static str {
        match self {
            IfdKind::Zeroth => "0th",
            IfdKind::Exif => "Exif",
            IfdKind::Gps => "GPS",
            IfdKind::First => "1st",
        }
    }
}

impl fmt::Display for IfdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw tag value as produced by the EXIF parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExifValue {
    /// BYTE / SHORT / LONG / SLONG values
    Integer(Vec<i64>),
    /// RATIONAL / SRATIONAL values as (numerator, denominator)
    Rational(Vec<(i64, i64)>),
    /// ASCII string, without the trailing NUL
    Ascii(String),
    /// UNDEFINED or otherwise uninterpreted bytes
    Bytes(Vec<u8>),
}

/// One directory: tag id to value
pub type Ifd = BTreeMap<u16, ExifValue>;

/// All EXIF directories of an image plus its thumbnail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifIfdMap {
    /// Primary image directory
    pub zeroth: Ifd,
    /// EXIF sub-directory
    pub exif: Ifd,
    /// GPS sub-directory
    pub gps: Ifd,
    /// Thumbnail directory
    pub first: Ifd,
    /// Embedded JPEG thumbnail
    pub thumbnail: Option<Vec<u8>>,
}

impl ExifIfdMap {
    /// Four empty directories and no thumbnail
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow one directory
    pub fn ifd(&self, kind: IfdKind) -> &Ifd {
        match kind {
            IfdKind::Zeroth => &self.zeroth,
            IfdKind::Exif => &self.exif,
            IfdKind::Gps => &self.gps,
            IfdKind::First => &self.first,
        }
    }

    /// Mutably borrow one directory
    pub fn ifd_mut(&mut self, kind: IfdKind) -> &mut Ifd {
        match kind {
            IfdKind::Zeroth => &mut self.zeroth,
            IfdKind::Exif => &mut self.exif,
            IfdKind::Gps => &mut self.gps,
            IfdKind::First => &mut self.first,
        }
    }

    /// Whether no directory has entries and there is no thumbnail
    pub fn is_empty(&self) -> bool {
        self.zeroth.is_empty()
            && self.exif.is_empty()
            && self.gps.is_empty()
            && self.first.is_empty()
            && self.thumbnail.is_none()
    }
}

/// Conventional name of a tag, or its decimal id when unknown
pub fn tag_name(kind: IfdKind, tag: u16) -> String {
    let name = match (kind, tag) {
        (IfdKind::Gps, _) => None,
        (_, tags::IMAGE_DESCRIPTION) => Some("ImageDescription"),
        (_, tags::MAKE) => Some("Make"),
        (_, tags::MODEL) => Some("Model"),
        (_, tags::ORIENTATION) => Some("Orientation"),
        (_, tags::X_RESOLUTION) => Some("XResolution"),
        (_, tags::Y_RESOLUTION) => Some("YResolution"),
        (_, tags::RESOLUTION_UNIT) => Some("ResolutionUnit"),
        (_, tags::SOFTWARE) => Some("Software"),
        (_, tags::DATE_TIME) => Some("DateTime"),
        (_, tags::ARTIST) => Some("Artist"),
        (_, tags::COPYRIGHT) => Some("Copyright"),
        (_, tags::EXIF_IFD_POINTER) => Some("ExifOffset"),
        (_, tags::GPS_IFD_POINTER) => Some("GPSInfo"),
        (_, tags::DATE_TIME_ORIGINAL) => Some("DateTimeOriginal"),
        (_, tags::DATE_TIME_DIGITIZED) => Some("DateTimeDigitized"),
        (_, tags::USER_COMMENT) => Some("UserComment"),
        (_, tags::XP_TITLE) => Some("XPTitle"),
        (_, tags::XP_COMMENT) => Some("XPComment"),
        (_, tags::XP_AUTHOR) => Some("XPAuthor"),
        (_, tags::XP_KEYWORDS) => Some("XPKeywords"),
        (_, tags::XP_SUBJECT) => Some("XPSubject"),
        _ => None,
    };
    name.map_or_else(|| tag.to_string(), str::to_string)
}
