//! Container formats and metadata kinds

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// PNG file signature
const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Signatures of images that can be opened but have no writer here
const OTHER_SIGNATURES: &[&[u8]] = &[b"GIF87a", b"GIF89a", b"BM"];

/// Image container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum ContainerFormat {
    /// JPEG / JFIF / EXIF
    Jpeg,
    /// PNG
    Png,
    /// TIFF
    Tiff,
    /// Any other image format
    Unknown,
}

impl ContainerFormat {
    /// Upper-case format name
    pub fn name(self) -> &'static str {
        match self {
            ContainerFormat::Jpeg => "JPEG",
            ContainerFormat::Png => "PNG",
            ContainerFormat::Tiff => "TIFF",
            ContainerFormat::Unknown => "UNKNOWN",
        }
    }

    /// Parse a declared format name (case-insensitive)
    ///
    /// `JPG` is an alias for `JPEG` and `TIF` for `TIFF`; anything else is
    /// [`ContainerFormat::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "JPEG" | "JPG" => ContainerFormat::Jpeg,
            "PNG" => ContainerFormat::Png,
            "TIFF" | "TIF" => ContainerFormat::Tiff,
            _ => ContainerFormat::Unknown,
        }
    }

    /// Detect the container format from magic bytes
    ///
    /// Returns `None` when the buffer does not look like any image at all.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if is_jpeg(data) {
            return Some(ContainerFormat::Jpeg);
        }
        if data.starts_with(PNG_SIGNATURE) {
            return Some(ContainerFormat::Png);
        }
        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            return Some(ContainerFormat::Tiff);
        }
        if is_webp(data) || OTHER_SIGNATURES.iter().any(|sig| data.starts_with(sig)) {
            return Some(ContainerFormat::Unknown);
        }
        None
    }
}

/// Check for the SOI marker followed by a plausible second marker
fn is_jpeg(data: &[u8]) -> bool {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return false;
    }

    // Skip 0xFF padding and the high byte of the next marker
    let window = &data[..data.len().min(100)];
    let mut pos = 2;
    while pos < window.len() && window[pos] == 0xFF {
        pos += 1;
    }
    if pos >= window.len() {
        return true;
    }

    let id = window[pos];
    if id >= 0xDD {
        return true;
    }
    // standalone markers cannot follow SOI
    !(id < 0xC0 || (id & 0xF8) == 0xD0 || id == 0xD8 || id == 0xDA || id == 0xDC)
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContainerFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Which kind of metadata a write targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MetadataKind {
    /// EXIF IFD fields (JPEG, TIFF)
    Exif,
    /// XMP packet (JPEG APP1, PNG iTXt)
    Xmp,
    /// Plain PNG text chunks
    PngText,
}

impl MetadataKind {
    /// The kind written when a request does not name one
    pub fn default_for(format: ContainerFormat) -> Self {
        match format {
            ContainerFormat::Tiff => MetadataKind::Exif,
            _ => MetadataKind::Xmp,
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetadataKind::Exif => "EXIF",
            MetadataKind::Xmp => "XMP",
            MetadataKind::PngText => "PNG text",
        })
    }
}
