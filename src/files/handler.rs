//! Collaborator traits and write options
//!
//! Pixel decoding, container re-encoding and EXIF directory packing are not
//! done by this crate. Callers plug them in through [`ImageCodec`] and
//! [`ExifPacker`]; everything else is handled by the built-in format handlers.

use crate::core::error::MetaResult;
use crate::core::namespace::CustomNamespace;
use crate::exif::ifd::ExifIfdMap;
use crate::types::format::{ContainerFormat, MetadataKind};

/// Options for metadata writes.
///
/// Use the builder pattern to configure options.
///
/// # Example
///
/// ```rust
/// use imgmeta::{ContainerFormat, MetadataKind, WriteOptions};
///
/// let options = WriteOptions::default()
///     .kind(MetadataKind::Xmp)
///     .format(ContainerFormat::Tiff)
///     .tiff_xmp_fallback(true);
/// assert_eq!(options.kind, Some(MetadataKind::Xmp));
/// ```
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Metadata kind to write (default: per format, see [`MetadataKind::default_for`])
    pub kind: Option<MetadataKind>,
    /// Declared container format, overriding detection
    pub format: Option<ContainerFormat>,
    /// Write EXIF instead of rejecting XMP writes to TIFF
    pub tiff_xmp_fallback: bool,
    /// Namespace for custom XMP keys
    pub custom_namespace: CustomNamespace,
}

impl WriteOptions {
    /// Write this kind of metadata.
    pub fn kind(mut self, kind: MetadataKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Treat the input as this format instead of sniffing it.
    pub fn format(mut self, format: ContainerFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Treat the input as the named format (`JPEG`, `JPG`, `PNG`, `TIFF`, ...).
    ///
    /// Unrecognized names select [`ContainerFormat::Unknown`], which has no
    /// writer.
    pub fn format_name(self, name: &str) -> Self {
        self.format(ContainerFormat::from_name(name))
    }

    /// Route XMP writes for TIFF to the EXIF writer.
    ///
    /// TIFF has no XMP writer; by default such writes are rejected with
    /// [`MetaError::UnsupportedWriteFormat`](crate::MetaError::UnsupportedWriteFormat).
    pub fn tiff_xmp_fallback(mut self, enabled: bool) -> Self {
        self.tiff_xmp_fallback = enabled;
        self
    }

    /// Write custom XMP keys under this namespace.
    pub fn custom_namespace(mut self, namespace: CustomNamespace) -> Self {
        self.custom_namespace = namespace;
        self
    }
}

/// What an [`ImageCodec`] reports about a decoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Container format the codec recognized
    pub format: ContainerFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Text key/value pairs the codec found (PNG text, comments)
    pub text: Vec<(String, String)>,
    /// Raw EXIF blob, if the image carries one
    pub exif: Option<Vec<u8>>,
}

impl DecodedImage {
    /// An image with no text and no EXIF
    pub fn new(format: ContainerFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            text: Vec::new(),
            exif: None,
        }
    }
}

/// Image decoding and re-encoding backend
///
/// Used to open images for the read path and to re-encode JPEG/TIFF
/// containers with a new EXIF blob on the EXIF write path.
pub trait ImageCodec: Send + Sync {
    /// Decode enough of `data` to report format, size, text and EXIF
    ///
    /// Fails with [`MetaError::InvalidContainer`](crate::MetaError::InvalidContainer)
    /// when `data` is not an image.
    fn decode(&self, data: &[u8]) -> MetaResult<DecodedImage>;

    /// Re-encode `data` as `format` with `exif` attached
    fn reencode(&self, data: &[u8], format: ContainerFormat, exif: &[u8]) -> MetaResult<Vec<u8>>;
}

/// TIFF/EXIF directory parser and packer
pub trait ExifPacker: Send + Sync {
    /// Parse the EXIF directories of an image or raw EXIF blob
    fn load(&self, data: &[u8]) -> MetaResult<ExifIfdMap>;

    /// Pack directories into a binary EXIF blob
    fn dump(&self, ifds: &ExifIfdMap) -> MetaResult<Vec<u8>>;
}

impl<T: ImageCodec + ?Sized> ImageCodec for &T {
    fn decode(&self, data: &[u8]) -> MetaResult<DecodedImage> {
        (**self).decode(data)
    }

    fn reencode(&self, data: &[u8], format: ContainerFormat, exif: &[u8]) -> MetaResult<Vec<u8>> {
        (**self).reencode(data, format, exif)
    }
}

impl<T: ExifPacker + ?Sized> ExifPacker for &T {
    fn load(&self, data: &[u8]) -> MetaResult<ExifIfdMap> {
        (**self).load(data)
    }

    fn dump(&self, ifds: &ExifIfdMap) -> MetaResult<Vec<u8>> {
        (**self).dump(ifds)
    }
}
