//! Format dispatch for metadata reads and writes
//!
//! [`MetadataCodec`] detects the container format, picks a [`WritePath`] for
//! the requested metadata kind and runs it. Reads gather every kind of
//! metadata the container carries and never fail on bad metadata.

use crate::core::error::{MetaError, MetaResult};
use crate::core::parser::XmpParser;
use crate::core::serializer::XmpSerializer;
use crate::exif::ifd::{tag_name, ExifIfdMap, IfdKind};
use crate::exif::mapper::{apply_updates, exif_subset};
use crate::exif::value::{decode_value, DecodedValue};
#[cfg(feature = "jpeg")]
use crate::files::formats::jpeg::JpegHandler;
#[cfg(feature = "png")]
use crate::files::formats::png::{PngTextChunks, XMP_KEYWORD};
use crate::files::handler::{DecodedImage, ExifPacker, ImageCodec, WriteOptions};
use crate::types::field::FieldMap;
use crate::types::format::{ContainerFormat, MetadataKind};
use std::collections::BTreeMap;
use std::fmt;

/// The writer a request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum WritePath {
    /// Merge fields into the EXIF directories and re-encode (JPEG, TIFF)
    Exif,
    /// Splice an XMP APP1 segment into a JPEG
    XmpJpeg,
    /// Store an XMP packet in a PNG `iTXt` chunk
    XmpPng,
    /// Store fields as PNG text chunks
    PngText,
}

impl WritePath {
    /// Route a write of `kind` metadata to a `format` container
    ///
    /// | format | kind | path |
    /// |---|---|---|
    /// | JPEG | EXIF | `Exif` |
    /// | JPEG | XMP | `XmpJpeg` |
    /// | TIFF | EXIF | `Exif` |
    /// | TIFF | XMP | rejected, or `Exif` with [`WriteOptions::tiff_xmp_fallback`] |
    /// | PNG | XMP | `XmpPng` |
    /// | PNG | PNG text | `PngText` |
    ///
    /// Everything else is rejected with [`MetaError::UnsupportedWriteFormat`].
    #[cfg_attr(not(feature = "tiff"), allow(unused_variables))]
    pub fn plan(
        format: ContainerFormat,
        kind: MetadataKind,
        options: &WriteOptions,
    ) -> MetaResult<Self> {
        use ContainerFormat as F;
        use MetadataKind as K;

        match (format, kind) {
            #[cfg(feature = "jpeg")]
            (F::Jpeg, K::Exif) => Ok(WritePath::Exif),
            #[cfg(feature = "jpeg")]
            (F::Jpeg, K::Xmp) => Ok(WritePath::XmpJpeg),
            #[cfg(feature = "tiff")]
            (F::Tiff, K::Exif) => Ok(WritePath::Exif),
            #[cfg(feature = "tiff")]
            (F::Tiff, K::Xmp) if options.tiff_xmp_fallback => {
                log::warn!("TIFF has no XMP writer, writing EXIF fields instead");
                Ok(WritePath::Exif)
            }
            #[cfg(feature = "png")]
            (F::Png, K::Xmp) => Ok(WritePath::XmpPng),
            #[cfg(feature = "png")]
            (F::Png, K::PngText) => Ok(WritePath::PngText),
            _ => Err(MetaError::UnsupportedWriteFormat {
                format: format.name().to_string(),
                kind: kind.to_string(),
            }),
        }
    }
}

impl fmt::Display for WritePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WritePath::Exif => "EXIF",
            WritePath::XmpJpeg => "XMP (JPEG APP1)",
            WritePath::XmpPng => "XMP (PNG iTXt)",
            WritePath::PngText => "PNG text",
        })
    }
}

/// Everything a read found in a container
///
/// Sections with nothing in them are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetadataReport {
    /// Container format
    pub format: ContainerFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Decoded EXIF tags of the primary and Exif directories, by tag name
    pub exif: Option<BTreeMap<String, DecodedValue>>,
    /// PNG text entries in stream order
    pub png_text: Option<FieldMap>,
    /// Fields of the embedded XMP packet
    pub xmp: Option<FieldMap>,
}

#[cfg(feature = "serde")]
impl MetadataReport {
    /// Serialize the report as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// The rewritten container
    pub data: Vec<u8>,
    /// Format the container was written as
    pub format: ContainerFormat,
    /// Writer that produced `data`
    pub path: WritePath,
    /// The fields the writer consumed
    pub updated: FieldMap,
}

/// Reads and writes image metadata through pluggable codecs
///
/// `C` decodes and re-encodes images; `P` parses and packs EXIF directories.
/// The codec holds no mutable state and can be shared across threads when
/// both collaborators can.
#[derive(Debug, Clone)]
pub struct MetadataCodec<C, P> {
    codec: C,
    packer: P,
}

impl<C: ImageCodec, P: ExifPacker> MetadataCodec<C, P> {
    /// Create a codec over an image backend and an EXIF packer
    pub fn new(codec: C, packer: P) -> Self {
        Self { codec, packer }
    }

    /// The image backend
    pub fn image_codec(&self) -> &C {
        &self.codec
    }

    /// The EXIF packer
    pub fn exif_packer(&self) -> &P {
        &self.packer
    }

    /// Route a write of `kind` metadata to a `format` container
    ///
    /// See [`WritePath::plan`] for the routing table.
    pub fn plan(
        &self,
        format: ContainerFormat,
        kind: MetadataKind,
        options: &WriteOptions,
    ) -> MetaResult<WritePath> {
        WritePath::plan(format, kind, options)
    }

    /// Determine the container format of `data`
    ///
    /// The buffer must look like an image even when the options declare a
    /// format; the declared format then wins over the detected one.
    pub fn detect_format(data: &[u8], options: &WriteOptions) -> MetaResult<ContainerFormat> {
        let Some(sniffed) = ContainerFormat::sniff(data) else {
            return Err(MetaError::InvalidContainer(
                "data is not a recognized image container".to_string(),
            ));
        };
        match options.format {
            Some(declared) if declared != sniffed => {
                log::debug!("declared format {declared} overrides detected {sniffed}");
                Ok(declared)
            }
            Some(declared) => Ok(declared),
            None => Ok(sniffed),
        }
    }

    /// Read every kind of metadata in `data`
    ///
    /// Only an undecodable image is an error. Broken EXIF, XMP or text
    /// chunks leave their section empty.
    pub fn read(&self, data: &[u8]) -> MetaResult<MetadataReport> {
        let decoded = self.codec.decode(data)?;
        let format = decoded.format;

        let exif = self.read_exif(data, &decoded);
        let png_text = Self::read_png_text(data, &decoded);
        let xmp = Self::read_xmp(data, format);

        Ok(MetadataReport {
            format,
            width: decoded.width,
            height: decoded.height,
            exif,
            png_text,
            xmp,
        })
    }

    /// Write `updates` into `data`
    ///
    /// Nothing is written when any step fails; `data` itself is never
    /// modified.
    pub fn write(
        &self,
        data: &[u8],
        updates: &FieldMap,
        options: &WriteOptions,
    ) -> MetaResult<WriteOutcome> {
        let format = Self::detect_format(data, options)?;
        let kind = options
            .kind
            .unwrap_or_else(|| MetadataKind::default_for(format));
        let path = self.plan(format, kind, options)?;
        log::debug!("writing {kind} metadata to {format} via {path}");

        let (written, updated) = match path {
            WritePath::Exif => (self.write_exif(data, format, updates)?, exif_subset(updates)),
            WritePath::XmpJpeg => (Self::write_xmp_jpeg(data, updates, options)?, updates.clone()),
            WritePath::XmpPng => (Self::write_xmp_png(data, updates, options)?, updates.clone()),
            WritePath::PngText => (Self::write_png_text(data, updates)?, updates.clone()),
        };

        Ok(WriteOutcome {
            data: written,
            format,
            path,
            updated,
        })
    }

    fn write_exif(
        &self,
        data: &[u8],
        format: ContainerFormat,
        updates: &FieldMap,
    ) -> MetaResult<Vec<u8>> {
        let ifds = self.packer.load(data).unwrap_or_else(|e| {
            log::debug!("no usable EXIF in input ({e}), starting from empty directories");
            ExifIfdMap::default()
        });
        let merged = apply_updates(&ifds, updates)?;
        let blob = self
            .packer
            .dump(&merged)
            .map_err(|e| e.into_embed("exif pack"))?;
        self.codec
            .reencode(data, format, &blob)
            .map_err(|e| e.into_embed("exif re-encode"))
    }

    #[cfg(feature = "jpeg")]
    fn write_xmp_jpeg(
        data: &[u8],
        updates: &FieldMap,
        options: &WriteOptions,
    ) -> MetaResult<Vec<u8>> {
        let packet = XmpSerializer::with_namespace(options.custom_namespace.clone())
            .serialize_packet(updates)?;
        JpegHandler::write_xmp(data, packet.as_bytes())
    }

    #[cfg(not(feature = "jpeg"))]
    fn write_xmp_jpeg(_: &[u8], _: &FieldMap, _: &WriteOptions) -> MetaResult<Vec<u8>> {
        Err(MetaError::UnsupportedWriteFormat {
            format: ContainerFormat::Jpeg.name().to_string(),
            kind: MetadataKind::Xmp.to_string(),
        })
    }

    #[cfg(feature = "png")]
    fn write_xmp_png(
        data: &[u8],
        updates: &FieldMap,
        options: &WriteOptions,
    ) -> MetaResult<Vec<u8>> {
        let packet = XmpSerializer::with_namespace(options.custom_namespace.clone())
            .serialize_packet(updates)?;
        let mut text = PngTextChunks::read(data)?;
        text.add_itxt(XMP_KEYWORD, &packet)?;
        text.embed(data)
    }

    #[cfg(not(feature = "png"))]
    fn write_xmp_png(_: &[u8], _: &FieldMap, _: &WriteOptions) -> MetaResult<Vec<u8>> {
        Err(MetaError::UnsupportedWriteFormat {
            format: ContainerFormat::Png.name().to_string(),
            kind: MetadataKind::Xmp.to_string(),
        })
    }

    #[cfg(feature = "png")]
    fn write_png_text(data: &[u8], updates: &FieldMap) -> MetaResult<Vec<u8>> {
        let mut text = PngTextChunks::read(data)?;
        for (key, value) in updates.values() {
            text.add_text(key, value)?;
        }
        text.embed(data)
    }

    #[cfg(not(feature = "png"))]
    fn write_png_text(_: &[u8], _: &FieldMap) -> MetaResult<Vec<u8>> {
        Err(MetaError::UnsupportedWriteFormat {
            format: ContainerFormat::Png.name().to_string(),
            kind: MetadataKind::PngText.to_string(),
        })
    }

    /// Decoded tags of the primary and Exif directories
    fn read_exif(
        &self,
        data: &[u8],
        decoded: &DecodedImage,
    ) -> Option<BTreeMap<String, DecodedValue>> {
        let source = match (&decoded.exif, decoded.format) {
            (Some(blob), _) => blob.as_slice(),
            (None, ContainerFormat::Jpeg | ContainerFormat::Tiff) => data,
            (None, _) => return None,
        };
        let ifds = match self.packer.load(source) {
            Ok(ifds) => ifds,
            Err(e) => {
                log::debug!("ignoring unreadable EXIF: {e}");
                return None;
            }
        };

        let tags: BTreeMap<String, DecodedValue> = [IfdKind::Zeroth, IfdKind::Exif]
            .into_iter()
            .flat_map(|kind| {
                ifds.ifd(kind)
                    .iter()
                    .map(move |(&tag, value)| (tag_name(kind, tag), decode_value(tag, value)))
            })
            .collect();
        (!tags.is_empty()).then_some(tags)
    }

    fn read_png_text(data: &[u8], decoded: &DecodedImage) -> Option<FieldMap> {
        if decoded.format != ContainerFormat::Png {
            return None;
        }
        #[cfg(feature = "png")]
        let pairs: FieldMap = match PngTextChunks::read(data) {
            Ok(text) => text.entries().collect(),
            Err(e) => {
                log::debug!("ignoring unreadable PNG text: {e}");
                FieldMap::new()
            }
        };
        #[cfg(not(feature = "png"))]
        let pairs: FieldMap = {
            let _ = data;
            decoded.text.iter().cloned().collect()
        };
        (!pairs.is_empty()).then_some(pairs)
    }

    fn read_xmp(data: &[u8], format: ContainerFormat) -> Option<FieldMap> {
        let fields = match format {
            #[cfg(feature = "jpeg")]
            ContainerFormat::Jpeg => XmpParser::parse_fields(JpegHandler::read_xmp_packet(data)?),
            #[cfg(feature = "png")]
            ContainerFormat::Png => {
                let text = PngTextChunks::read(data).ok()?;
                XmpParser::parse_str(text.get(XMP_KEYWORD)?)
            }
            _ => return None,
        };
        (!fields.is_empty()).then_some(fields)
    }
}
