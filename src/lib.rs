//! # imgmeta
//!
//! Read and write human-level metadata fields (description, artist,
//! copyright, software, datetime, user comment and custom keys) in JPEG, PNG
//! and TIFF containers.
//!
//! The crate covers:
//!
//! - **EXIF**: decoding raw tag values to text and mapping field names onto
//!   EXIF directory entries
//! - **XMP**: building and parsing RDF/XML packets
//! - **JPEG**: walking marker segments and splicing an XMP APP1 segment
//! - **PNG**: reading and rewriting `tEXt`/`iTXt` chunks
//! - **Dispatch**: choosing the right writer for a format and metadata kind
//!
//! Pixel decoding, re-encoding and binary EXIF packing are delegated to an
//! [`ImageCodec`] and an [`ExifPacker`] supplied by the caller.
//!
//! ## Example
//!
//! ```rust
//! use imgmeta::{FieldMap, JpegHandler, XmpParser, XmpSerializer};
//!
//! let mut fields = FieldMap::new();
//! fields.insert("description", "Sunset");
//! fields.insert("datetime", "2024-05-01 10:00:00");
//!
//! let packet = XmpSerializer::new().serialize_packet(&fields).unwrap();
//! let jpeg = [0xFF, 0xD8, 0xFF, 0xD9];
//! let written = JpegHandler::write_xmp(&jpeg, packet.as_bytes()).unwrap();
//!
//! let read = XmpParser::parse_fields(JpegHandler::read_xmp_packet(&written).unwrap());
//! assert_eq!(read.get("description"), Some("Sunset"));
//! assert_eq!(read.get("datetime"), Some("2024-05-01T10:00:00"));
//! ```

pub mod core;
pub mod exif;
pub mod files;
pub mod types;
pub mod utils;

pub use core::error::{MetaError, MetaResult};
pub use core::namespace::CustomNamespace;
pub use core::parser::XmpParser;
pub use core::serializer::XmpSerializer;
pub use exif::{ExifIfdMap, ExifValue, IfdKind};
pub use files::{
    DecodedImage, ExifPacker, ImageCodec, MetadataCodec, MetadataReport, WriteOptions,
    WriteOutcome, WritePath,
};
#[cfg(feature = "jpeg")]
pub use files::JpegHandler;
#[cfg(feature = "png")]
pub use files::PngTextChunks;
pub use types::{ContainerFormat, FieldMap, MetadataKind, StandardField};
