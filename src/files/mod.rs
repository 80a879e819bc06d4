//! Container support for image metadata
//!
//! This module holds the format handlers, the collaborator traits used for
//! pixel-level work and the dispatcher that ties them together.

pub mod dispatch;
pub mod formats;
pub mod handler;

pub use dispatch::{MetadataCodec, MetadataReport, WriteOutcome, WritePath};
#[cfg(feature = "jpeg")]
pub use formats::jpeg::{JpegHandler, JpegSegment, ScanEnd, SegmentWalker, XmpLocation};
#[cfg(feature = "png")]
pub use formats::png::{PngTextChunks, TextChunkKind, TextEntry};
pub use handler::{DecodedImage, ExifPacker, ImageCodec, WriteOptions};
