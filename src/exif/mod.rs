//! EXIF tag model, value decoding and field mapping
//!
//! Directory parsing and packing are left to an
//! [`ExifPacker`](crate::files::handler::ExifPacker); this module only works
//! on already-parsed directories.

pub mod ifd;
pub mod mapper;
pub mod value;

pub use ifd::{tag_name, ExifIfdMap, ExifValue, Ifd, IfdKind};
pub use mapper::{apply_updates, ExifField, EXIF_FIELDS};
pub use value::{decode_user_comment, decode_value, DecodedValue};
