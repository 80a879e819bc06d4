//! Field-name to EXIF tag mapping
//!
//! Only six human-readable fields are writable. Each maps to exactly one
//! (IFD, tag, encoder) triple through a static table; every other key is
//! ignored by the EXIF writer.

use crate::core::error::{MetaError, MetaResult};
use crate::exif::ifd::{tags, ExifIfdMap, ExifValue, IfdKind};
use crate::exif::value::ASCII_PREFIX;
use crate::types::field::{FieldMap, StandardField};

/// How a field value becomes a tag value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifEncoder {
    /// ASCII string; non-ASCII characters are dropped
    Ascii,
    /// UserComment blob: `ASCII\0\0\0` followed by the ASCII body
    PrefixedAscii,
}

/// One row of the field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExifField {
    /// Field this row encodes
    pub field: StandardField,
    /// Directory the tag lives in
    pub ifd: IfdKind,
    /// Tag id
    pub tag: u16,
    /// Value encoder
    pub encoder: ExifEncoder,
}

/// Writable EXIF fields
pub const EXIF_FIELDS: [ExifField; 6] = [
    ExifField {
        field: StandardField::Description,
        ifd: IfdKind::Zeroth,
        tag: tags::IMAGE_DESCRIPTION,
        encoder: ExifEncoder::Ascii,
    },
    ExifField {
        field: StandardField::Artist,
        ifd: IfdKind::Zeroth,
        tag: tags::ARTIST,
        encoder: ExifEncoder::Ascii,
    },
    ExifField {
        field: StandardField::Copyright,
        ifd: IfdKind::Zeroth,
        tag: tags::COPYRIGHT,
        encoder: ExifEncoder::Ascii,
    },
    ExifField {
        field: StandardField::Software,
        ifd: IfdKind::Zeroth,
        tag: tags::SOFTWARE,
        encoder: ExifEncoder::Ascii,
    },
    ExifField {
        field: StandardField::DateTime,
        ifd: IfdKind::Zeroth,
        tag: tags::DATE_TIME,
        encoder: ExifEncoder::Ascii,
    },
    ExifField {
        field: StandardField::UserComment,
        ifd: IfdKind::Exif,
        tag: tags::USER_COMMENT,
        encoder: ExifEncoder::PrefixedAscii,
    },
];

/// Look up the table row for a field key
pub fn lookup(key: &str) -> Option<&'static ExifField> {
    EXIF_FIELDS.iter().find(|row| row.field.key() == key)
}

impl ExifField {
    /// Encode `value` for this row
    ///
    /// Non-ASCII characters are dropped. A NUL character cannot be stored in
    /// an EXIF ASCII field and is rejected there; the UserComment blob keeps
    /// it.
    pub fn encode(&self, value: &str) -> MetaResult<ExifValue> {
        if self.encoder == ExifEncoder::Ascii && value.contains('\0') {
            return Err(MetaError::field(
                self.field.key(),
                "NUL characters cannot be stored in an EXIF ASCII field",
            ));
        }
        let ascii = ascii_lossy(value);
        if ascii.len() != value.len() {
            log::debug!(
                "dropped {} non-ASCII bytes from EXIF field {}",
                value.len() - ascii.len(),
                self.field
            );
        }
        Ok(match self.encoder {
            ExifEncoder::Ascii => ExifValue::Ascii(ascii),
            ExifEncoder::PrefixedAscii => {
                let mut blob = Vec::with_capacity(ASCII_PREFIX.len() + ascii.len());
                blob.extend_from_slice(ASCII_PREFIX);
                blob.extend_from_slice(ascii.as_bytes());
                ExifValue::Bytes(blob)
            }
        })
    }
}

/// Drop every non-ASCII character
pub fn ascii_lossy(value: &str) -> String {
    value.chars().filter(char::is_ascii).collect()
}

/// Merge field updates into a copy of `ifds`
///
/// Unknown keys and explicit nulls are ignored. The input is never touched:
/// on the first encoding failure the error is returned and the partially
/// merged copy is dropped.
pub fn apply_updates(ifds: &ExifIfdMap, updates: &FieldMap) -> MetaResult<ExifIfdMap> {
    let mut merged = ifds.clone();
    for (key, value) in updates.values() {
        let Some(row) = lookup(key) else {
            log::trace!("EXIF writer ignores field {key}");
            continue;
        };
        let encoded = row.encode(value)?;
        merged.ifd_mut(row.ifd).insert(row.tag, encoded);
    }
    Ok(merged)
}

/// The subset of `updates` the EXIF writer consumes, nulls included
pub fn exif_subset(updates: &FieldMap) -> FieldMap {
    updates.filtered(|key| lookup(key).is_some())
}
