//! Utility functions and helpers

pub mod bytes;
pub mod datetime;

pub use bytes::ByteView;
pub use datetime::{normalize_modify_date, XmpDateTime};
