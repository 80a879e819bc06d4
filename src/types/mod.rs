//! Shared value types
//!
//! This module defines the field maps and format enums used across readers
//! and writers.

pub mod field;
pub mod format;

pub use field::{FieldMap, StandardField};
pub use format::{ContainerFormat, MetadataKind};
