//! XMP Core module
//!
//! This module contains the XMP packet codec: error types, namespace
//! handling, and the packet serializer and parser.

pub mod error;
pub mod namespace;
pub mod parser;
pub mod serializer;

pub use error::{MetaError, MetaResult};
pub use namespace::{CustomNamespace, NamespaceMap};
pub use parser::XmpParser;
pub use serializer::XmpSerializer;
