//! Namespace handling for XMP packets
//!
//! The packet codec only knows a handful of namespaces: the fixed `x`, `rdf`,
//! `dc` and `xmp` schemas plus one custom namespace for passthrough keys.

use std::collections::HashMap;

/// Built-in XMP namespaces
pub mod ns {
    /// Adobe meta envelope namespace
    pub const X: &str = "adobe:ns:meta/";
    /// RDF namespace
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// Dublin Core namespace
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    /// XMP Basic namespace
    pub const XMP: &str = "http://ns.adobe.com/xap/1.0/";
    /// XML namespace (for xml:lang)
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Default namespace for custom passthrough properties
    pub const IMS: &str = "https://example.com/image-metadata-service/1.0/";
    /// Envelope prefix
    pub const X_PREFIX: &str = "x";
    /// RDF prefix
    pub const RDF_PREFIX: &str = "rdf";
    /// Dublin Core prefix
    pub const DC_PREFIX: &str = "dc";
    /// XMP prefix
    pub const XMP_PREFIX: &str = "xmp";
    /// XML prefix
    pub const XML_PREFIX: &str = "xml";
    /// Default custom prefix
    pub const IMS_PREFIX: &str = "ims";
}

/// The namespace custom (non-standard) keys are written under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomNamespace {
    /// Namespace URI
    pub uri: String,
    /// Prefix used when serializing
    pub prefix: String,
}

impl CustomNamespace {
    /// Create a custom namespace binding
    pub fn new(uri: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            prefix: prefix.into(),
        }
    }
}

impl Default for CustomNamespace {
    fn default() -> Self {
        Self::new(ns::IMS, ns::IMS_PREFIX)
    }
}

/// Whether `uri` is one of the schemas the parser consumes itself
pub fn is_standard_namespace(uri: &str) -> bool {
    uri == ns::DC || uri == ns::XMP || uri == ns::RDF
}

/// Prefix bindings in scope while reading an XML document
///
/// Each element pushes one frame holding the `xmlns:*` declarations found on
/// it; lookups walk from the innermost frame outwards.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    frames: Vec<HashMap<String, String>>,
}

impl NamespaceMap {
    /// Create an empty scope stack with the implicit `xml` binding
    pub fn new() -> Self {
        let mut root = HashMap::new();
        root.insert(ns::XML_PREFIX.to_string(), ns::XML.to_string());
        Self { frames: vec![root] }
    }

    /// Open a new scope with the given `(prefix, uri)` declarations
    pub fn push_scope(&mut self, declarations: impl IntoIterator<Item = (String, String)>) {
        self.frames.push(declarations.into_iter().collect());
    }

    /// Close the innermost scope
    pub fn pop_scope(&mut self) {
        // the implicit root frame is never popped
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Get the URI bound to `prefix` (empty prefix = default namespace)
    pub fn get_uri(&self, prefix: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(prefix))
            .map(|s| s.as_str())
    }

    /// Split a qualified name and resolve its prefix
    ///
    /// Returns `(namespace URI, local name)`. Unbound prefixes resolve to
    /// `None` so callers can skip the element.
    pub fn resolve<'n>(&self, qname: &'n str) -> (Option<&str>, &'n str) {
        match qname.split_once(':') {
            Some((prefix, local)) => (self.get_uri(prefix), local),
            None => (self.get_uri(""), qname),
        }
    }
}

/// Check that `name` is usable as an XML element local name
pub fn is_valid_local_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
