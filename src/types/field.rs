//! Metadata field maps
//!
//! Callers describe updates, and readers report results, as an ordered map of
//! human-facing keys (`description`, `artist`, ...) to optional text values.

use std::fmt;

/// The closed set of human-readable fields every writer understands
///
/// Keys outside this set are custom keys; only the XMP and PNG text paths
/// carry them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardField {
    /// Free-form image description
    Description,
    /// Author / creator
    Artist,
    /// Copyright notice
    Copyright,
    /// Creating software
    Software,
    /// Modification timestamp
    DateTime,
    /// User comment
    UserComment,
}

impl StandardField {
    /// Every standard field, in serialization order
    pub const ALL: [StandardField; 6] = [
        StandardField::Description,
        StandardField::Artist,
        StandardField::Copyright,
        StandardField::Software,
        StandardField::DateTime,
        StandardField::UserComment,
    ];

    /// The field key as used in update maps
    pub fn key(self) -> &'static str {
        match self {
            StandardField::Description => "description",
            StandardField::Artist => "artist",
            StandardField::Copyright => "copyright",
            StandardField::Software => "software",
            StandardField::DateTime => "datetime",
            StandardField::UserComment => "user_comment",
        }
    }

    /// Look a key up in the standard set
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for StandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered `key -> Option<value>` map
///
/// Insertion order is preserved; inserting an existing key replaces its value
/// in place. A `None` value is an explicit null, which every writer ignores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, Option<String>)>,
}

impl FieldMap {
    /// Create an empty field map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, Some(value.into()));
    }

    /// Set `key` to an explicit null
    pub fn insert_null(&mut self, key: impl Into<String>) {
        self.set(key, None);
    }

    /// Set `key` to an optional value
    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get the value of `key`; missing keys and nulls both yield `None`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether `key` is present (null or not)
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Get the value of a standard field
    pub fn standard(&self, field: StandardField) -> Option<&str> {
        self.get(field.key())
    }

    /// Number of entries, nulls included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over every entry in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Iterate over non-null entries in insertion order
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Copy of the map restricted to keys matching `keep`
    pub fn filtered(&self, mut keep: impl FnMut(&str) -> bool) -> FieldMap {
        FieldMap {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| keep(k))
                .cloned()
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FieldMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Serialize for FieldMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
