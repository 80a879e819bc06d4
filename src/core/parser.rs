//! XMP XML/RDF parser
//!
//! This module reads an XMP packet back into a [`FieldMap`]. Parsing is
//! best-effort: any malformed input yields an empty map instead of an error,
//! so a read never fails because embedded metadata is broken.

use crate::core::namespace::{is_standard_namespace, ns, NamespaceMap};
use crate::types::field::{FieldMap, StandardField};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One open element while reading
#[derive(Debug, Default)]
struct Frame {
    uri: Option<String>,
    local: String,
    lang: Option<String>,
    /// Text content, still escaped
    raw_text: String,
    has_children: bool,
}

impl Frame {
    fn is(&self, uri: &str, local: &str) -> bool {
        self.uri.as_deref() == Some(uri) && self.local == local
    }

    fn text(&self) -> String {
        match unescape(&self.raw_text) {
            Ok(unescaped) => unescaped.trim().to_string(),
            Err(_) => self.raw_text.trim().to_string(),
        }
    }
}

/// Values collected while walking the document
#[derive(Debug, Default)]
struct Collected {
    description: Option<String>,
    description_is_default: bool,
    artist: Option<String>,
    software: Option<String>,
    datetime: Option<String>,
    copyright: Option<String>,
    user_comment: Option<String>,
    custom: Vec<(String, String)>,
}

impl Collected {
    fn set_first(slot: &mut Option<String>, value: String) {
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value);
        }
    }

    /// An `xmp:*` simple property, element or attribute form
    fn xmp_property(&mut self, local: &str, value: String) {
        match local {
            "CreatorTool" => Self::set_first(&mut self.software, value),
            "ModifyDate" => Self::set_first(&mut self.datetime, value),
            "Label" => Self::set_first(&mut self.user_comment, value),
            _ => {}
        }
    }

    fn into_fields(self) -> FieldMap {
        let mut fields = FieldMap::new();
        let standard = [
            (StandardField::Description, self.description),
            (StandardField::Artist, self.artist),
            (StandardField::Software, self.software),
            (StandardField::DateTime, self.datetime),
            (StandardField::Copyright, self.copyright),
            (StandardField::UserComment, self.user_comment),
        ];
        for (field, value) in standard {
            if let Some(value) = value {
                fields.insert(field.key(), value);
            }
        }
        fields.extend(self.custom);
        fields
    }
}

/// Parser for XMP Packets
#[derive(Debug)]
pub struct XmpParser {
    namespaces: NamespaceMap,
    stack: Vec<Frame>,
    collected: Collected,
}

impl XmpParser {
    /// Create a new XMP parser
    pub fn new() -> Self {
        Self {
            namespaces: NamespaceMap::new(),
            stack: Vec::new(),
            collected: Collected::default(),
        }
    }

    /// Parse packet bytes into a field map
    ///
    /// Invalid UTF-8, malformed XML and unclosed elements all yield an empty
    /// map.
    ///
    /// # Example
    ///
    /// ```rust
    /// use imgmeta::core::parser::XmpParser;
    ///
    /// let fields = XmpParser::parse_fields(b"not xml at all");
    /// assert!(fields.is_empty());
    /// ```
    pub fn parse_fields(packet: &[u8]) -> FieldMap {
        let Ok(xml) = std::str::from_utf8(packet) else {
            log::debug!("XMP packet is not valid UTF-8, ignoring it");
            return FieldMap::new();
        };
        Self::parse_str(xml)
    }

    /// Parse packet text into a field map
    pub fn parse_str(xml: &str) -> FieldMap {
        let xml = xml.trim_start_matches('\u{feff}').trim();
        let mut parser = Self::new();
        match parser.parse(xml) {
            Some(()) => parser.collected.into_fields(),
            None => FieldMap::new(),
        }
    }

    fn parse(&mut self, xml: &str) -> Option<()> {
        let mut reader = Reader::from_str(xml);
        let mut saw_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    saw_element = true;
                    self.open(&e);
                }
                Ok(Event::Empty(e)) => {
                    saw_element = true;
                    self.open(&e);
                    self.close();
                }
                Ok(Event::End(_)) => {
                    if self.stack.is_empty() {
                        log::debug!("unbalanced end tag in XMP packet");
                        return None;
                    }
                    self.close();
                }
                Ok(Event::Text(e)) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.raw_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.raw_text.push('&');
                        frame.raw_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                        frame.raw_text.push(';');
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(frame) = self.stack.last_mut() {
                        let text = String::from_utf8_lossy(e.as_ref());
                        frame.raw_text.push_str(&escape(text.as_ref()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::debug!(
                        "malformed XMP packet at byte {}: {}",
                        reader.error_position(),
                        e
                    );
                    return None;
                }
                _ => {}
            }
        }

        if !self.stack.is_empty() || !saw_element {
            log::debug!("XMP packet ended with {} unclosed elements", self.stack.len());
            return None;
        }
        Some(())
    }

    /// Enter an element: bind its namespaces and push a frame
    fn open(&mut self, e: &BytesStart<'_>) {
        let attrs = collect_attributes(e);
        let declarations = attrs.iter().filter_map(|(name, value)| {
            if name == "xmlns" {
                Some((String::new(), value.clone()))
            } else {
                name.strip_prefix("xmlns:")
                    .map(|prefix| (prefix.to_string(), value.clone()))
            }
        });
        self.namespaces.push_scope(declarations.collect::<Vec<_>>());

        let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let (uri, local) = self.namespaces.resolve(&qname);
        let frame = Frame {
            uri: uri.map(str::to_string),
            local: local.to_string(),
            lang: self.lang_attribute(&attrs),
            ..Frame::default()
        };

        if let Some(parent) = self.stack.last_mut() {
            parent.has_children = true;
        }
        if frame.is(ns::RDF, "Description") {
            self.description_attributes(&attrs);
        }
        self.stack.push(frame);
    }

    /// Leave the innermost element and record what it carried
    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        self.namespaces.pop_scope();

        if frame.has_children {
            return;
        }
        let text = frame.text();

        if frame.is(ns::RDF, "li") {
            self.list_item(&frame, text);
            return;
        }
        if frame.uri.as_deref() == Some(ns::XMP) {
            self.collected.xmp_property(&frame.local, text);
            return;
        }

        let under_description = self
            .stack
            .last()
            .is_some_and(|parent| parent.is(ns::RDF, "Description"));
        let standard = frame.uri.as_deref().is_some_and(is_standard_namespace);
        if under_description && !standard && !text.is_empty() {
            self.collected.custom.push((frame.local, text));
        }
    }

    /// An `rdf:li` inside `dc:description`, `dc:creator` or `dc:rights`
    fn list_item(&mut self, item: &Frame, text: String) {
        let depth = self.stack.len();
        if depth < 2 {
            return;
        }
        let container = &self.stack[depth - 1];
        let property = &self.stack[depth - 2];
        if container.uri.as_deref() != Some(ns::RDF) || property.uri.as_deref() != Some(ns::DC) {
            return;
        }

        let collected = &mut self.collected;
        match (property.local.as_str(), container.local.as_str()) {
            ("description", "Alt") => {
                let is_default = item.lang.as_deref() == Some("x-default");
                if !text.is_empty() && (is_default || collected.description.is_none()) {
                    if !collected.description_is_default {
                        collected.description = Some(text);
                    }
                    collected.description_is_default |= is_default;
                }
            }
            ("creator", "Seq" | "Bag") => Collected::set_first(&mut collected.artist, text),
            ("rights", "Alt") => Collected::set_first(&mut collected.copyright, text),
            _ => {}
        }
    }

    /// Simple properties written as attributes of `rdf:Description`
    fn description_attributes(&mut self, attrs: &[(String, String)]) {
        for (name, value) in attrs {
            if name == "xmlns" || name.starts_with("xmlns:") {
                continue;
            }
            let Some((prefix, local)) = name.split_once(':') else {
                continue;
            };
            let Some(uri) = self.namespaces.get_uri(prefix) else {
                continue;
            };
            let value = value.trim().to_string();
            if uri == ns::XMP {
                self.collected.xmp_property(local, value);
            } else if !is_standard_namespace(uri) && uri != ns::XML && !value.is_empty() {
                self.collected.custom.push((local.to_string(), value));
            }
        }
    }

    fn lang_attribute(&self, attrs: &[(String, String)]) -> Option<String> {
        attrs.iter().find_map(|(name, value)| {
            let (uri, local) = self.namespaces.resolve(name);
            (uri == Some(ns::XML) && local == "lang").then(|| value.clone())
        })
    }
}

impl Default for XmpParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect attributes from XML element, entities decoded
fn collect_attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            // Decode XML entities in attribute values (e.g., &quot; -> ")
            let raw_value = String::from_utf8_lossy(attr.value.as_ref());
            let value = match unescape(&raw_value) {
                Ok(unescaped) => unescaped.to_string(),
                Err(_) => raw_value.to_string(),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:xmp="http://ns.adobe.com/xap/1.0/"
        xmlns:ims="https://example.com/image-metadata-service/1.0/">
      <dc:description>
        <rdf:Alt>
          <rdf:li xml:lang="fr">Coucher de soleil</rdf:li>
          <rdf:li xml:lang="x-default">Sunset</rdf:li>
        </rdf:Alt>
      </dc:description>
      <dc:creator>
        <rdf:Seq>
          <rdf:li>Ann</rdf:li>
          <rdf:li>Bob</rdf:li>
        </rdf:Seq>
      </dc:creator>
      <dc:rights><rdf:Alt><rdf:li xml:lang="x-default">(c) Ann</rdf:li></rdf:Alt></dc:rights>
      <xmp:CreatorTool>Editor 2.0</xmp:CreatorTool>
      <xmp:Label> Tom &amp; Jerry </xmp:Label>
      <xmp:ModifyDate>2024-01-15T10:30:00</xmp:ModifyDate>
      <ims:project>alpha</ims:project>
      <ims:nested><rdf:Bag><rdf:li>x</rdf:li></rdf:Bag></ims:nested>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    #[test]
    fn test_parse_standard_and_custom_fields() {
        let fields = XmpParser::parse_str(SAMPLE);
        assert_eq!(fields.get("description"), Some("Sunset"));
        assert_eq!(fields.get("artist"), Some("Ann"));
        assert_eq!(fields.get("copyright"), Some("(c) Ann"));
        assert_eq!(fields.get("software"), Some("Editor 2.0"));
        assert_eq!(fields.get("user_comment"), Some("Tom & Jerry"));
        assert_eq!(fields.get("datetime"), Some("2024-01-15T10:30:00"));
        assert_eq!(fields.get("project"), Some("alpha"));
        assert!(!fields.contains_key("nested"));
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn test_description_falls_back_to_first_entry() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:dc="http://purl.org/dc/elements/1.1/">
          <rdf:Description>
            <dc:description><rdf:Alt>
              <rdf:li xml:lang="de">Erste</rdf:li>
              <rdf:li xml:lang="en">Second</rdf:li>
            </rdf:Alt></dc:description>
            <dc:creator><rdf:Bag><rdf:li>Carol</rdf:li></rdf:Bag></dc:creator>
          </rdf:Description>
        </rdf:RDF>"#;
        let fields = XmpParser::parse_str(xml);
        assert_eq!(fields.get("description"), Some("Erste"));
        assert_eq!(fields.get("artist"), Some("Carol"));
    }

    #[test]
    fn test_attribute_form_properties() {
        let xml = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
          <rdf:Description rdf:about="" xmlns:xmp="http://ns.adobe.com/xap/1.0/"
              xmlns:acme="urn:acme" xmp:CreatorTool="Tool &amp; Co" acme:rating="5"/>
        </rdf:RDF></x:xmpmeta>"#;
        let fields = XmpParser::parse_str(xml);
        assert_eq!(fields.get("software"), Some("Tool & Co"));
        assert_eq!(fields.get("rating"), Some("5"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_character_references_are_decoded() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:ims="https://example.com/image-metadata-service/1.0/">
          <rdf:Description><ims:note>a &lt;b&gt; &#38; &#x27;c&#x27;</ims:note></rdf:Description>
        </rdf:RDF>"#;
        let fields = XmpParser::parse_str(xml);
        assert_eq!(fields.get("note"), Some("a <b> & 'c'"));
    }

    #[test]
    fn test_malformed_input_yields_empty_map() {
        assert!(XmpParser::parse_fields(b"").is_empty());
        assert!(XmpParser::parse_fields(b"plain text").is_empty());
        assert!(XmpParser::parse_fields(b"<a><b></a>").is_empty());
        assert!(XmpParser::parse_fields(b"<rdf:RDF><rdf:Description>").is_empty());
        assert!(XmpParser::parse_fields(&[0x3C, 0xFF, 0xFE, 0x3E]).is_empty());
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:xmp="http://ns.adobe.com/xap/1.0/" xmlns:ims="urn:ims">
          <rdf:Description><xmp:Label>   </xmp:Label><ims:blank/></rdf:Description>
        </rdf:RDF>"#;
        assert!(XmpParser::parse_str(xml).is_empty());
    }
}
