//! XMP XML/RDF serializer
//!
//! This module turns a [`FieldMap`] into an XMP packet. The six standard
//! fields map onto fixed Dublin Core / XMP Basic properties; every other key
//! becomes a flat leaf element under the custom namespace.

use crate::core::error::{MetaError, MetaResult};
use crate::core::namespace::{is_valid_local_name, ns, CustomNamespace};
use crate::types::field::{FieldMap, StandardField};
use crate::utils::datetime::{normalize_modify_date, now_utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// RDF container used for a multi-valued property
#[derive(Debug, Clone, Copy)]
enum Container {
    /// `rdf:Alt` with one `x-default` entry
    LangAlt,
    /// `rdf:Seq` with one entry
    Seq,
}

/// How a standard field is written
#[derive(Debug, Clone, Copy)]
struct StandardProperty {
    field: StandardField,
    prefix: &'static str,
    name: &'static str,
    container: Option<Container>,
}

/// Standard fields in packet order
const STANDARD_PROPERTIES: [StandardProperty; 6] = [
    StandardProperty {
        field: StandardField::Description,
        prefix: ns::DC_PREFIX,
        name: "description",
        container: Some(Container::LangAlt),
    },
    StandardProperty {
        field: StandardField::Artist,
        prefix: ns::DC_PREFIX,
        name: "creator",
        container: Some(Container::Seq),
    },
    StandardProperty {
        field: StandardField::Software,
        prefix: ns::XMP_PREFIX,
        name: "CreatorTool",
        container: None,
    },
    StandardProperty {
        field: StandardField::Copyright,
        prefix: ns::DC_PREFIX,
        name: "rights",
        container: Some(Container::LangAlt),
    },
    StandardProperty {
        field: StandardField::UserComment,
        prefix: ns::XMP_PREFIX,
        name: "Label",
        container: None,
    },
    StandardProperty {
        field: StandardField::DateTime,
        prefix: ns::XMP_PREFIX,
        name: "ModifyDate",
        container: None,
    },
];

/// Serializer for XMP Packets
#[derive(Debug, Clone, Default)]
pub struct XmpSerializer {
    custom: CustomNamespace,
}

impl XmpSerializer {
    /// Create a serializer writing custom keys under the default namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer writing custom keys under `custom`
    pub fn with_namespace(custom: CustomNamespace) -> Self {
        Self { custom }
    }

    /// The namespace custom keys are written under
    pub fn custom_namespace(&self) -> &CustomNamespace {
        &self.custom
    }

    /// Serialize the `x:xmpmeta` envelope for `fields`
    ///
    /// Nulls and empty standard values are skipped. `xmp:ModifyDate` is
    /// always written: the `datetime` field normalized to ISO 8601, or the
    /// current UTC time when it is missing.
    pub fn serialize_rdf(&self, fields: &FieldMap) -> MetaResult<String> {
        if !is_valid_local_name(&self.custom.prefix) {
            return Err(MetaError::field(
                format!("xmlns:{}", self.custom.prefix),
                "custom namespace prefix is not a valid XML name",
            ));
        }

        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut meta_start = BytesStart::new("x:xmpmeta");
        meta_start.push_attribute(("xmlns:x", ns::X));
        writer.write_event(Event::Start(meta_start))?;

        let mut rdf_start = BytesStart::new("rdf:RDF");
        rdf_start.push_attribute(("xmlns:rdf", ns::RDF));
        writer.write_event(Event::Start(rdf_start))?;

        let custom_xmlns = format!("xmlns:{}", self.custom.prefix);
        let mut desc_start = BytesStart::new("rdf:Description");
        desc_start.push_attribute(("rdf:about", ""));
        desc_start.push_attribute(("xmlns:dc", ns::DC));
        desc_start.push_attribute(("xmlns:xmp", ns::XMP));
        desc_start.push_attribute((custom_xmlns.as_str(), self.custom.uri.as_str()));
        writer.write_event(Event::Start(desc_start))?;

        for property in &STANDARD_PROPERTIES {
            let value = match property.field {
                StandardField::DateTime => Some(
                    fields
                        .standard(StandardField::DateTime)
                        .filter(|v| !v.trim().is_empty())
                        .map_or_else(now_utc, normalize_modify_date),
                ),
                field => fields
                    .standard(field)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            };
            if let Some(value) = value {
                self.write_standard(&mut writer, property, &value)?;
            }
        }

        for (key, value) in fields.values() {
            if StandardField::from_key(key).is_some() {
                continue;
            }
            if !is_valid_local_name(key) {
                return Err(MetaError::field(key, "not a valid XML element name"));
            }
            let elem_name = format!("{}:{}", self.custom.prefix, key);
            write_text_element(&mut writer, BytesStart::new(elem_name.as_str()), value)?;
        }

        writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
        writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
        writer.write_event(Event::End(BytesEnd::new("x:xmpmeta")))?;

        let result = writer.into_inner().into_inner();
        String::from_utf8(result)
            .map_err(|e| MetaError::field("xmp", format!("UTF-8 encoding error: {}", e)))
    }

    fn write_standard(
        &self,
        writer: &mut XmlWriter,
        property: &StandardProperty,
        value: &str,
    ) -> MetaResult<()> {
        let prop_elem = format!("{}:{}", property.prefix, property.name);
        let Some(container) = property.container else {
            return write_text_element(writer, BytesStart::new(prop_elem.as_str()), value);
        };

        let (container_name, lang) = match container {
            Container::LangAlt => ("rdf:Alt", Some("x-default")),
            Container::Seq => ("rdf:Seq", None),
        };

        writer.write_event(Event::Start(BytesStart::new(prop_elem.as_str())))?;
        writer.write_event(Event::Start(BytesStart::new(container_name)))?;

        let mut li_start = BytesStart::new("rdf:li");
        if let Some(lang) = lang {
            li_start.push_attribute(("xml:lang", lang));
        }
        write_text_element(writer, li_start, value)?;

        writer.write_event(Event::End(BytesEnd::new(container_name)))?;
        writer.write_event(Event::End(BytesEnd::new(prop_elem.as_str())))?;
        Ok(())
    }

    /// Serialize to XMP Packet format
    pub fn serialize_packet(&self, fields: &FieldMap) -> MetaResult<String> {
        let rdf_content = self.serialize_rdf(fields)?;

        // Wrap in xpacket
        let packet = format!(
            "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n{}\n<?xpacket end=\"w\"?>",
            rdf_content
        );

        Ok(packet)
    }
}

/// Write `<start>value</start>` with all five XML special characters escaped
fn write_text_element(writer: &mut XmlWriter, start: BytesStart<'_>, value: &str) -> MetaResult<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::from_escaped(escape(value))))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_serialize_packet_envelope() {
        let packet = XmpSerializer::new()
            .serialize_packet(&fields(&[("software", "TestApp")]))
            .unwrap();
        assert!(packet.starts_with("<?xpacket begin=\"\u{feff}\""));
        assert!(packet.ends_with("<?xpacket end=\"w\"?>"));
        assert!(packet.contains("xmlns:x=\"adobe:ns:meta/\""));
        assert!(packet.contains("rdf:RDF"));
        assert!(packet.contains("<xmp:CreatorTool>TestApp</xmp:CreatorTool>"));
        assert!(packet.contains("xmlns:ims=\"https://example.com/image-metadata-service/1.0/\""));
    }

    #[test]
    fn test_description_is_lang_alt() {
        let rdf = XmpSerializer::new()
            .serialize_rdf(&fields(&[("description", "sunset")]))
            .unwrap();
        assert!(rdf.contains("<dc:description>"));
        assert!(rdf.contains("<rdf:Alt>"));
        assert!(rdf.contains("<rdf:li xml:lang=\"x-default\">sunset</rdf:li>"));
    }

    #[test]
    fn test_artist_is_seq() {
        let rdf = XmpSerializer::new()
            .serialize_rdf(&fields(&[("artist", "Ann")]))
            .unwrap();
        assert!(rdf.contains("<dc:creator>"));
        assert!(rdf.contains("<rdf:Seq>"));
        assert!(rdf.contains("<rdf:li>Ann</rdf:li>"));
    }

    #[test]
    fn test_values_are_escaped() {
        let rdf = XmpSerializer::new()
            .serialize_rdf(&fields(&[("user_comment", "a<b & \"c\" 'd'>")]))
            .unwrap();
        assert!(rdf.contains("<xmp:Label>a&lt;b &amp; &quot;c&quot; &apos;d&apos;&gt;</xmp:Label>"));
    }

    #[test]
    fn test_datetime_is_normalized() {
        let rdf = XmpSerializer::new()
            .serialize_rdf(&fields(&[("datetime", "2024:01:15 10:30:00")]))
            .unwrap();
        assert!(rdf.contains("<xmp:ModifyDate>2024-01-15T10:30:00</xmp:ModifyDate>"));
    }

    #[test]
    fn test_missing_datetime_is_stamped() {
        let rdf = XmpSerializer::new().serialize_rdf(&FieldMap::new()).unwrap();
        assert!(rdf.contains("<xmp:ModifyDate>"));
        assert!(rdf.contains("Z</xmp:ModifyDate>"));
    }

    #[test]
    fn test_custom_keys_in_insertion_order() {
        let rdf = XmpSerializer::new()
            .serialize_rdf(&fields(&[("zeta", "1"), ("alpha", "2")]))
            .unwrap();
        let zeta = rdf.find("<ims:zeta>1</ims:zeta>").unwrap();
        let alpha = rdf.find("<ims:alpha>2</ims:alpha>").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_custom_namespace_is_configurable() {
        let serializer =
            XmpSerializer::with_namespace(CustomNamespace::new("urn:example:acme", "acme"));
        let rdf = serializer
            .serialize_rdf(&fields(&[("project", "alpha")]))
            .unwrap();
        assert!(rdf.contains("xmlns:acme=\"urn:example:acme\""));
        assert!(rdf.contains("<acme:project>alpha</acme:project>"));
    }

    #[test]
    fn test_nulls_and_empty_standard_values_are_skipped() {
        let mut map = fields(&[("description", "")]);
        map.insert_null("artist");
        map.insert_null("rating");
        let rdf = XmpSerializer::new().serialize_rdf(&map).unwrap();
        assert!(!rdf.contains("dc:description>"));
        assert!(!rdf.contains("dc:creator>"));
        assert!(!rdf.contains("ims:rating"));
    }

    #[test]
    fn test_invalid_custom_key_is_rejected() {
        let err = XmpSerializer::new()
            .serialize_rdf(&fields(&[("bad key", "x")]))
            .unwrap_err();
        assert!(matches!(err, MetaError::FieldEncodingError { ref key, .. } if key == "bad key"));
    }
}
