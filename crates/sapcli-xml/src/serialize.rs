//! ABAP XML serialization: writing records and tables inside the `asx:abap`
//! envelope.
//!
//! The output reproduces what the ABAP stack itself writes:
//!
//! - XML declaration: `<?xml version="1.0" encoding="utf-8"?>`
//! - Envelope: `<asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0">`
//!   around `<asx:values>`
//! - One space of indentation per nesting level (configurable)
//! - Absent fields are omitted; empty text is written as `<TAG></TAG>`
//! - Only `&`, `<` and `>` are escaped in text

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use sapcli_core::{CodecConfig, Identifier};

use crate::error::XmlError;
use crate::value::{Record, Table, Value};

/// The ABAP XML namespace bound to the `asx` prefix.
pub const ABAP_XML_NAMESPACE: &str = "http://www.sap.com/abapxml";

/// Root tag of the generic envelope.
pub const ASX_ROOT: &str = "asx:abap";

/// Tag wrapping the serialized values.
pub const ASX_VALUES: &str = "asx:values";

/// Trait for values that can be written as ABAP XML.
///
/// Implementors write their content (fields, rows or text) inside the current
/// element; the enclosing tag is written by the caller.
///
/// Uses `io::Result` because `quick_xml::Writer` reports `io::Result<()>`.
pub trait AbapSerialize {
    /// Default top element name: the declared type name.
    fn type_name(&self) -> &str;

    /// Whether this value is bare text with no declared type of its own.
    fn is_scalar(&self) -> bool {
        false
    }

    /// Serialize the content of this value into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

impl AbapSerialize for Record {
    fn type_name(&self) -> &str {
        self.record_type().name().as_str()
    }

    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        for (decl, value) in self.iter() {
            write_element(writer, decl.name().as_str(), value)?;
        }
        Ok(())
    }
}

impl AbapSerialize for Table {
    fn type_name(&self) -> &str {
        self.table_type().name().as_str()
    }

    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let tag = self.table_type().row_tag();
        for row in self {
            write_element(writer, tag, row)?;
        }
        Ok(())
    }
}

impl AbapSerialize for Value {
    fn type_name(&self) -> &str {
        Value::type_name(self)
    }

    fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        match self {
            Self::Scalar(text) => {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
                Ok(())
            }
            Self::Record(record) => record.serialize_xml(writer),
            Self::Table(table) => table.serialize_xml(writer),
        }
    }
}

/// Serialize a value inside the generic `asx:abap` envelope.
///
/// The top element is named after the value's declared type unless
/// `top_element` overrides it.
///
/// # Errors
///
/// Returns `XmlError` if the override is not a valid element name.
pub fn to_xml<T: AbapSerialize + ?Sized>(
    value: &T,
    top_element: Option<&str>,
) -> Result<String, XmlError> {
    to_xml_with_config(value, top_element, &CodecConfig::default())
}

/// Serialize a value inside the generic `asx:abap` envelope with explicit
/// formatting settings.
///
/// # Errors
///
/// Returns `XmlError` if the configuration is invalid or the override is not
/// a valid element name.
pub fn to_xml_with_config<T: AbapSerialize + ?Sized>(
    value: &T,
    top_element: Option<&str>,
    config: &CodecConfig,
) -> Result<String, XmlError> {
    config.validate()?;
    let top = match top_element {
        Some(name) => Identifier::new(name)?,
        None => default_tag(value)?,
    };

    let mut writer = new_writer(config);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    start_asx(&mut writer)?;
    write_element(&mut writer, top.as_str(), value)?;
    end_asx(&mut writer)?;

    let xml = finish(writer)?;
    tracing::debug!(top = %top, bytes = xml.len(), "serialized ABAP XML");
    Ok(xml)
}

// ---------------------------------------------------------------------------
// Envelope helpers shared with the interchange writer
// ---------------------------------------------------------------------------

pub(crate) fn new_writer(config: &CodecConfig) -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::with_capacity(512), b' ', config.indent_width)
}

/// The tag a top-level body gets when the caller names none.
///
/// Bare text has no type name to fall back on and could not be decoded again,
/// so it needs an explicit tag.
pub(crate) fn default_tag<T: AbapSerialize + ?Sized>(value: &T) -> Result<Identifier, XmlError> {
    if value.is_scalar() {
        return Err(XmlError::type_mismatch("record or table", value.type_name()));
    }
    Ok(Identifier::new(value.type_name())?)
}

/// Write `<asx:abap ...>` and `<asx:values>`.
pub(crate) fn start_asx<W: Write>(writer: &mut Writer<W>) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(ASX_ROOT).with_attributes([
        ("xmlns:asx", ABAP_XML_NAMESPACE),
        ("version", "1.0"),
    ])))?;
    writer.write_event(Event::Start(BytesStart::new(ASX_VALUES)))?;
    Ok(())
}

/// Close `</asx:values>` and `</asx:abap>`.
pub(crate) fn end_asx<W: Write>(writer: &mut Writer<W>) -> io::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(ASX_VALUES)))?;
    writer.write_event(Event::End(BytesEnd::new(ASX_ROOT)))?;
    Ok(())
}

/// Write `<tag>content</tag>`.
pub(crate) fn write_element<W: Write, T: AbapSerialize + ?Sized>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &T,
) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    value.serialize_xml(writer)?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Terminate the document with a newline and convert it to text.
pub(crate) fn finish(writer: Writer<Vec<u8>>) -> Result<String, XmlError> {
    let mut buf = writer.into_inner();
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| XmlError::ParseError(e.to_string()))
}
