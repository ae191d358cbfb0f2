//! abapGit interchange files: several unrelated bodies in one envelope.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <abapGit version="v1.0.0" serializer="LCL_OBJECT_PROG" serializer_version="v1.0.0">
//!  <asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0">
//!   <asx:values>
//!    <PROGDIR>...</PROGDIR>
//!    <TPOOL>...</TPOOL>
//!   </asx:values>
//!  </asx:abap>
//! </abapGit>
//! ```
//!
//! Bodies are matched by position against the caller's list of expected
//! types, not through a shared parent schema. Decoding a prefix of the
//! document's bodies is allowed: bodies past the end of the list are skipped.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use sapcli_core::{CodecConfig, Identifier};

use crate::deserialize::{ABAPGIT_ROOT, BodySink, Envelope, Target, drive};
use crate::error::XmlError;
use crate::schema::TypeRef;
use crate::serialize::{
    AbapSerialize, default_tag, end_asx, finish, new_writer, start_asx, write_element,
};
use crate::value::{Record, Table, Value};

/// The bodies decoded from an interchange file, keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bodies {
    serializer: Option<String>,
    entries: Vec<(String, Value)>,
}

impl Bodies {
    /// The `serializer` label of the `<abapGit>` root, if present.
    #[must_use]
    pub fn serializer(&self) -> Option<&str> {
        self.serializer.as_deref()
    }

    /// The body decoded for the given type name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, value)| value)
    }

    /// The record body decoded for the given type name.
    #[must_use]
    pub fn record(&self, type_name: &str) -> Option<&Record> {
        self.get(type_name).and_then(Value::as_record)
    }

    /// The table body decoded for the given type name.
    #[must_use]
    pub fn table(&self, type_name: &str) -> Option<&Table> {
        self.get(type_name).and_then(Value::as_table)
    }

    /// Number of decoded bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no body was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decoded bodies in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Take the bodies out in document order.
    #[must_use]
    pub fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }

    fn insert(&mut self, type_name: String, value: Value) {
        match self.entries.iter_mut().find(|(name, _)| *name == type_name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((type_name, value)),
        }
    }
}

/// Decode an interchange file against an ordered list of expected types.
///
/// The Nth body must be named after the Nth expected type. If the file ends
/// early, the bodies seen so far are returned.
///
/// # Errors
///
/// Returns [`XmlError::SequenceMismatch`] when a body appears out of order,
/// and any other `XmlError` the body decoding raises.
pub fn from_interchange_xml(xml: &str, expected: &[TypeRef]) -> Result<Bodies, XmlError> {
    from_interchange_xml_with_config(xml, expected, &CodecConfig::default())
}

/// Decode an interchange file with explicit settings.
///
/// With `strict_sequence` set, a file that ends before every expected body
/// was seen fails with [`XmlError::SequenceMismatch`].
///
/// # Errors
///
/// See [`from_interchange_xml`].
pub fn from_interchange_xml_with_config(
    xml: &str,
    expected: &[TypeRef],
    config: &CodecConfig,
) -> Result<Bodies, XmlError> {
    let mut sink = Sequence {
        expected,
        cursor: 0,
        skipped: 0,
        bodies: Bodies::default(),
    };
    let info = drive(xml, Envelope::Interchange, &mut sink)?;

    if let Some(missing) = expected.get(sink.cursor) {
        if config.strict_sequence {
            return Err(XmlError::SequenceMismatch {
                expected: missing.name().to_string(),
                actual: "end of body".to_owned(),
            });
        }
        tracing::warn!(
            seen = sink.cursor,
            expected = expected.len(),
            next = %missing.name(),
            "interchange file ended before all expected bodies"
        );
    }
    if sink.skipped > 0 {
        tracing::warn!(skipped = sink.skipped, "skipped bodies past the expected types");
    }

    let mut bodies = sink.bodies;
    bodies.serializer = info.serializer;
    tracing::debug!(bodies = bodies.len(), "deserialized interchange file");
    Ok(bodies)
}

/// Positional matching of top-level bodies.
struct Sequence<'a> {
    expected: &'a [TypeRef],
    cursor: usize,
    skipped: usize,
    bodies: Bodies,
}

impl BodySink for Sequence<'_> {
    fn open(&mut self, tag: &str) -> Result<Option<Target>, XmlError> {
        let Some(ty) = self.expected.get(self.cursor) else {
            tracing::trace!(tag, "skipping body past the expected types");
            self.skipped += 1;
            return Ok(None);
        };
        if ty.name() != tag {
            return Err(XmlError::SequenceMismatch {
                expected: ty.name().to_string(),
                actual: tag.to_owned(),
            });
        }
        Ok(Some(Target::from(ty)))
    }

    fn complete(&mut self, tag: String, value: Value) -> Result<(), XmlError> {
        self.bodies.insert(tag, value);
        self.cursor += 1;
        Ok(())
    }
}

/// Builds an interchange file body by body.
///
/// ```
/// use sapcli_xml::{InterchangeWriter, Record, RecordType};
///
/// let ty = RecordType::builder("PROGDIR").scalar("NAME").build()?;
/// let mut progdir = Record::new(&ty);
/// progdir.set_text("NAME", "ZHELLO")?;
///
/// let mut writer = InterchangeWriter::new("LCL_OBJECT_PROG")?;
/// writer.add(&progdir)?;
/// let xml = writer.finish()?;
/// assert!(xml.contains("   <PROGDIR>\n    <NAME>ZHELLO</NAME>\n   </PROGDIR>\n"));
/// # Ok::<(), sapcli_xml::XmlError>(())
/// ```
pub struct InterchangeWriter {
    writer: Writer<Vec<u8>>,
    bodies: usize,
}

impl std::fmt::Debug for InterchangeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterchangeWriter")
            .field("bodies", &self.bodies)
            .finish_non_exhaustive()
    }
}

impl InterchangeWriter {
    /// Open an interchange file with default settings.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if writing the envelope header fails.
    pub fn new(serializer: &str) -> Result<Self, XmlError> {
        Self::with_config(serializer, &CodecConfig::default())
    }

    /// Open an interchange file with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the configuration is invalid.
    pub fn with_config(serializer: &str, config: &CodecConfig) -> Result<Self, XmlError> {
        config.validate()?;
        let mut writer = new_writer(config);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(ABAPGIT_ROOT).with_attributes([
            ("version", config.interchange_version.as_str()),
            ("serializer", serializer),
            ("serializer_version", config.serializer_version.as_str()),
        ])))?;
        start_asx(&mut writer)?;
        Ok(Self { writer, bodies: 0 })
    }

    /// Append a body tagged with its declared type name.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the value is bare text or writing fails.
    pub fn add<T: AbapSerialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, XmlError> {
        let tag = default_tag(value)?;
        self.add_as(tag.as_str(), value)
    }

    /// Append a body under an explicit tag.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the tag is not a valid element name.
    pub fn add_as<T: AbapSerialize + ?Sized>(
        &mut self,
        tag: &str,
        value: &T,
    ) -> Result<&mut Self, XmlError> {
        let tag = Identifier::new(tag)?;
        write_element(&mut self.writer, tag.as_str(), value)?;
        self.bodies += 1;
        Ok(self)
    }

    /// Close the envelope and return the document.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if writing fails.
    pub fn finish(mut self) -> Result<String, XmlError> {
        end_asx(&mut self.writer)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(ABAPGIT_ROOT)))?;
        let xml = finish(self.writer)?;
        tracing::debug!(bodies = self.bodies, bytes = xml.len(), "serialized interchange file");
        Ok(xml)
    }
}
