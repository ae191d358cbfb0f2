//! ABAP XML deserialization: rebuilding records and tables from a single pass
//! over parse events.
//!
//! The shape of every element below the top element is decided by asking the
//! schema what the *parent* expects for that tag. Values under construction
//! live on an explicit stack of frames, so nesting depth is not bounded by
//! the call stack and attaching a finished child to its parent is the same
//! operation at every level:
//!
//! - a record frame resolves the child tag as one of its declared fields
//! - a table frame treats every child as a new row of its single row type
//! - a scalar frame collects text
//!
//! The envelope tags are matched literally; foreign elements wrapping them
//! (such as an abapGit root) are ignored. Any error aborts the whole parse;
//! the frames built so far are dropped.

use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::QName;

use crate::error::XmlError;
use crate::schema::{FieldKind, RecordType, RowType, TableType, TypeRef};
use crate::serialize::{ASX_ROOT, ASX_VALUES};
use crate::value::{Record, Table, Value};

/// Root tag of the interchange envelope.
pub const ABAPGIT_ROOT: &str = "abapGit";

/// Deserialize a value from the generic `asx:abap` envelope.
///
/// The top element must be named after the target's declared type.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or does not match the schema.
pub fn from_xml(xml: &str, target: &TypeRef) -> Result<Value, XmlError> {
    from_xml_as(xml, target, target.name().as_str())
}

/// Deserialize a value from the generic envelope whose top element is
/// `top_element` instead of the declared type name.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or does not match the schema.
pub fn from_xml_as(xml: &str, target: &TypeRef, top_element: &str) -> Result<Value, XmlError> {
    let mut sink = SingleBody {
        target,
        top_element,
        value: None,
    };
    drive(xml, Envelope::Generic, &mut sink)?;
    let value = sink
        .value
        .ok_or_else(|| XmlError::MissingElement(top_element.to_owned()))?;
    tracing::debug!(top = top_element, "deserialized ABAP XML");
    Ok(value)
}

/// Deserialize a record from the generic envelope.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or does not match the schema.
pub fn record_from_xml(xml: &str, ty: &Arc<RecordType>) -> Result<Record, XmlError> {
    from_xml(xml, &TypeRef::from(ty))?.into_record()
}

/// Deserialize a table from the generic envelope.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or does not match the schema.
pub fn table_from_xml(xml: &str, ty: &Arc<TableType>) -> Result<Table, XmlError> {
    from_xml(xml, &TypeRef::from(ty))?.into_table()
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// The kind of value a new frame builds.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    Scalar,
    Record(Arc<RecordType>),
    Table(Arc<TableType>),
}

impl From<&FieldKind> for Target {
    fn from(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Scalar => Self::Scalar,
            FieldKind::Record(ty) => Self::Record(Arc::clone(ty)),
            FieldKind::Table(ty) => Self::Table(Arc::clone(ty)),
        }
    }
}

impl From<&RowType> for Target {
    fn from(row: &RowType) -> Self {
        match row {
            RowType::Scalar(_) => Self::Scalar,
            RowType::Record(ty) => Self::Record(Arc::clone(ty)),
        }
    }
}

impl From<&TypeRef> for Target {
    fn from(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Record(ty) => Self::Record(Arc::clone(ty)),
            TypeRef::Table(ty) => Self::Table(Arc::clone(ty)),
        }
    }
}

/// One in-progress value and the tag it was opened with.
#[derive(Debug)]
enum Frame {
    Scalar { tag: String, text: String },
    Record { tag: String, record: Record },
    Table { tag: String, table: Table },
}

impl Frame {
    fn open(tag: String, target: Target) -> Self {
        match target {
            Target::Scalar => Self::Scalar {
                tag,
                text: String::new(),
            },
            Target::Record(ty) => Self::Record {
                tag,
                record: Record::new(&ty),
            },
            Target::Table(ty) => Self::Table {
                tag,
                table: Table::new(&ty),
            },
        }
    }

    fn tag(&self) -> &str {
        match self {
            Self::Scalar { tag, .. } | Self::Record { tag, .. } | Self::Table { tag, .. } => tag,
        }
    }

    fn close(self) -> (String, Value) {
        match self {
            Self::Scalar { tag, text } => (tag, Value::Scalar(text)),
            Self::Record { tag, record } => (tag, Value::Record(record)),
            Self::Table { tag, table } => (tag, Value::Table(table)),
        }
    }
}

/// The stack of frames for one top-level body.
#[derive(Debug, Default)]
pub(crate) struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn push_root(&mut self, tag: String, target: Target) {
        tracing::trace!(tag = %tag, "open body");
        self.frames.push(Frame::open(tag, target));
    }

    /// Open a child of the innermost frame.
    pub(crate) fn start(&mut self, tag: &str) -> Result<(), XmlError> {
        let next = match self.frames.last() {
            None => return Err(XmlError::MissingElement(format!("parent of {tag}"))),
            Some(Frame::Scalar { tag: parent, .. }) => {
                return Err(XmlError::unexpected_tag(format!("text of {parent}"), tag));
            }
            Some(Frame::Record { record, .. }) => {
                let decl = record.record_type().resolve_field(tag)?;
                Frame::open(tag.to_owned(), Target::from(decl.kind()))
            }
            Some(Frame::Table { table, .. }) => {
                let ty = table.table_type();
                if ty.row_tag() != tag {
                    return Err(XmlError::unexpected_tag(ty.row_tag(), tag));
                }
                Frame::open(tag.to_owned(), Target::from(ty.row()))
            }
        };
        tracing::trace!(tag, depth = self.frames.len(), "push frame");
        self.frames.push(next);
        Ok(())
    }

    /// Feed character data to the innermost frame.
    pub(crate) fn text(&mut self, content: &str) -> Result<(), XmlError> {
        match self.frames.last_mut() {
            Some(Frame::Scalar { text, .. }) => {
                text.push_str(content);
                Ok(())
            }
            Some(frame) if !content.trim().is_empty() => {
                Err(XmlError::UnexpectedText(frame.tag().to_owned()))
            }
            _ => Ok(()),
        }
    }

    /// Close the innermost frame and attach it to its parent.
    ///
    /// Returns the finished body when the root frame closes.
    pub(crate) fn end(&mut self) -> Result<Option<(String, Value)>, XmlError> {
        let Some(frame) = self.frames.pop() else {
            return Ok(None);
        };
        let (tag, value) = frame.close();
        tracing::trace!(tag = %tag, depth = self.frames.len(), "pop frame");

        match self.frames.last_mut() {
            None => return Ok(Some((tag, value))),
            Some(Frame::Record { record, .. }) => record.set(&tag, value)?,
            Some(Frame::Table { table, .. }) => table.append(value)?,
            Some(Frame::Scalar { tag: parent, .. }) => {
                return Err(XmlError::unexpected_tag(format!("text of {parent}"), tag));
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Envelope driver
// ---------------------------------------------------------------------------

/// Wrapper convention around the bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Envelope {
    /// `asx:abap` / `asx:values`.
    Generic,
    /// `abapGit` / `asx:abap` / `asx:values`.
    Interchange,
}

impl Envelope {
    fn path(self) -> &'static [&'static str] {
        match self {
            Self::Generic => &[ASX_ROOT, ASX_VALUES],
            Self::Interchange => &[ABAPGIT_ROOT, ASX_ROOT, ASX_VALUES],
        }
    }
}

/// Receives the top-level bodies found inside `asx:values`.
pub(crate) trait BodySink {
    /// Decide what a top-level element decodes into; `None` skips it.
    fn open(&mut self, tag: &str) -> Result<Option<Target>, XmlError>;

    /// Take a finished body.
    fn complete(&mut self, tag: String, value: Value) -> Result<(), XmlError>;
}

/// Attributes read from the envelope root.
#[derive(Debug, Default)]
pub(crate) struct EnvelopeInfo {
    pub(crate) serializer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingEnvelope,
    InBody,
    Done,
}

/// Run one pass over `xml`, feeding every body inside the envelope to `sink`.
pub(crate) fn drive<S: BodySink>(
    xml: &str,
    envelope: Envelope,
    sink: &mut S,
) -> Result<EnvelopeInfo, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let path = envelope.path();
    let mut info = EnvelopeInfo::default();
    let mut state = State::AwaitingEnvelope;
    let mut opened = 0_usize;
    let mut stack = FrameStack::default();
    let mut skipping = 0_usize;
    // Envelope depth at which each open foreign wrapper element started.
    let mut foreign: Vec<usize> = Vec::new();

    loop {
        let ignore = ignoring(skipping, &foreign, opened);
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = tag_name(e.name())?;
                let current = state;
                match current {
                    State::Done => {
                        return Err(XmlError::unexpected_tag("end of document", tag));
                    }
                    State::AwaitingEnvelope if tag != path[opened] => {
                        tracing::trace!(tag = %tag, expected = path[opened], "ignore wrapper");
                        foreign.push(opened);
                    }
                    State::AwaitingEnvelope => {
                        if opened == 0 && envelope == Envelope::Interchange {
                            info.serializer = read_attribute(&e, "serializer")?;
                        }
                        opened += 1;
                        if opened == path.len() {
                            state = State::InBody;
                        }
                    }
                    State::InBody if skipping > 0 => skipping += 1,
                    State::InBody if stack.is_empty() => match sink.open(&tag)? {
                        Some(target) => stack.push_root(tag, target),
                        None => skipping = 1,
                    },
                    State::InBody => stack.start(&tag)?,
                }
            }
            Event::End(_) => match (state, skipping) {
                (State::InBody, 1..) => skipping -= 1,
                (State::InBody, 0) if !stack.is_empty() => {
                    if let Some((tag, value)) = stack.end()? {
                        sink.complete(tag, value)?;
                    }
                }
                (State::AwaitingEnvelope, _) if foreign.last() == Some(&opened) => {
                    foreign.pop();
                }
                (State::InBody | State::AwaitingEnvelope, _) => {
                    opened = opened.saturating_sub(1);
                    state = if opened == 0 {
                        State::Done
                    } else {
                        State::AwaitingEnvelope
                    };
                }
                (State::Done, _) => {}
            },
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                feed_text(&mut stack, ignore, &unescaped, path, opened)?;
            }
            Event::GeneralRef(r) => {
                let resolved = resolve_reference(&r)?;
                feed_text(&mut stack, ignore, &resolved, path, opened)?;
            }
            Event::CData(c) => {
                let text = std::str::from_utf8(&c)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                feed_text(&mut stack, ignore, text, path, opened)?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if state != State::Done {
        let missing = match opened {
            0 => path[0].to_owned(),
            n => format!("</{}>", path[n - 1]),
        };
        return Err(XmlError::MissingElement(missing));
    }
    Ok(info)
}

/// Whether text at the current position belongs to skipped content.
fn ignoring(skipping: usize, foreign: &[usize], opened: usize) -> bool {
    skipping > 0 || foreign.last() == Some(&opened)
}

fn feed_text(
    stack: &mut FrameStack,
    ignore: bool,
    text: &str,
    path: &[&str],
    opened: usize,
) -> Result<(), XmlError> {
    if ignore {
        return Ok(());
    }
    if !stack.is_empty() {
        return stack.text(text);
    }
    if text.trim().is_empty() {
        return Ok(());
    }
    let context = match opened {
        0 => "document".to_owned(),
        n => path[n - 1].to_owned(),
    };
    Err(XmlError::UnexpectedText(context))
}

fn tag_name(name: QName<'_>) -> Result<String, XmlError> {
    std::str::from_utf8(name.as_ref())
        .map(str::to_owned)
        .map_err(|e| XmlError::ParseError(e.to_string()))
}

fn read_attribute(start: &BytesStart<'_>, key: &str) -> Result<Option<String>, XmlError> {
    let Some(attr) = start.try_get_attribute(key)? else {
        return Ok(None);
    };
    let raw = std::str::from_utf8(&attr.value).map_err(|e| XmlError::ParseError(e.to_string()))?;
    let value =
        quick_xml::escape::unescape(raw).map_err(|e| XmlError::ParseError(e.to_string()))?;
    Ok(Some(value.into_owned()))
}

/// Resolve a character reference or one of the predefined entities.
fn resolve_reference(reference: &BytesRef<'_>) -> Result<String, XmlError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| XmlError::ParseError(e.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = reference
        .decode()
        .map_err(|e| XmlError::ParseError(e.to_string()))?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_owned)
        .ok_or_else(|| XmlError::ParseError(format!("unknown entity &{name};")))
}

/// Decodes exactly one top-level body with a known tag.
struct SingleBody<'a> {
    target: &'a TypeRef,
    top_element: &'a str,
    value: Option<Value>,
}

impl BodySink for SingleBody<'_> {
    fn open(&mut self, tag: &str) -> Result<Option<Target>, XmlError> {
        if self.value.is_some() {
            return Err(XmlError::unexpected_tag(format!("</{ASX_VALUES}>"), tag));
        }
        if tag != self.top_element {
            return Err(XmlError::unexpected_tag(self.top_element, tag));
        }
        Ok(Some(Target::from(self.target)))
    }

    fn complete(&mut self, _tag: String, value: Value) -> Result<(), XmlError> {
        self.value = Some(value);
        Ok(())
    }
}
