//! ABAP XML serialization/deserialization for sapcli.
//!
//! This crate maps typed ABAP structures and internal tables to the XML that
//! ADT request/response bodies and abapGit interchange files use. Types are
//! described at runtime by a schema, so one codec serves every object kind.
//!
//! # Key components
//!
//! - [`RecordType`], [`TableType`] and [`SchemaRegistry`] describe the shapes
//! - [`Record`] and [`Table`] hold values and reject ill-typed mutations
//! - [`to_xml`] / [`from_xml`] for the generic `asx:abap` envelope
//! - [`InterchangeWriter`] / [`from_interchange_xml`] for abapGit files with
//!   several positional bodies
//!
//! # ABAP XML conventions
//!
//! - Namespace: `http://www.sap.com/abapxml` bound to `asx`
//! - XML declaration: `<?xml version="1.0" encoding="utf-8"?>`
//! - Fields are written in declaration order; absent fields are omitted
//! - Itemized table rows are tagged `item`, ordered rows use the row type name

pub mod deserialize;
pub mod error;
pub mod multiplex;
pub mod schema;
pub mod serialize;
pub mod value;

pub use deserialize::{ABAPGIT_ROOT, from_xml, from_xml_as, record_from_xml, table_from_xml};
pub use error::XmlError;
pub use multiplex::{
    Bodies, InterchangeWriter, from_interchange_xml, from_interchange_xml_with_config,
};
pub use schema::{
    FieldDecl, FieldKind, ITEM_TAG, RecordType, RecordTypeBuilder, RowType, SchemaRegistry,
    SchemaRegistryBuilder, TableMode, TableType, TypeRef,
};
pub use serialize::{
    ABAP_XML_NAMESPACE, ASX_ROOT, ASX_VALUES, AbapSerialize, to_xml, to_xml_with_config,
};
pub use value::{Record, Table, Value};

pub use sapcli_core::{CodecConfig, Identifier};
