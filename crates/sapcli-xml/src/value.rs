//! Runtime containers for ABAP structures and tables.
//!
//! Containers check types when they are mutated, so every [`Record`] and
//! [`Table`] that exists is well-typed and can always be serialized.

use std::sync::Arc;

use crate::error::XmlError;
use crate::schema::{FieldDecl, FieldKind, RecordType, RowType, SCALAR_LABEL, TableType};

/// A value stored in a record field or a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text. An empty string is present, not absent.
    Scalar(String),
    /// A nested structure.
    Record(Record),
    /// A nested table.
    Table(Table),
}

impl Value {
    /// Name of the value's runtime type, used in error reports.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar(_) => SCALAR_LABEL,
            Self::Record(record) => record.record_type().name().as_str(),
            Self::Table(table) => table.table_type().name().as_str(),
        }
    }

    /// The text, if this is a scalar.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// The structure, if this is a record.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The table, if this is a table.
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Take the structure out of the value.
    ///
    /// # Errors
    /// Returns [`XmlError::TypeMismatch`] if the value is not a record.
    pub fn into_record(self) -> Result<Record, XmlError> {
        match self {
            Self::Record(record) => Ok(record),
            other => Err(XmlError::type_mismatch("record", other.type_name())),
        }
    }

    /// Take the table out of the value.
    ///
    /// # Errors
    /// Returns [`XmlError::TypeMismatch`] if the value is not a table.
    pub fn into_table(self) -> Result<Table, XmlError> {
        match self {
            Self::Table(table) => Ok(table),
            other => Err(XmlError::type_mismatch("table", other.type_name())),
        }
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Scalar(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Scalar(text.to_owned())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

fn same_type<T: PartialEq>(declared: &Arc<T>, actual: &Arc<T>) -> bool {
    Arc::ptr_eq(declared, actual) || declared == actual
}

/// Check that `value` may be stored in a field of the given kind.
fn check_field(kind: &FieldKind, value: &Value) -> Result<(), XmlError> {
    let ok = match (kind, value) {
        (FieldKind::Scalar, Value::Scalar(_)) => true,
        (FieldKind::Record(ty), Value::Record(record)) => same_type(ty, record.record_type()),
        (FieldKind::Table(ty), Value::Table(table)) => same_type(ty, table.table_type()),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(XmlError::type_mismatch(kind.type_name(), value.type_name()))
    }
}

/// Check that `value` may be appended as a row of the given type.
fn check_row(row: &RowType, value: &Value) -> Result<(), XmlError> {
    let ok = match (row, value) {
        (RowType::Scalar(_), Value::Scalar(_)) => true,
        (RowType::Record(ty), Value::Record(record)) => same_type(ty, record.record_type()),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(XmlError::type_mismatch(row.name().as_str(), value.type_name()))
    }
}

/// An instance of a [`RecordType`].
///
/// Every declared field implicitly exists; a field that was never set is
/// absent and is not written on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    ty: Arc<RecordType>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Create a record with every field absent.
    #[must_use]
    pub fn new(ty: &Arc<RecordType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            values: vec![None; ty.fields().len()],
        }
    }

    /// The record's type.
    #[must_use]
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Store a value; the last write wins.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownMember`] for an undeclared field and
    /// [`XmlError::TypeMismatch`] when the value does not fit the declared kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), XmlError> {
        let value = value.into();
        let pos = self.slot(name)?;
        check_field(self.ty.fields()[pos].kind(), &value)?;
        self.values[pos] = Some(value);
        Ok(())
    }

    /// Store text in a scalar field.
    ///
    /// # Errors
    /// See [`Record::set`].
    pub fn set_text(&mut self, name: &str, text: impl Into<String>) -> Result<(), XmlError> {
        self.set(name, Value::Scalar(text.into()))
    }

    /// The stored value, or `None` if the field is absent or undeclared.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.ty
            .position(name)
            .and_then(|pos| self.values[pos].as_ref())
    }

    /// The stored text of a scalar field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    /// Make a field absent again, returning what it held.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownMember`] for an undeclared field.
    pub fn unset(&mut self, name: &str) -> Result<Option<Value>, XmlError> {
        let pos = self.slot(name)?;
        Ok(self.values[pos].take())
    }

    /// Whether the field holds a value.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Present fields in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDecl, &Value)> {
        self.ty
            .fields()
            .iter()
            .zip(&self.values)
            .filter_map(|(decl, value)| value.as_ref().map(|v| (decl, v)))
    }

    fn slot(&self, name: &str) -> Result<usize, XmlError> {
        self.ty
            .position(name)
            .ok_or_else(|| XmlError::unknown_member(self.ty.name().as_str(), name))
    }
}

/// An instance of a [`TableType`]: rows in append order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    ty: Arc<TableType>,
    rows: Vec<Value>,
}

impl Table {
    /// Create an empty table.
    #[must_use]
    pub fn new(ty: &Arc<TableType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            rows: Vec::new(),
        }
    }

    /// The table's type.
    #[must_use]
    pub fn table_type(&self) -> &Arc<TableType> {
        &self.ty
    }

    /// Append a row.
    ///
    /// # Errors
    /// Returns [`XmlError::TypeMismatch`] if the row is not of the declared
    /// row type; the table is left unchanged.
    pub fn append(&mut self, row: impl Into<Value>) -> Result<(), XmlError> {
        let row = row.into();
        check_row(self.ty.row(), &row)?;
        self.rows.push(row);
        Ok(())
    }

    /// Append a text row.
    ///
    /// # Errors
    /// See [`Table::append`].
    pub fn push_text(&mut self, text: impl Into<String>) -> Result<(), XmlError> {
        self.append(Value::Scalar(text.into()))
    }

    /// All rows in append order.
    #[must_use]
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// The row at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.rows.get(index)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
