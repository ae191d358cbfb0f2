//! Schema descriptors for ABAP structures and internal tables.
//!
//! A [`RecordType`] is an ordered list of [`FieldDecl`]s; the declaration
//! order is the serialization order. A [`TableType`] pairs a [`RowType`] with
//! a [`TableMode`] that decides how rows are tagged on the wire. Descriptors
//! are immutable once built and are shared through `Arc`.
//!
//! [`SchemaRegistry`] collects named descriptors so a process can build its
//! schema once and resolve types by name afterwards.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use sapcli_core::Identifier;

use crate::error::XmlError;

/// Tag used for every row of an [`TableMode::Itemized`] table.
pub const ITEM_TAG: &str = "item";

/// Label used for scalar values in type mismatch reports.
pub(crate) const SCALAR_LABEL: &str = "scalar";

/// What a record field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Text or absence.
    Scalar,
    /// A nested structure.
    Record(Arc<RecordType>),
    /// A nested table, ordered or itemized depending on its [`TableMode`].
    Table(Arc<TableType>),
}

impl FieldKind {
    /// Name of the declared type, used in error reports.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar => SCALAR_LABEL,
            Self::Record(ty) => ty.name().as_str(),
            Self::Table(ty) => ty.name().as_str(),
        }
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    name: Identifier,
    kind: FieldKind,
}

impl FieldDecl {
    /// The field name, which is also its tag.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// The declared kind of the field.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// Schema of one kind of ABAP structure.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordType {
    name: Identifier,
    fields: Vec<FieldDecl>,
    index: HashMap<String, usize>,
}

impl RecordType {
    /// Build a record type from its fields in declaration order.
    ///
    /// # Errors
    /// Returns an error for an invalid type or field name, or when a field
    /// name is declared twice.
    pub fn new<S: AsRef<str>>(
        name: &str,
        fields: impl IntoIterator<Item = (S, FieldKind)>,
    ) -> Result<Arc<Self>, XmlError> {
        let name = Identifier::new(name)?;
        let mut decls = Vec::new();
        let mut index = HashMap::new();

        for (field, kind) in fields {
            let field = Identifier::new(field.as_ref())?;
            match index.entry(field.as_str().to_owned()) {
                Entry::Occupied(_) => {
                    return Err(XmlError::DuplicateMember {
                        type_name: name.to_string(),
                        field_name: field.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(decls.len());
                }
            }
            decls.push(FieldDecl { name: field, kind });
        }

        Ok(Arc::new(Self {
            name,
            fields: decls,
            index,
        }))
    }

    /// Start a builder for a record type with the given name.
    #[must_use]
    pub fn builder(name: &str) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.to_owned(),
            fields: Vec::new(),
        }
    }

    /// The declared type name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// All fields in their canonical serialization order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Look up a field declared on this type.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownMember`] if the name is not declared.
    pub fn resolve_field(&self, field_name: &str) -> Result<&FieldDecl, XmlError> {
        self.position(field_name)
            .map(|pos| &self.fields[pos])
            .ok_or_else(|| XmlError::unknown_member(self.name.as_str(), field_name))
    }

    pub(crate) fn position(&self, field_name: &str) -> Option<usize> {
        self.index.get(field_name).copied()
    }
}

/// Incremental construction of a [`RecordType`].
#[derive(Debug)]
pub struct RecordTypeBuilder {
    name: String,
    fields: Vec<(String, FieldKind)>,
}

impl RecordTypeBuilder {
    /// Declare a scalar field.
    #[must_use]
    pub fn scalar(mut self, name: &str) -> Self {
        self.fields.push((name.to_owned(), FieldKind::Scalar));
        self
    }

    /// Declare a nested structure field.
    #[must_use]
    pub fn record(mut self, name: &str, ty: &Arc<RecordType>) -> Self {
        self.fields
            .push((name.to_owned(), FieldKind::Record(Arc::clone(ty))));
        self
    }

    /// Declare a nested table field.
    #[must_use]
    pub fn table(mut self, name: &str, ty: &Arc<TableType>) -> Self {
        self.fields
            .push((name.to_owned(), FieldKind::Table(Arc::clone(ty))));
        self
    }

    /// Finish the type.
    ///
    /// # Errors
    /// See [`RecordType::new`].
    pub fn build(self) -> Result<Arc<RecordType>, XmlError> {
        RecordType::new(&self.name, self.fields)
    }
}

/// How table rows are tagged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Each row is tagged with the row type name.
    Ordered,
    /// Each row is tagged `item`.
    Itemized,
}

/// The type of every row of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowType {
    /// Rows are plain text, named for ordered rendering.
    Scalar(Identifier),
    /// Rows are structures.
    Record(Arc<RecordType>),
}

impl RowType {
    /// Text rows with the given declared name.
    ///
    /// # Errors
    /// Returns an error if the name is not a valid identifier.
    pub fn scalar(name: &str) -> Result<Self, XmlError> {
        Ok(Self::Scalar(Identifier::new(name)?))
    }

    /// Structure rows.
    #[must_use]
    pub fn record(ty: &Arc<RecordType>) -> Self {
        Self::Record(Arc::clone(ty))
    }

    /// The declared row type name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        match self {
            Self::Scalar(name) => name,
            Self::Record(ty) => ty.name(),
        }
    }
}

/// Schema of one kind of internal table.
#[derive(Debug, PartialEq, Eq)]
pub struct TableType {
    name: Identifier,
    row: RowType,
    mode: TableMode,
}

impl TableType {
    /// A table whose rows are tagged with the row type name.
    ///
    /// # Errors
    /// Returns an error if the name is not a valid identifier.
    pub fn ordered(name: &str, row: RowType) -> Result<Arc<Self>, XmlError> {
        Self::new(name, row, TableMode::Ordered)
    }

    /// A table whose rows are all tagged `item`.
    ///
    /// # Errors
    /// Returns an error if the name is not a valid identifier.
    pub fn itemized(name: &str, row: RowType) -> Result<Arc<Self>, XmlError> {
        Self::new(name, row, TableMode::Itemized)
    }

    fn new(name: &str, row: RowType, mode: TableMode) -> Result<Arc<Self>, XmlError> {
        Ok(Arc::new(Self {
            name: Identifier::new(name)?,
            row,
            mode,
        }))
    }

    /// The declared table type name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// The row type.
    #[must_use]
    pub fn row(&self) -> &RowType {
        &self.row
    }

    /// The rendering mode.
    #[must_use]
    pub fn mode(&self) -> TableMode {
        self.mode
    }

    /// The tag every row of this table is written with.
    #[must_use]
    pub fn row_tag(&self) -> &str {
        match self.mode {
            TableMode::Ordered => self.row.name().as_str(),
            TableMode::Itemized => ITEM_TAG,
        }
    }
}

/// A top-level type: what a document body decodes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A structure.
    Record(Arc<RecordType>),
    /// A table.
    Table(Arc<TableType>),
}

impl TypeRef {
    /// The declared type name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        match self {
            Self::Record(ty) => ty.name(),
            Self::Table(ty) => ty.name(),
        }
    }
}

impl From<Arc<RecordType>> for TypeRef {
    fn from(ty: Arc<RecordType>) -> Self {
        Self::Record(ty)
    }
}

impl From<&Arc<RecordType>> for TypeRef {
    fn from(ty: &Arc<RecordType>) -> Self {
        Self::Record(Arc::clone(ty))
    }
}

impl From<Arc<TableType>> for TypeRef {
    fn from(ty: Arc<TableType>) -> Self {
        Self::Table(ty)
    }
}

impl From<&Arc<TableType>> for TypeRef {
    fn from(ty: &Arc<TableType>) -> Self {
        Self::Table(Arc::clone(ty))
    }
}

/// Read-only collection of named type descriptors.
///
/// Build it once, wrap it in an `Arc` if several components need it, and
/// resolve types by name afterwards. Registering a type also registers every
/// record and table type reachable from it.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeRef>,
}

impl SchemaRegistry {
    /// Start an empty builder.
    #[must_use]
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder {
            registry: Self::default(),
        }
    }

    /// Resolve a type by name.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownType`] if nothing is registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&TypeRef, XmlError> {
        self.types
            .get(name)
            .ok_or_else(|| XmlError::UnknownType(name.to_owned()))
    }

    /// Resolve a record type by name.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownType`] if no record type has that name.
    pub fn record(&self, name: &str) -> Result<&Arc<RecordType>, XmlError> {
        match self.resolve(name)? {
            TypeRef::Record(ty) => Ok(ty),
            TypeRef::Table(_) => Err(XmlError::UnknownType(name.to_owned())),
        }
    }

    /// Resolve a table type by name.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownType`] if no table type has that name.
    pub fn table(&self, name: &str) -> Result<&Arc<TableType>, XmlError> {
        match self.resolve(name)? {
            TypeRef::Table(ty) => Ok(ty),
            TypeRef::Record(_) => Err(XmlError::UnknownType(name.to_owned())),
        }
    }

    /// Look up `field_name` on the record type registered as `type_name`.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownType`] or [`XmlError::UnknownMember`].
    pub fn resolve_field(&self, type_name: &str, field_name: &str) -> Result<&FieldDecl, XmlError> {
        self.record(type_name)?.resolve_field(field_name)
    }

    /// Fields of the record type registered as `type_name`, in declared order.
    ///
    /// # Errors
    /// Returns [`XmlError::UnknownType`] if no record type has that name.
    pub fn fields_in_order(&self, type_name: &str) -> Result<&[FieldDecl], XmlError> {
        Ok(self.record(type_name)?.fields())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn insert(&mut self, ty: TypeRef) -> Result<(), XmlError> {
        match self.types.entry(ty.name().as_str().to_owned()) {
            Entry::Occupied(existing) => {
                if *existing.get() != ty {
                    return Err(XmlError::DuplicateType(ty.name().to_string()));
                }
                // Already registered together with everything it references.
                return Ok(());
            }
            Entry::Vacant(slot) => {
                slot.insert(ty.clone());
            }
        }

        match &ty {
            TypeRef::Record(record) => {
                for field in record.fields() {
                    match field.kind() {
                        FieldKind::Scalar => {}
                        FieldKind::Record(nested) => self.insert(TypeRef::from(nested))?,
                        FieldKind::Table(nested) => self.insert(TypeRef::from(nested))?,
                    }
                }
            }
            TypeRef::Table(table) => {
                if let RowType::Record(row) = table.row() {
                    self.insert(TypeRef::from(row))?;
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`SchemaRegistry`].
#[derive(Debug)]
pub struct SchemaRegistryBuilder {
    registry: SchemaRegistry,
}

impl SchemaRegistryBuilder {
    /// Register a type and everything it references.
    ///
    /// # Errors
    /// Returns [`XmlError::DuplicateType`] when a different type with the same
    /// name is already registered.
    pub fn register(mut self, ty: impl Into<TypeRef>) -> Result<Self, XmlError> {
        self.registry.insert(ty.into())?;
        Ok(self)
    }

    /// Finish the registry.
    #[must_use]
    pub fn build(self) -> SchemaRegistry {
        self.registry
    }
}
