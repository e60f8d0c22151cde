//! The metadata reader collaborator.
//!
//! The type system never parses a file itself. It consumes the rows of one module through the
//! [`MetadataReader`] trait: string and blob heaps, raw table rows addressed by token, and the
//! relations between rows (members of a type, generic parameters of an owner, custom
//! attributes of a parent, nesting). [`MetadataTables`] is the in-memory implementation,
//! produced by [`crate::metadata::builder::MetadataBuilder`].

use std::collections::HashMap;

use crate::{
    metadata::{
        streams::{Blob, Strings},
        tables::{
            AssemblyRefRaw, ClassLayoutRaw, CustomAttributeRaw, FieldRaw, GenericParamRaw,
            MemberRefRaw, MethodDefRaw, TableId, TypeDefRaw, TypeRefRaw, TypeSpecRaw,
        },
        token::Token,
    },
    Result,
};

/// Read access to the metadata of a single module.
///
/// Row accessors return `None` for tokens of another table or rows past the end of the
/// table. Relation accessors return an empty slice when there is nothing to report.
/// Implementations are shared between worker threads and must not mutate after
/// construction.
pub trait MetadataReader: Send + Sync {
    /// Name of the assembly this module belongs to, as `AssemblyRef` rows refer to it
    fn assembly_name(&self) -> &str;

    /// The `#Strings` heap.
    ///
    /// # Errors
    /// Returns an error if the heap is malformed.
    fn strings(&self) -> Result<Strings<'_>>;

    /// The `#Blob` heap.
    ///
    /// # Errors
    /// Returns an error if the heap is malformed.
    fn blobs(&self) -> Result<Blob<'_>>;

    /// Number of rows in the `TypeDef` table
    fn type_def_count(&self) -> u32;

    /// The `TypeDef` row of `token`
    fn type_def(&self, token: Token) -> Option<&TypeDefRaw>;

    /// The `TypeRef` row of `token`
    fn type_ref(&self, token: Token) -> Option<&TypeRefRaw>;

    /// The `TypeSpec` row of `token`
    fn type_spec(&self, token: Token) -> Option<&TypeSpecRaw>;

    /// The `MethodDef` row of `token`
    fn method_def(&self, token: Token) -> Option<&MethodDefRaw>;

    /// The `Field` row of `token`
    fn field(&self, token: Token) -> Option<&FieldRaw>;

    /// The `MemberRef` row of `token`
    fn member_ref(&self, token: Token) -> Option<&MemberRefRaw>;

    /// The `AssemblyRef` row of `token`
    fn assembly_ref(&self, token: Token) -> Option<&AssemblyRefRaw>;

    /// The `GenericParam` row of `token`
    fn generic_param(&self, token: Token) -> Option<&GenericParamRaw>;

    /// Generic parameters of a `TypeDef` or `MethodDef`, ordered by number
    fn generic_params(&self, owner: Token) -> &[Token];

    /// Custom attributes applied to `parent`
    fn custom_attributes(&self, parent: Token) -> &[CustomAttributeRaw];

    /// `TypeDef`s nested directly in `enclosing`
    fn nested_types(&self, enclosing: Token) -> &[Token];

    /// The `TypeDef` enclosing `nested`
    fn enclosing_type(&self, nested: Token) -> Option<Token>;

    /// The `ClassLayout` row of a `TypeDef`
    fn class_layout(&self, type_def: Token) -> Option<&ClassLayoutRaw>;

    /// The `TypeDef` declaring a `MethodDef`
    fn method_owner(&self, method: Token) -> Option<Token>;

    /// The `TypeDef` declaring a `Field`
    fn field_owner(&self, field: Token) -> Option<Token>;
}

fn row<T>(rows: &[T], token: Token, table: TableId) -> Option<&T> {
    if !token.is_table(table) || token.is_null() {
        return None;
    }
    rows.get(token.row() as usize - 1)
}

/// Metadata tables held in memory.
///
/// Rows are stored per table in row order; relations are indexed by token when the tables are
/// built.
#[derive(Default)]
pub struct MetadataTables {
    pub(crate) assembly_name: String,
    pub(crate) strings: Vec<u8>,
    pub(crate) blobs: Vec<u8>,
    pub(crate) type_defs: Vec<TypeDefRaw>,
    pub(crate) type_refs: Vec<TypeRefRaw>,
    pub(crate) type_specs: Vec<TypeSpecRaw>,
    pub(crate) method_defs: Vec<MethodDefRaw>,
    pub(crate) fields: Vec<FieldRaw>,
    pub(crate) member_refs: Vec<MemberRefRaw>,
    pub(crate) assembly_refs: Vec<AssemblyRefRaw>,
    pub(crate) generic_param_rows: Vec<GenericParamRaw>,
    pub(crate) generic_params: HashMap<Token, Vec<Token>>,
    pub(crate) custom_attributes: HashMap<Token, Vec<CustomAttributeRaw>>,
    pub(crate) nested_types: HashMap<Token, Vec<Token>>,
    pub(crate) enclosing_types: HashMap<Token, Token>,
    pub(crate) class_layouts: HashMap<Token, ClassLayoutRaw>,
    pub(crate) method_owners: HashMap<Token, Token>,
    pub(crate) field_owners: HashMap<Token, Token>,
}

impl MetadataTables {
    /// Rebuild the member owner indices from the `TypeDef` member lists
    pub(crate) fn index_members(&mut self) {
        self.method_owners.clear();
        self.field_owners.clear();
        for type_def in &self.type_defs {
            for method in &type_def.method_list {
                self.method_owners.insert(*method, type_def.token);
            }
            for field in &type_def.field_list {
                self.field_owners.insert(*field, type_def.token);
            }
        }
    }
}

impl MetadataReader for MetadataTables {
    fn assembly_name(&self) -> &str {
        &self.assembly_name
    }

    fn strings(&self) -> Result<Strings<'_>> {
        Strings::from(&self.strings)
    }

    fn blobs(&self) -> Result<Blob<'_>> {
        Blob::from(&self.blobs)
    }

    fn type_def_count(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.type_defs.len() as u32;
        count
    }

    fn type_def(&self, token: Token) -> Option<&TypeDefRaw> {
        row(&self.type_defs, token, TableId::TypeDef)
    }

    fn type_ref(&self, token: Token) -> Option<&TypeRefRaw> {
        row(&self.type_refs, token, TableId::TypeRef)
    }

    fn type_spec(&self, token: Token) -> Option<&TypeSpecRaw> {
        row(&self.type_specs, token, TableId::TypeSpec)
    }

    fn method_def(&self, token: Token) -> Option<&MethodDefRaw> {
        row(&self.method_defs, token, TableId::MethodDef)
    }

    fn field(&self, token: Token) -> Option<&FieldRaw> {
        row(&self.fields, token, TableId::Field)
    }

    fn member_ref(&self, token: Token) -> Option<&MemberRefRaw> {
        row(&self.member_refs, token, TableId::MemberRef)
    }

    fn assembly_ref(&self, token: Token) -> Option<&AssemblyRefRaw> {
        row(&self.assembly_refs, token, TableId::AssemblyRef)
    }

    fn generic_param(&self, token: Token) -> Option<&GenericParamRaw> {
        row(&self.generic_param_rows, token, TableId::GenericParam)
    }

    fn generic_params(&self, owner: Token) -> &[Token] {
        self.generic_params.get(&owner).map(Vec::as_slice).unwrap_or_default()
    }

    fn custom_attributes(&self, parent: Token) -> &[CustomAttributeRaw] {
        self.custom_attributes.get(&parent).map(Vec::as_slice).unwrap_or_default()
    }

    fn nested_types(&self, enclosing: Token) -> &[Token] {
        self.nested_types.get(&enclosing).map(Vec::as_slice).unwrap_or_default()
    }

    fn enclosing_type(&self, nested: Token) -> Option<Token> {
        self.enclosing_types.get(&nested).copied()
    }

    fn class_layout(&self, type_def: Token) -> Option<&ClassLayoutRaw> {
        self.class_layouts.get(&type_def)
    }

    fn method_owner(&self, method: Token) -> Option<Token> {
        self.method_owners.get(&method).copied()
    }

    fn field_owner(&self, field: Token) -> Option<Token> {
        self.field_owners.get(&field).copied()
    }
}
