//! Raw metadata table rows consumed by the type system.
//!
//! Each table lives in its own module holding the row type (`*Raw`) and, where the row has a
//! flags column, the flag constants of that column (§II.23.1). Rows are produced by a
//! [`crate::metadata::reader::MetadataReader`]; string and blob columns are heap indices that
//! the type system decodes lazily.
//!
//! # Reference
//! * [ECMA-335 Partition II, Section 22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Metadata Tables

use strum::{EnumCount, EnumIter, IntoEnumIterator};

mod assemblyref;
mod classlayout;
mod customattribute;
mod field;
mod genericparam;
mod memberref;
mod methoddef;
mod nestedclass;
mod typedef;
mod typeref;
mod typespec;

pub use assemblyref::*;
pub use classlayout::*;
pub use customattribute::*;
pub use field::*;
pub use genericparam::*;
pub use memberref::*;
pub use methoddef::*;
pub use nestedclass::*;
pub use typedef::*;
pub use typeref::*;
pub use typespec::*;

/// Identifiers of the metadata tables a token can point into.
///
/// The numeric values are the table ids of the CLI specification and form the high byte of a
/// [`crate::metadata::token::Token`].
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash)]
pub enum TableId {
    /// `Module` table (0x00) - the current module
    Module = 0x00,
    /// `TypeRef` table (0x01) - references to types defined elsewhere
    TypeRef = 0x01,
    /// `TypeDef` table (0x02) - type definitions
    TypeDef = 0x02,
    /// `Field` table (0x04) - field definitions
    Field = 0x04,
    /// `MethodDef` table (0x06) - method definitions
    MethodDef = 0x06,
    /// `Param` table (0x08) - method parameters
    Param = 0x08,
    /// `MemberRef` table (0x0A) - references to fields and methods
    MemberRef = 0x0A,
    /// `CustomAttribute` table (0x0C) - custom attribute applications
    CustomAttribute = 0x0C,
    /// `ClassLayout` table (0x0F) - explicit packing and size of types
    ClassLayout = 0x0F,
    /// `ModuleRef` table (0x1A) - references to other modules of the assembly
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B) - constructed types encoded as signatures
    TypeSpec = 0x1B,
    /// `Assembly` table (0x20) - the current assembly
    Assembly = 0x20,
    /// `AssemblyRef` table (0x23) - references to other assemblies
    AssemblyRef = 0x23,
    /// `NestedClass` table (0x29) - nesting relation between types
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A) - generic parameters of types and methods
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B) - generic method instantiations
    MethodSpec = 0x2B,
}

impl TableId {
    /// Map a raw table byte to its `TableId`
    #[must_use]
    pub fn from_byte(value: u8) -> Option<TableId> {
        TableId::iter().find(|table| *table as u8 == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ids_roundtrip_bytes() {
        for table in TableId::iter() {
            assert_eq!(TableId::from_byte(table as u8), Some(table));
        }
        assert_eq!(TableId::COUNT, 16);
        assert_eq!(TableId::from_byte(0x03), None);
    }
}
