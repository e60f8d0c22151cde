use crate::metadata::{tables::TypeAttributes, token::Token};

/// A `TypeDef` row (§II.22.37).
///
/// `field_list` and `method_list` are the member handles owned by this type in row order,
/// as the reader resolved them from the table's contiguous ranges.
#[derive(Clone, Debug, Default)]
pub struct TypeDefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 4-byte bitmask of type `TypeAttributes`, §II.23.1.15
    pub flags: u32,
    /// an index into the String heap
    pub type_name: u32,
    /// an index into the String heap
    pub type_namespace: u32,
    /// a `TypeDefOrRef` token of the base type, nil if the type has none
    pub extends: Token,
    /// the `Field` tokens owned by this type
    pub field_list: Vec<Token>,
    /// the `MethodDef` tokens owned by this type
    pub method_list: Vec<Token>,
}

impl TypeDefRaw {
    /// Returns true if the visibility bits mark this a nested type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        (self.flags & TypeAttributes::VISIBILITY_MASK) > TypeAttributes::PUBLIC
    }

    /// Returns true if the interface semantics bit is set
    #[must_use]
    pub fn is_interface(&self) -> bool {
        (self.flags & TypeAttributes::CLASS_SEMANTICS_MASK) == TypeAttributes::INTERFACE
    }
}
