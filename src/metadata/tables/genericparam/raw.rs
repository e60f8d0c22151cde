use crate::metadata::token::Token;

/// A `GenericParam` row (§II.22.20).
#[derive(Clone, Debug, Default)]
pub struct GenericParamRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// the 2-byte index of the generic parameter, numbered left-to-right, from zero
    pub number: u32,
    /// a 2-byte bitmask of type `GenericParamAttributes`, §II.23.1.7
    pub flags: u32,
    /// a `TypeOrMethodDef` token of the owner
    pub owner: Token,
    /// an index into the String heap
    pub name: u32,
}
