use crate::metadata::token::Token;

/// A `Field` row (§II.22.15).
#[derive(Clone, Debug, Default)]
pub struct FieldRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 2-byte bitmask of type `FieldAttributes`, §II.23.1.5
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap holding a `FieldSig`
    pub signature: u32,
}
