use crate::metadata::token::Token;

/// A `TypeSpec` row (§II.22.39).
#[derive(Clone, Debug, Default)]
pub struct TypeSpecRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// an index into the Blob heap holding a `TypeSpec` signature
    pub signature: u32,
}
