use crate::metadata::token::Token;

/// A `ClassLayout` row (§II.22.8).
#[derive(Clone, Debug, Default)]
pub struct ClassLayoutRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 2-byte constant, the field alignment
    pub packing_size: u16,
    /// a 4-byte constant, the size of the class
    pub class_size: u32,
    /// the `TypeDef` this layout applies to
    pub parent: Token,
}
