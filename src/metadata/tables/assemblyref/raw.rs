use crate::metadata::token::Token;

/// An `AssemblyRef` row (§II.22.5).
#[derive(Clone, Debug, Default)]
pub struct AssemblyRefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 2-byte constant
    pub major_version: u16,
    /// a 2-byte constant
    pub minor_version: u16,
    /// a 2-byte constant
    pub build_number: u16,
    /// a 2-byte constant
    pub revision_number: u16,
    /// a 4-byte bitmask of type `AssemblyFlags`, §II.23.1.2
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the String heap
    pub culture: u32,
}
