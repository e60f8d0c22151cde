use crate::metadata::token::Token;

/// A `MemberRef` row (§II.22.25).
#[derive(Clone, Debug, Default)]
pub struct MemberRefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a `MemberRefParent` token, usually the `TypeRef`, `TypeDef` or `TypeSpec` declaring the member
    pub class: Token,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap holding a method or field signature
    pub signature: u32,
}
