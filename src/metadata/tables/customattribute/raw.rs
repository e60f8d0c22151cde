use crate::metadata::token::Token;

/// A `CustomAttribute` row (§II.22.10).
#[derive(Clone, Debug, Default)]
pub struct CustomAttributeRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a `HasCustomAttribute` token of the entity the attribute is applied to
    pub parent: Token,
    /// a `CustomAttributeType` token: the `MethodDef` or `MemberRef` of the attribute constructor
    pub constructor: Token,
    /// an index into the Blob heap holding the attribute value
    pub value: u32,
}
