use crate::metadata::token::Token;

/// A `TypeRef` row (§II.22.38).
#[derive(Clone, Debug, Default)]
pub struct TypeRefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a `ResolutionScope` token: `Module`, `ModuleRef`, `AssemblyRef` or an enclosing `TypeRef`
    pub resolution_scope: Token,
    /// an index into the String heap
    pub type_name: u32,
    /// an index into the String heap
    pub type_namespace: u32,
}
