use crate::metadata::token::Token;

/// A `NestedClass` row (§II.22.32).
#[derive(Clone, Debug, Default)]
pub struct NestedClassRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// the nested `TypeDef`
    pub nested_class: Token,
    /// the enclosing `TypeDef`
    pub enclosing_class: Token,
}
