mod raw;

pub use raw::*;

#[allow(non_snake_case)]
/// All possible flags for `GenericParamAttributes` (§II.23.1.7)
pub mod GenericParamAttributes {
    /// These 2 bits contain the variance
    pub const VARIANCE_MASK: u32 = 0x0003;
    /// The generic parameter is non-variant
    pub const NONE: u32 = 0x0000;
    /// The generic parameter is covariant
    pub const COVARIANT: u32 = 0x0001;
    /// The generic parameter is contravariant
    pub const CONTRAVARIANT: u32 = 0x0002;
    /// These 3 bits contain the special constraints
    pub const SPECIAL_CONSTRAINT_MASK: u32 = 0x001C;
    /// The generic parameter has a reference type constraint
    pub const REFERENCE_TYPE_CONSTRAINT: u32 = 0x0004;
    /// The generic parameter has a value type constraint
    pub const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT: u32 = 0x0008;
    /// The generic parameter has a constructor constraint
    pub const DEFAULT_CONSTRUCTOR_CONSTRAINT: u32 = 0x0010;
}
