mod raw;

pub use raw::*;

#[allow(non_snake_case)]
/// Type attribute flag constants for TypeDef entries (§II.23.1.15).
///
/// ## Visibility Flags
/// - [`TypeAttributes::NOT_PUBLIC`] / [`TypeAttributes::PUBLIC`] - Top-level type visibility
/// - [`TypeAttributes::NESTED_PUBLIC`], [`TypeAttributes::NESTED_PRIVATE`], etc. - Nested type accessibility
///
/// ## Layout Flags
/// - [`TypeAttributes::AUTO_LAYOUT`], [`TypeAttributes::SEQUENTIAL_LAYOUT`], [`TypeAttributes::EXPLICIT_LAYOUT`]
///
/// ## Semantic Flags
/// - [`TypeAttributes::CLASS`] / [`TypeAttributes::INTERFACE`] - Type category
/// - [`TypeAttributes::ABSTRACT`] / [`TypeAttributes::SEALED`] - Inheritance modifiers
/// - [`TypeAttributes::BEFORE_FIELD_INIT`] - Type initializer timing
///
/// ## Interop Flags
/// - [`TypeAttributes::ANSI_CLASS`] / [`TypeAttributes::UNICODE_CLASS`] / [`TypeAttributes::AUTO_CLASS`]
pub mod TypeAttributes {
    /// Mask for extracting type visibility information.
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Type has no public scope (internal to assembly).
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Type has public scope (visible outside assembly).
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested type with public visibility.
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested type with private visibility.
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Nested type with family (protected) visibility.
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Nested type with assembly (internal) visibility.
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Nested type with family AND assembly visibility.
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Nested type with family OR assembly visibility.
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;

    /// Mask for extracting class layout information.
    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    /// Class fields are automatically laid out by the runtime.
    pub const AUTO_LAYOUT: u32 = 0x0000_0000;
    /// Class fields are laid out sequentially in declaration order.
    pub const SEQUENTIAL_LAYOUT: u32 = 0x0000_0008;
    /// Field layout is explicitly specified using field offsets.
    pub const EXPLICIT_LAYOUT: u32 = 0x0000_0010;

    /// Mask for extracting class semantics information.
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// Type is a class (reference or value type).
    pub const CLASS: u32 = 0x0000_0000;
    /// Type is an interface definition.
    pub const INTERFACE: u32 = 0x0000_0020;

    /// Class is abstract and cannot be instantiated directly.
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class is sealed and cannot be inherited from.
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name has special meaning to the runtime.
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// The runtime checks the name encoding.
    pub const RTSPECIAL_NAME: u32 = 0x0000_0800;
    /// Class/Interface is imported.
    pub const IMPORT: u32 = 0x0000_1000;
    /// Type is serializable (legacy attribute).
    pub const SERIALIZABLE: u32 = 0x0000_2000;

    /// Mask for extracting string format information for native interop.
    pub const STRING_FORMAT_MASK: u32 = 0x0003_0000;
    /// String parameters are marshaled as ANSI strings.
    pub const ANSI_CLASS: u32 = 0x0000_0000;
    /// String parameters are marshaled as UTF-16 strings.
    pub const UNICODE_CLASS: u32 = 0x0001_0000;
    /// String parameter marshaling is determined automatically.
    pub const AUTO_CLASS: u32 = 0x0002_0000;
    /// String parameters use a custom marshaling format.
    pub const CUSTOM_FORMAT_CLASS: u32 = 0x0003_0000;

    /// Initializing the class need not happen before the first static field access.
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
}
