mod raw;

pub use raw::*;

#[allow(non_snake_case)]
/// All possible flags for `MethodAttributes` (§II.23.1.10)
pub mod MethodAttributes {
    /// These 3 bits contain the member access
    pub const MEMBER_ACCESS_MASK: u32 = 0x0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessible by sub-types only in this Assembly
    pub const FAM_AND_ASSEM: u32 = 0x0002;
    /// Accessibly by anyone in the Assembly
    pub const ASSEM: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    pub const FAM_OR_ASSEM: u32 = 0x0005;
    /// Accessibly by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Method cannot be overridden
    pub const FINAL: u32 = 0x0020;
    /// Method is virtual
    pub const VIRTUAL: u32 = 0x0040;
    /// Method hides by name+sig, else just by name
    pub const HIDE_BY_SIG: u32 = 0x0080;
    /// Use this mask to retrieve vtable attributes
    pub const VTABLE_LAYOUT_MASK: u32 = 0x0100;
    /// Method reuses existing slot in vtable
    pub const REUSE_SLOT: u32 = 0x0000;
    /// Method always gets a new slot in the vtable
    pub const NEW_SLOT: u32 = 0x0100;
    /// Method can only be overriden if also accessible
    pub const STRICT: u32 = 0x0200;
    /// Method does not provide an implementation
    pub const ABSTRACT: u32 = 0x0400;
    /// Method is special
    pub const SPECIAL_NAME: u32 = 0x0800;
    /// CLI provides 'special' behavior, depending upon the name of the method
    pub const RTSPECIAL_NAME: u32 = 0x1000;
    /// Implementation is forwarded through `PInvoke`
    pub const PINVOKE_IMPL: u32 = 0x2000;
    /// Method has security associate with it
    pub const HAS_SECURITY: u32 = 0x4000;
    /// Method calls another method containing security code
    pub const REQUIRE_SEC_OBJECT: u32 = 0x8000;
}
