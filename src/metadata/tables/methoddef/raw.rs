use crate::metadata::{tables::MethodAttributes, token::Token};

/// A `MethodDef` row (§II.22.26).
#[derive(Clone, Debug, Default)]
pub struct MethodDefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 4-byte constant, the RVA of the method body
    pub rva: u32,
    /// a 2-byte bitmask of type `MethodImplAttributes`, §II.23.1.10
    pub impl_flags: u32,
    /// a 2-byte bitmask of type `MethodAttributes`, §II.23.1.10
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap holding a `MethodDefSig`
    pub signature: u32,
}

impl MethodDefRaw {
    /// Returns true if the virtual attribute bit is set
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags & MethodAttributes::VIRTUAL != 0
    }

    /// Returns true if the runtime-special-name attribute bit is set
    #[must_use]
    pub fn is_runtime_special_name(&self) -> bool {
        self.flags & MethodAttributes::RTSPECIAL_NAME != 0
    }

    /// Returns true if the member access is public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags & MethodAttributes::MEMBER_ACCESS_MASK == MethodAttributes::PUBLIC
    }
}
