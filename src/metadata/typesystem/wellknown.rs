use strum::{Display, EnumCount, EnumIter};

use crate::metadata::typesystem::TypeCategory;

/// Types of the core library the type system needs to know by identity.
///
/// Every kind is resolved once from the system module by
/// [`crate::metadata::typesystem::TypeSystemContext::initialize`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumIter, EnumCount)]
pub enum WellKnownType {
    /// `System.Void`
    Void,
    /// `System.Boolean`
    Boolean,
    /// `System.Char`
    Char,
    /// `System.SByte`
    SByte,
    /// `System.Byte`
    Byte,
    /// `System.Int16`
    Int16,
    /// `System.UInt16`
    UInt16,
    /// `System.Int32`
    Int32,
    /// `System.UInt32`
    UInt32,
    /// `System.Int64`
    Int64,
    /// `System.UInt64`
    UInt64,
    /// `System.IntPtr`
    IntPtr,
    /// `System.UIntPtr`
    UIntPtr,
    /// `System.Single`
    Single,
    /// `System.Double`
    Double,
    /// `System.ValueType`
    ValueType,
    /// `System.Enum`
    Enum,
    /// `System.Nullable`1`
    Nullable,
    /// `System.Object`
    Object,
    /// `System.String`
    String,
    /// `System.Array`
    Array,
    /// `System.MulticastDelegate`
    MulticastDelegate,
    /// `System.RuntimeTypeHandle`
    RuntimeTypeHandle,
    /// `System.RuntimeMethodHandle`
    RuntimeMethodHandle,
    /// `System.RuntimeFieldHandle`
    RuntimeFieldHandle,
    /// `System.Exception`
    Exception,
    /// `System.TypedReference`
    TypedReference,
}

impl WellKnownType {
    /// Namespace and metadata name of the type in the core library
    #[must_use]
    pub fn namespace_and_name(self) -> (&'static str, &'static str) {
        let name = match self {
            WellKnownType::Void => "Void",
            WellKnownType::Boolean => "Boolean",
            WellKnownType::Char => "Char",
            WellKnownType::SByte => "SByte",
            WellKnownType::Byte => "Byte",
            WellKnownType::Int16 => "Int16",
            WellKnownType::UInt16 => "UInt16",
            WellKnownType::Int32 => "Int32",
            WellKnownType::UInt32 => "UInt32",
            WellKnownType::Int64 => "Int64",
            WellKnownType::UInt64 => "UInt64",
            WellKnownType::IntPtr => "IntPtr",
            WellKnownType::UIntPtr => "UIntPtr",
            WellKnownType::Single => "Single",
            WellKnownType::Double => "Double",
            WellKnownType::ValueType => "ValueType",
            WellKnownType::Enum => "Enum",
            WellKnownType::Nullable => "Nullable`1",
            WellKnownType::Object => "Object",
            WellKnownType::String => "String",
            WellKnownType::Array => "Array",
            WellKnownType::MulticastDelegate => "MulticastDelegate",
            WellKnownType::RuntimeTypeHandle => "RuntimeTypeHandle",
            WellKnownType::RuntimeMethodHandle => "RuntimeMethodHandle",
            WellKnownType::RuntimeFieldHandle => "RuntimeFieldHandle",
            WellKnownType::Exception => "Exception",
            WellKnownType::TypedReference => "TypedReference",
        };
        ("System", name)
    }

    /// The category fixed for this type when the context is initialized, `None` for types
    /// whose category is derived from metadata like any other type
    #[must_use]
    pub fn fixed_category(self) -> Option<TypeCategory> {
        Some(match self {
            WellKnownType::Void => TypeCategory::Void,
            WellKnownType::Boolean => TypeCategory::Boolean,
            WellKnownType::Char => TypeCategory::Char,
            WellKnownType::SByte => TypeCategory::SByte,
            WellKnownType::Byte => TypeCategory::Byte,
            WellKnownType::Int16 => TypeCategory::Int16,
            WellKnownType::UInt16 => TypeCategory::UInt16,
            WellKnownType::Int32 => TypeCategory::Int32,
            WellKnownType::UInt32 => TypeCategory::UInt32,
            WellKnownType::Int64 => TypeCategory::Int64,
            WellKnownType::UInt64 => TypeCategory::UInt64,
            WellKnownType::IntPtr => TypeCategory::IntPtr,
            WellKnownType::UIntPtr => TypeCategory::UIntPtr,
            WellKnownType::Single => TypeCategory::Single,
            WellKnownType::Double => TypeCategory::Double,
            WellKnownType::Nullable => TypeCategory::Nullable,
            _ => return None,
        })
    }
}
