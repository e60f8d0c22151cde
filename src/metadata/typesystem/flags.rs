//! Derived type flags.
//!
//! Flags fall into independent categories that are computed and cached separately, so asking
//! for one never forces another. A request names the categories it wants as a
//! [`FlagCategory`] mask and gets back a [`TypeFlags`] with exactly those fields filled in.

use std::sync::OnceLock;

use bitflags::bitflags;

bitflags! {
    /// Flag categories that can be requested from
    /// [`crate::metadata::typesystem::TypeDesc::compute_flags`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlagCategory: u8 {
        /// The [`TypeCategory`]
        const CATEGORY = 0x01;
        /// Whether any generic parameter is co- or contravariant
        const GENERIC_VARIANCE = 0x02;
        /// Whether the type overrides `System.Object.Finalize`
        const FINALIZER = 0x04;
        /// The [`AttributeFlags`] found by scanning the type's custom attributes
        const ATTRIBUTES = 0x08;
    }
}

bitflags! {
    /// Marker attributes recognized on a type
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeFlags: u8 {
        /// `System.Runtime.CompilerServices.IsByRefLikeAttribute` on a value type
        const IS_BYREF_LIKE = 0x01;
        /// `System.Runtime.CompilerServices.IntrinsicAttribute`
        const IS_INTRINSIC = 0x02;
        /// `System.Runtime.CompilerServices.InlineArrayAttribute` on a value type
        const IS_INLINE_ARRAY = 0x04;
    }
}

/// What kind of type a type descriptor stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
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
    /// A value type deriving from `System.ValueType`
    ValueType,
    /// An enum deriving from `System.Enum`
    Enum,
    /// `System.Nullable`1` and its instantiations
    Nullable,
    /// A reference type
    Class,
    /// An interface
    Interface,
    /// A multi-dimensional array
    Array,
    /// A single dimension, zero based array
    SzArray,
    /// A managed reference
    ByRef,
    /// An unmanaged pointer
    Pointer,
    /// A generic parameter of a type or method
    GenericParameter,
    /// `!n` inside a signature
    SignatureTypeVariable,
    /// `!!n` inside a signature
    SignatureMethodVariable,
}

impl TypeCategory {
    /// Returns true for the primitive categories, `Void` through `Double`
    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeCategory::Void
                | TypeCategory::Boolean
                | TypeCategory::Char
                | TypeCategory::SByte
                | TypeCategory::Byte
                | TypeCategory::Int16
                | TypeCategory::UInt16
                | TypeCategory::Int32
                | TypeCategory::UInt32
                | TypeCategory::Int64
                | TypeCategory::UInt64
                | TypeCategory::IntPtr
                | TypeCategory::UIntPtr
                | TypeCategory::Single
                | TypeCategory::Double
        )
    }

    /// Returns true for categories with value semantics: primitives, value types, enums and
    /// nullables. `Void` counts as a value type.
    #[must_use]
    pub fn is_value_type(self) -> bool {
        self.is_primitive()
            || matches!(
                self,
                TypeCategory::ValueType | TypeCategory::Enum | TypeCategory::Nullable
            )
    }

    /// Returns true for array categories
    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(self, TypeCategory::Array | TypeCategory::SzArray)
    }
}

/// The flags of a type for the categories that were requested.
///
/// A field is `None` exactly when its category was not part of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeFlags {
    /// Present for [`FlagCategory::CATEGORY`]
    pub category: Option<TypeCategory>,
    /// Present for [`FlagCategory::GENERIC_VARIANCE`]
    pub has_generic_variance: Option<bool>,
    /// Present for [`FlagCategory::FINALIZER`]
    pub has_finalizer: Option<bool>,
    /// Present for [`FlagCategory::ATTRIBUTES`]
    pub attributes: Option<AttributeFlags>,
}

impl TypeFlags {
    /// Categories this value carries
    #[must_use]
    pub fn computed(&self) -> FlagCategory {
        let mut categories = FlagCategory::empty();
        categories.set(FlagCategory::CATEGORY, self.category.is_some());
        categories.set(
            FlagCategory::GENERIC_VARIANCE,
            self.has_generic_variance.is_some(),
        );
        categories.set(FlagCategory::FINALIZER, self.has_finalizer.is_some());
        categories.set(FlagCategory::ATTRIBUTES, self.attributes.is_some());
        categories
    }
}

/// Publish-once storage of every flag category of one type.
///
/// Each category is set at most once; a racing computation that loses keeps the published
/// value, which it must equal.
#[derive(Debug, Default)]
pub(crate) struct FlagCache {
    category: OnceLock<TypeCategory>,
    has_generic_variance: OnceLock<bool>,
    has_finalizer: OnceLock<bool>,
    attributes: OnceLock<AttributeFlags>,
}

impl FlagCache {
    pub(crate) fn snapshot(&self, requested: FlagCategory) -> TypeFlags {
        TypeFlags {
            category: if requested.contains(FlagCategory::CATEGORY) {
                self.category.get().copied()
            } else {
                None
            },
            has_generic_variance: if requested.contains(FlagCategory::GENERIC_VARIANCE) {
                self.has_generic_variance.get().copied()
            } else {
                None
            },
            has_finalizer: if requested.contains(FlagCategory::FINALIZER) {
                self.has_finalizer.get().copied()
            } else {
                None
            },
            attributes: if requested.contains(FlagCategory::ATTRIBUTES) {
                self.attributes.get().copied()
            } else {
                None
            },
        }
    }

    /// Publish every field `computed` carries, returning the published values
    pub(crate) fn publish(&self, computed: TypeFlags) -> TypeFlags {
        TypeFlags {
            category: computed.category.map(|v| *self.category.get_or_init(|| v)),
            has_generic_variance: computed
                .has_generic_variance
                .map(|v| *self.has_generic_variance.get_or_init(|| v)),
            has_finalizer: computed
                .has_finalizer
                .map(|v| *self.has_finalizer.get_or_init(|| v)),
            attributes: computed.attributes.map(|v| *self.attributes.get_or_init(|| v)),
        }
    }

    /// Fix the category ahead of derivation; returns false if a different one was published
    pub(crate) fn fix_category(&self, category: TypeCategory) -> bool {
        *self.category.get_or_init(|| category) == category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_only_returns_requested() {
        let cache = FlagCache::default();
        cache.publish(TypeFlags {
            category: Some(TypeCategory::Class),
            has_finalizer: Some(true),
            ..TypeFlags::default()
        });

        let flags = cache.snapshot(FlagCategory::CATEGORY | FlagCategory::ATTRIBUTES);
        assert_eq!(flags.category, Some(TypeCategory::Class));
        assert_eq!(flags.has_finalizer, None);
        assert_eq!(flags.attributes, None);
        assert_eq!(flags.computed(), FlagCategory::CATEGORY);
    }

    #[test]
    fn first_publish_wins() {
        let cache = FlagCache::default();
        let first = cache.publish(TypeFlags {
            has_generic_variance: Some(true),
            ..TypeFlags::default()
        });
        let second = cache.publish(TypeFlags {
            has_generic_variance: Some(false),
            ..TypeFlags::default()
        });
        assert_eq!(first.has_generic_variance, Some(true));
        assert_eq!(second.has_generic_variance, Some(true));
    }

    #[test]
    fn fixed_category() {
        let cache = FlagCache::default();
        assert!(cache.fix_category(TypeCategory::Int32));
        assert!(cache.fix_category(TypeCategory::Int32));
        assert!(!cache.fix_category(TypeCategory::ValueType));
    }

    #[test]
    fn category_predicates() {
        assert!(TypeCategory::Double.is_primitive());
        assert!(!TypeCategory::Nullable.is_primitive());
        assert!(TypeCategory::Nullable.is_value_type());
        assert!(TypeCategory::Enum.is_value_type());
        assert!(!TypeCategory::Class.is_value_type());
        assert!(TypeCategory::SzArray.is_array());
    }
}
