use crate::metadata::token::Token;

/// Represents a parsed type in various signatures
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// System.String
    String,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.Object
    Object,
    /// Type is referenced during runtime
    TypedByRef,
    /// A pointer to a type
    Ptr(SignaturePointer),
    /// Type by reference
    ByRef(Box<TypeSignature>),
    /// CIL value-type
    // TypeDefOrRefOrSpecEncoded
    ValueType(Token),
    /// CIL Class
    // TypeDefOrRefOrSpecEncoded
    Class(Token),
    /// Generic type parameter, `!n`
    GenericParamType(u32),
    /// Generic method parameter, `!!n`
    GenericParamMethod(u32),
    /// Multi-dimensional array
    Array(SignatureArray),
    /// Single dimension array
    SzArray(SignatureSzArray),
    /// Generic type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
    /// A pinned type
    Pinned(Box<TypeSignature>),
}

impl TypeSignature {
    /// Convenience constructor for a single dimension array of `element`
    #[must_use]
    pub fn sz_array(element: TypeSignature) -> Self {
        TypeSignature::SzArray(SignatureSzArray {
            modifiers: Vec::new(),
            base: Box::new(element),
        })
    }

    /// Convenience constructor for an unmanaged pointer to `pointee`
    #[must_use]
    pub fn pointer(pointee: TypeSignature) -> Self {
        TypeSignature::Ptr(SignaturePointer {
            modifiers: Vec::new(),
            base: Box::new(pointee),
        })
    }
}

/// A custom modifier (`modreq` / `modopt`) attached to a type (§II.23.2.7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomModifier {
    /// `true` for `modreq`, `false` for `modopt`
    pub is_required: bool,
    /// The `TypeDef`, `TypeRef` or `TypeSpec` naming the modifier type
    pub modifier_type: Token,
}

/// A multi-dimensional array shape (§II.23.2.13)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureArray {
    /// The type in the array
    pub base: Box<TypeSignature>,
    /// The number of dimensions
    pub rank: u32,
    /// Sizes of the leading dimensions
    pub sizes: Vec<u32>,
    /// Lower bounds of the leading dimensions
    pub lower_bounds: Vec<u32>,
}

/// A single dimension, zero based array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureSzArray {
    /// Custom modifiers of the element
    pub modifiers: Vec<CustomModifier>,
    /// The type in the array
    pub base: Box<TypeSignature>,
}

/// A pointer to a type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignaturePointer {
    /// Custom modifiers of the pointee
    pub modifiers: Vec<CustomModifier>,
    /// The type pointed to
    pub base: Box<TypeSignature>,
}

/// Parameter with optional custom modifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureParameter {
    /// Custom modifiers of the parameter
    pub modifiers: Vec<CustomModifier>,
    /// Parameter is passed by reference
    pub by_ref: bool,
    /// The type of the parameter
    pub base: TypeSignature,
}

impl SignatureParameter {
    /// A by-value parameter without modifiers
    #[must_use]
    pub fn new(base: TypeSignature) -> Self {
        SignatureParameter {
            modifiers: Vec::new(),
            by_ref: false,
            base,
        }
    }
}

/// Represents a method signature (§II.23.2.1)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
pub struct SignatureMethod {
    /// Used to encode the keyword instance in the calling convention, see §II.15.3
    pub has_this: bool,
    /// Used to encode the keyword explicit in the calling convention, see §II.15.3
    pub explicit_this: bool,
    /// Used to encode the keyword default in the calling convention, see §II.15.3
    pub default: bool,
    /// Used to encode the keyword vararg in the calling convention, see §II.15.3
    pub vararg: bool,
    /// Uses native 'cdecl' calling convention
    pub cdecl: bool,
    /// Uses native 'stdcall' calling convention
    pub stdcall: bool,
    /// Uses native 'thiscall' calling convention
    pub thiscall: bool,
    /// Uses native 'fastcall' calling convention
    pub fastcall: bool,
    /// Number of generic parameters of the method, 0 if it is not generic
    pub param_count_generic: u32,
    /// The return type of this `Method`
    pub return_type: SignatureParameter,
    /// The fixed parameters of this `Method`
    pub params: Vec<SignatureParameter>,
    /// The vararg parameters after the sentinel
    pub varargs: Vec<SignatureParameter>,
}

impl SignatureMethod {
    /// A managed `instance` method signature
    #[must_use]
    pub fn instance(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            has_this: true,
            ..SignatureMethod::static_method(return_type, params)
        }
    }

    /// A managed static method signature
    #[must_use]
    pub fn static_method(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            has_this: false,
            explicit_this: false,
            default: true,
            vararg: false,
            cdecl: false,
            stdcall: false,
            thiscall: false,
            fastcall: false,
            param_count_generic: 0,
            return_type: SignatureParameter::new(return_type),
            params: params.into_iter().map(SignatureParameter::new).collect(),
            varargs: Vec::new(),
        }
    }

    /// The calling convention byte this signature is encoded with
    #[must_use]
    pub fn calling_convention(&self) -> u8 {
        use super::CALLING_CONVENTION;

        let mut value = if self.vararg {
            CALLING_CONVENTION::VARARG
        } else if self.cdecl {
            CALLING_CONVENTION::C
        } else if self.stdcall {
            CALLING_CONVENTION::STDCALL
        } else if self.thiscall {
            CALLING_CONVENTION::THISCALL
        } else if self.fastcall {
            CALLING_CONVENTION::FASTCALL
        } else {
            CALLING_CONVENTION::DEFAULT
        };

        if self.param_count_generic > 0 {
            value |= CALLING_CONVENTION::GENERIC;
        }
        if self.has_this {
            value |= CALLING_CONVENTION::HAS_THIS;
        }
        if self.explicit_this {
            value |= CALLING_CONVENTION::EXPLICIT_THIS;
        }
        value
    }
}

/// Field signature (§II.23.2.4)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureField {
    /// The custom modifiers for this field
    pub modifiers: Vec<CustomModifier>,
    /// The signature of this type
    pub base: TypeSignature,
}

/// `TypeSpec` signature (§II.23.2.14)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureTypeSpec {
    /// The type this `TypeSpec` describes
    pub base: TypeSignature,
}
