//! Method, field and type signatures stored in the `#Blob` heap.
//!
//! Signatures encode calling conventions, parameter lists and constructed types in the
//! compact binary format of ECMA-335 §II.23.2. This module decodes them into the
//! [`TypeSignature`] tree ([`SignatureParser`]) and encodes that tree back into blob bytes
//! (the `encode_*` functions), which is how in-memory metadata gets its signature blobs.
//!
//! Signatures stay token based here. Turning a [`TypeSignature`] into a type system node is
//! the job of [`crate::metadata::typesystem::ModuleDesc`].
//!
//! # Examples
//!
//! ```rust
//! use typescope::metadata::signatures::{parse_method_signature, TypeSignature};
//!
//! // instance string (int32)
//! let data = &[0x20, 0x01, 0x0E, 0x08];
//! let method = parse_method_signature(data)?;
//! assert!(method.has_this);
//! assert_eq!(method.return_type.base, TypeSignature::String);
//! assert_eq!(method.params[0].base, TypeSignature::I4);
//! # Ok::<(), typescope::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures

mod encoder;
mod parser;
mod types;

pub use encoder::*;
pub use parser::*;
pub use types::*;

use crate::Result;

#[allow(non_snake_case)]
/// All possible element types (§II.23.1.16)
pub mod ELEMENT_TYPE {
    /// Marks end of a list
    pub const END: u8 = 0x00;
    /// void
    pub const VOID: u8 = 0x01;
    /// bool
    pub const BOOLEAN: u8 = 0x02;
    /// char
    pub const CHAR: u8 = 0x03;
    /// i8
    pub const I1: u8 = 0x04;
    /// u8
    pub const U1: u8 = 0x05;
    /// i16
    pub const I2: u8 = 0x06;
    /// u16
    pub const U2: u8 = 0x07;
    /// i32
    pub const I4: u8 = 0x08;
    /// u32
    pub const U4: u8 = 0x09;
    /// i64
    pub const I8: u8 = 0x0a;
    /// u64
    pub const U8: u8 = 0x0b;
    /// f32
    pub const R4: u8 = 0x0c;
    /// f64
    pub const R8: u8 = 0x0d;
    /// string
    pub const STRING: u8 = 0x0e;
    /// Followed by type
    pub const PTR: u8 = 0x0f;
    /// Followed by type
    pub const BYREF: u8 = 0x10;
    /// Followed by `TypeDef` or `TypeRef` token
    pub const VALUETYPE: u8 = 0x11;
    /// Followed by `TypeDef` or `TypeRef` token
    pub const CLASS: u8 = 0x12;
    /// Generic parameter in a generic type definition, represented as number
    pub const VAR: u8 = 0x13;
    /// type rank boundsCount bound1 ... loCount lo1 ...
    pub const ARRAY: u8 = 0x14;
    /// Generic type instantiation. Followed by type type-arg-count type-1 ... type-n
    pub const GENERICINST: u8 = 0x15;
    /// `TypedReference`
    pub const TYPEDBYREF: u8 = 0x16;
    /// `System.IntPtr`
    pub const I: u8 = 0x18;
    /// `System.UIntPtr`
    pub const U: u8 = 0x19;
    /// Followed by full method signature
    pub const FNPTR: u8 = 0x1b;
    /// `System.Object`
    pub const OBJECT: u8 = 0x1c;
    /// Single-dim array with 0 lower bound
    pub const SZARRAY: u8 = 0x1d;
    /// Generic parameter in a generic method definition, represented as number
    pub const MVAR: u8 = 0x1e;
    /// Required modifier : followed by a `TypeDef` or `TypeRef` token
    pub const CMOD_REQD: u8 = 0x1f;
    /// Optional modifier : followed by a `TypeDef` or `TypeRef` token
    pub const CMOD_OPT: u8 = 0x20;
    /// Sentinel for vararg method signature
    pub const SENTINEL: u8 = 0x41;
    /// Denotes a local variable that points at a pinned object
    pub const PINNED: u8 = 0x45;
    /// Indicates an argument of type `System.Type` in a custom attribute
    pub const TYPE: u8 = 0x50;
    /// Used in custom attributes to specify a boxed object
    pub const BOXED: u8 = 0x51;
    /// Used in custom attributes to indicate a field
    pub const FIELD: u8 = 0x53;
    /// Used in custom attributes to indicate a property
    pub const PROPERTY: u8 = 0x54;
    /// Used in custom attributes to specify an enum
    pub const ENUM: u8 = 0x55;
}

#[allow(non_snake_case)]
/// Calling convention bits of the first signature byte (§II.23.2.1, §II.23.2.3)
pub mod CALLING_CONVENTION {
    /// The low four bits hold the calling convention kind
    pub const KIND_MASK: u8 = 0x0F;
    /// Managed calling convention
    pub const DEFAULT: u8 = 0x00;
    /// Unmanaged C calling convention
    pub const C: u8 = 0x01;
    /// Unmanaged stdcall calling convention
    pub const STDCALL: u8 = 0x02;
    /// Unmanaged thiscall calling convention
    pub const THISCALL: u8 = 0x03;
    /// Unmanaged fastcall calling convention
    pub const FASTCALL: u8 = 0x04;
    /// Managed vararg calling convention
    pub const VARARG: u8 = 0x05;
    /// Header byte of a field signature
    pub const FIELD: u8 = 0x06;
    /// The method has generic parameters, their count follows
    pub const GENERIC: u8 = 0x10;
    /// The method has an implicit `this`
    pub const HAS_THIS: u8 = 0x20;
    /// The `this` parameter is explicitly listed
    pub const EXPLICIT_THIS: u8 = 0x40;
}

/// Parse a `MethodDefSig` or `MethodRefSig` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    let mut parser = SignatureParser::new(data);
    parser.parse_method_signature()
}

/// Parse a `FieldSig` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_field_signature(data: &[u8]) -> Result<SignatureField> {
    let mut parser = SignatureParser::new(data);
    parser.parse_field_signature()
}

/// Parse a `TypeSpec` signature from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_type_spec_signature(data: &[u8]) -> Result<SignatureTypeSpec> {
    let mut parser = SignatureParser::new(data);
    parser.parse_type_spec_signature()
}

/// Returns true if `data` starts with the field signature header
#[must_use]
pub fn is_field_signature(data: &[u8]) -> bool {
    data.first() == Some(&CALLING_CONVENTION::FIELD)
}

/// Append `value` as an unsigned compressed integer (§II.23.2).
///
/// Values up to `0x7F` take one byte, up to `0x3FFF` two bytes and up to `0x1FFF_FFFF`
/// four bytes. Larger values cannot be represented and are masked.
pub fn write_compressed_uint(buffer: &mut Vec<u8>, value: u32) {
    if value <= 0x7F {
        #[allow(clippy::cast_possible_truncation)]
        buffer.push(value as u8);
    } else if value <= 0x3FFF {
        #[allow(clippy::cast_possible_truncation)]
        {
            buffer.push(0x80 | (value >> 8) as u8);
            buffer.push((value & 0xFF) as u8);
        }
    } else {
        #[allow(clippy::cast_possible_truncation)]
        {
            buffer.push(0xC0 | ((value >> 24) & 0x1F) as u8);
            buffer.push(((value >> 16) & 0xFF) as u8);
            buffer.push(((value >> 8) & 0xFF) as u8);
            buffer.push((value & 0xFF) as u8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::parser::Parser;

    #[test]
    fn compressed_uint_widths() {
        let mut buffer = Vec::new();
        write_compressed_uint(&mut buffer, 0x03);
        write_compressed_uint(&mut buffer, 0x80);
        write_compressed_uint(&mut buffer, 0x3FFF);
        write_compressed_uint(&mut buffer, 0x4000);
        assert_eq!(
            buffer,
            [0x03, 0x80, 0x80, 0xBF, 0xFF, 0xC0, 0x00, 0x40, 0x00]
        );

        let mut parser = Parser::new(&buffer);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x03);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x80);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x3FFF);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x4000);
    }

    #[test]
    fn field_signature_header() {
        assert!(is_field_signature(&[0x06, 0x08]));
        assert!(!is_field_signature(&[0x20, 0x00, 0x01]));
        assert!(!is_field_signature(&[]));
    }
}
