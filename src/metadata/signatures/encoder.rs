//! Signature encoders producing `#Blob` bytes.
//!
//! - [`encode_method_signature`] - `MethodDefSig` / `MethodRefSig`
//! - [`encode_field_signature`] - `FieldSig`
//! - [`encode_typespec_signature`] - `TypeSpec` blobs
//! - [`encode_type_signature`] - a single type, the building block of the above

use crate::{
    metadata::{
        signatures::{
            write_compressed_uint, CustomModifier, SignatureField, SignatureMethod,
            SignatureParameter, SignatureTypeSpec, TypeSignature, CALLING_CONVENTION,
            ELEMENT_TYPE,
        },
        tables::TableId,
        token::Token,
    },
    Result,
};

/// Encodes a token as a `TypeDefOrRefOrSpecEncoded` value (§II.23.2.8).
///
/// # Errors
/// Returns an error if the token does not point into `TypeDef`, `TypeRef` or `TypeSpec`.
pub fn encode_type_def_or_ref_coded_index(token: Token) -> Result<u32> {
    let tag = match token.table_id() {
        Some(TableId::TypeDef) => 0,
        Some(TableId::TypeRef) => 1,
        Some(TableId::TypeSpec) => 2,
        _ => {
            return Err(malformed_error!(
                "Token {} cannot be encoded as TypeDefOrRefOrSpec",
                token
            ))
        }
    };

    if token.row() > 0x07FF_FFFF {
        return Err(malformed_error!("Row of token {} is too large to encode", token));
    }

    Ok((token.row() << 2) | tag)
}

fn encode_custom_modifiers(modifiers: &[CustomModifier], buffer: &mut Vec<u8>) -> Result<()> {
    for modifier in modifiers {
        buffer.push(if modifier.is_required {
            ELEMENT_TYPE::CMOD_REQD
        } else {
            ELEMENT_TYPE::CMOD_OPT
        });
        write_compressed_uint(buffer, encode_type_def_or_ref_coded_index(modifier.modifier_type)?);
    }
    Ok(())
}

fn encode_parameter(param: &SignatureParameter, buffer: &mut Vec<u8>) -> Result<()> {
    encode_custom_modifiers(&param.modifiers, buffer)?;
    if param.by_ref {
        buffer.push(ELEMENT_TYPE::BYREF);
    }
    encode_type_signature(&param.base, buffer)
}

/// Append the encoding of `signature` to `buffer`.
///
/// # Errors
/// Returns an error if a referenced token cannot be encoded.
pub fn encode_type_signature(signature: &TypeSignature, buffer: &mut Vec<u8>) -> Result<()> {
    match signature {
        TypeSignature::Void => buffer.push(ELEMENT_TYPE::VOID),
        TypeSignature::Boolean => buffer.push(ELEMENT_TYPE::BOOLEAN),
        TypeSignature::Char => buffer.push(ELEMENT_TYPE::CHAR),
        TypeSignature::I1 => buffer.push(ELEMENT_TYPE::I1),
        TypeSignature::U1 => buffer.push(ELEMENT_TYPE::U1),
        TypeSignature::I2 => buffer.push(ELEMENT_TYPE::I2),
        TypeSignature::U2 => buffer.push(ELEMENT_TYPE::U2),
        TypeSignature::I4 => buffer.push(ELEMENT_TYPE::I4),
        TypeSignature::U4 => buffer.push(ELEMENT_TYPE::U4),
        TypeSignature::I8 => buffer.push(ELEMENT_TYPE::I8),
        TypeSignature::U8 => buffer.push(ELEMENT_TYPE::U8),
        TypeSignature::R4 => buffer.push(ELEMENT_TYPE::R4),
        TypeSignature::R8 => buffer.push(ELEMENT_TYPE::R8),
        TypeSignature::String => buffer.push(ELEMENT_TYPE::STRING),
        TypeSignature::I => buffer.push(ELEMENT_TYPE::I),
        TypeSignature::U => buffer.push(ELEMENT_TYPE::U),
        TypeSignature::Object => buffer.push(ELEMENT_TYPE::OBJECT),
        TypeSignature::TypedByRef => buffer.push(ELEMENT_TYPE::TYPEDBYREF),
        TypeSignature::Ptr(pointer) => {
            buffer.push(ELEMENT_TYPE::PTR);
            encode_custom_modifiers(&pointer.modifiers, buffer)?;
            encode_type_signature(&pointer.base, buffer)?;
        }
        TypeSignature::ByRef(inner) => {
            buffer.push(ELEMENT_TYPE::BYREF);
            encode_type_signature(inner, buffer)?;
        }
        TypeSignature::ValueType(token) => {
            buffer.push(ELEMENT_TYPE::VALUETYPE);
            write_compressed_uint(buffer, encode_type_def_or_ref_coded_index(*token)?);
        }
        TypeSignature::Class(token) => {
            buffer.push(ELEMENT_TYPE::CLASS);
            write_compressed_uint(buffer, encode_type_def_or_ref_coded_index(*token)?);
        }
        TypeSignature::GenericParamType(index) => {
            buffer.push(ELEMENT_TYPE::VAR);
            write_compressed_uint(buffer, *index);
        }
        TypeSignature::GenericParamMethod(index) => {
            buffer.push(ELEMENT_TYPE::MVAR);
            write_compressed_uint(buffer, *index);
        }
        TypeSignature::Array(array) => {
            buffer.push(ELEMENT_TYPE::ARRAY);
            encode_type_signature(&array.base, buffer)?;
            write_compressed_uint(buffer, array.rank);
            #[allow(clippy::cast_possible_truncation)]
            write_compressed_uint(buffer, array.sizes.len() as u32);
            for size in &array.sizes {
                write_compressed_uint(buffer, *size);
            }
            #[allow(clippy::cast_possible_truncation)]
            write_compressed_uint(buffer, array.lower_bounds.len() as u32);
            for bound in &array.lower_bounds {
                write_compressed_uint(buffer, *bound);
            }
        }
        TypeSignature::SzArray(array) => {
            buffer.push(ELEMENT_TYPE::SZARRAY);
            encode_custom_modifiers(&array.modifiers, buffer)?;
            encode_type_signature(&array.base, buffer)?;
        }
        TypeSignature::GenericInst(definition, arguments) => {
            buffer.push(ELEMENT_TYPE::GENERICINST);
            encode_type_signature(definition, buffer)?;
            #[allow(clippy::cast_possible_truncation)]
            write_compressed_uint(buffer, arguments.len() as u32);
            for argument in arguments {
                encode_type_signature(argument, buffer)?;
            }
        }
        TypeSignature::FnPtr(method) => {
            buffer.push(ELEMENT_TYPE::FNPTR);
            buffer.extend_from_slice(&encode_method_signature(method)?);
        }
        TypeSignature::Pinned(inner) => {
            buffer.push(ELEMENT_TYPE::PINNED);
            encode_type_signature(inner, buffer)?;
        }
    }

    Ok(())
}

/// Encode a method signature (§II.23.2.1, §II.23.2.2)
///
/// # Errors
/// Returns an error if a referenced token cannot be encoded.
pub fn encode_method_signature(signature: &SignatureMethod) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer.push(signature.calling_convention());

    if signature.param_count_generic > 0 {
        write_compressed_uint(&mut buffer, signature.param_count_generic);
    }

    #[allow(clippy::cast_possible_truncation)]
    write_compressed_uint(
        &mut buffer,
        (signature.params.len() + signature.varargs.len()) as u32,
    );
    encode_parameter(&signature.return_type, &mut buffer)?;

    for param in &signature.params {
        encode_parameter(param, &mut buffer)?;
    }

    if !signature.varargs.is_empty() {
        buffer.push(ELEMENT_TYPE::SENTINEL);
        for param in &signature.varargs {
            encode_parameter(param, &mut buffer)?;
        }
    }

    Ok(buffer)
}

/// Encode a field signature (§II.23.2.4)
///
/// # Errors
/// Returns an error if a referenced token cannot be encoded.
pub fn encode_field_signature(signature: &SignatureField) -> Result<Vec<u8>> {
    let mut buffer = vec![CALLING_CONVENTION::FIELD];
    encode_custom_modifiers(&signature.modifiers, &mut buffer)?;
    encode_type_signature(&signature.base, &mut buffer)?;
    Ok(buffer)
}

/// Encode a `TypeSpec` signature (§II.23.2.14)
///
/// # Errors
/// Returns an error if a referenced token cannot be encoded.
pub fn encode_typespec_signature(signature: &SignatureTypeSpec) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    encode_type_signature(&signature.base, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::signatures::{
        parse_field_signature, parse_method_signature, parse_type_spec_signature,
        SignatureArray,
    };

    #[test]
    fn method_signature_bytes() {
        let signature = SignatureMethod::instance(TypeSignature::Void, vec![TypeSignature::I4]);
        assert_eq!(
            encode_method_signature(&signature).unwrap(),
            vec![0x20, 0x01, 0x01, 0x08]
        );
    }

    #[test]
    fn method_signature_with_varargs_and_modifiers() {
        let mut signature = SignatureMethod::static_method(TypeSignature::Void, vec![]);
        signature.default = false;
        signature.vararg = true;
        signature.params.push(SignatureParameter {
            modifiers: vec![CustomModifier {
                is_required: true,
                modifier_type: Token::new(0x0100_0003),
            }],
            by_ref: true,
            base: TypeSignature::String,
        });
        signature.varargs.push(SignatureParameter::new(TypeSignature::R8));

        let encoded = encode_method_signature(&signature).unwrap();
        assert_eq!(
            encoded,
            vec![0x05, 0x02, 0x01, 0x1F, 0x0D, 0x10, 0x0E, 0x41, 0x0D]
        );
        assert_eq!(parse_method_signature(&encoded).unwrap(), signature);
    }

    #[test]
    fn type_spec_generic_instance() {
        let signature = SignatureTypeSpec {
            base: TypeSignature::GenericInst(
                Box::new(TypeSignature::Class(Token::new(0x0100_0002))),
                vec![
                    TypeSignature::GenericParamType(0),
                    TypeSignature::Array(SignatureArray {
                        base: Box::new(TypeSignature::I4),
                        rank: 2,
                        sizes: vec![],
                        lower_bounds: vec![],
                    }),
                ],
            ),
        };

        let encoded = encode_typespec_signature(&signature).unwrap();
        assert_eq!(
            encoded,
            vec![0x15, 0x12, 0x09, 0x02, 0x13, 0x00, 0x14, 0x08, 0x02, 0x00, 0x00]
        );
        assert_eq!(parse_type_spec_signature(&encoded).unwrap(), signature);
    }

    #[test]
    fn field_signature_bytes() {
        let field = SignatureField {
            modifiers: vec![],
            base: TypeSignature::sz_array(TypeSignature::Object),
        };
        let encoded = encode_field_signature(&field).unwrap();
        assert_eq!(encoded, vec![0x06, 0x1D, 0x1C]);
        assert_eq!(parse_field_signature(&encoded).unwrap(), field);
    }

    #[test]
    fn invalid_tokens() {
        assert!(encode_type_def_or_ref_coded_index(Token::new(0x0600_0001)).is_err());
        assert_eq!(
            encode_type_def_or_ref_coded_index(Token::new(0x1B00_0004)).unwrap(),
            (4 << 2) | 2
        );

        let mut buffer = Vec::new();
        assert!(
            encode_type_signature(&TypeSignature::Class(Token::new(0x0A00_0001)), &mut buffer)
                .is_err()
        );
    }
}
