use crate::{
    file::parser::Parser,
    metadata::{
        customattributes::{
            CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
            SERIALIZATION_TYPE,
        },
        signatures::{SignatureMethod, TypeSignature},
    },
    Error::NotSupported,
    Result,
};

/// Parse a custom attribute value blob against the signature of its constructor.
///
/// An empty blob yields a value without arguments.
///
/// # Errors
/// Returns an error for a missing prolog, truncated data, or argument types this parser does
/// not decode (enums, `System.Type`, boxed objects).
pub fn parse_custom_attribute_blob(
    data: &[u8],
    constructor: &SignatureMethod,
) -> Result<CustomAttributeValue> {
    if data.is_empty() {
        return Ok(CustomAttributeValue::default());
    }

    CustomAttributeParser::new(data).parse_custom_attribute(constructor)
}

/// Reader for a single custom attribute value blob
pub struct CustomAttributeParser<'a> {
    parser: Parser<'a>,
}

impl<'a> CustomAttributeParser<'a> {
    /// Create a parser over `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        CustomAttributeParser {
            parser: Parser::new(data),
        }
    }

    /// Parse the prolog, the fixed arguments and the named arguments.
    ///
    /// # Errors
    /// See [`parse_custom_attribute_blob`].
    pub fn parse_custom_attribute(
        &mut self,
        constructor: &SignatureMethod,
    ) -> Result<CustomAttributeValue> {
        let prolog = self.parser.read_le::<u16>()?;
        if prolog != 0x0001 {
            return Err(malformed_error!(
                "Invalid custom attribute prolog - expected 0x0001, got 0x{:04X}",
                prolog
            ));
        }

        let mut fixed_args = Vec::with_capacity(constructor.params.len());
        for param in &constructor.params {
            fixed_args.push(self.parse_fixed_argument(&param.base)?);
        }

        let mut named_args = Vec::new();
        if self.parser.has_more_data() {
            let count = self.parser.read_le::<u16>()?;
            for _ in 0..count {
                named_args.push(self.parse_named_argument()?);
            }
        }

        Ok(CustomAttributeValue {
            fixed_args,
            named_args,
        })
    }

    fn parse_fixed_argument(&mut self, arg_type: &TypeSignature) -> Result<CustomAttributeArgument> {
        match arg_type {
            TypeSignature::Boolean => self.parse_by_tag(SERIALIZATION_TYPE::BOOLEAN),
            TypeSignature::Char => self.parse_by_tag(SERIALIZATION_TYPE::CHAR),
            TypeSignature::I1 => self.parse_by_tag(SERIALIZATION_TYPE::I1),
            TypeSignature::U1 => self.parse_by_tag(SERIALIZATION_TYPE::U1),
            TypeSignature::I2 => self.parse_by_tag(SERIALIZATION_TYPE::I2),
            TypeSignature::U2 => self.parse_by_tag(SERIALIZATION_TYPE::U2),
            TypeSignature::I4 => self.parse_by_tag(SERIALIZATION_TYPE::I4),
            TypeSignature::U4 => self.parse_by_tag(SERIALIZATION_TYPE::U4),
            TypeSignature::I8 => self.parse_by_tag(SERIALIZATION_TYPE::I8),
            TypeSignature::U8 => self.parse_by_tag(SERIALIZATION_TYPE::U8),
            TypeSignature::R4 => self.parse_by_tag(SERIALIZATION_TYPE::R4),
            TypeSignature::R8 => self.parse_by_tag(SERIALIZATION_TYPE::R8),
            TypeSignature::String => self.parse_by_tag(SERIALIZATION_TYPE::STRING),
            TypeSignature::SzArray(array) => {
                let count = self.parser.read_le::<u32>()?;
                if count == 0xFFFF_FFFF {
                    return Ok(CustomAttributeArgument::Array(None));
                }

                let mut elements = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    elements.push(self.parse_fixed_argument(&array.base)?);
                }
                Ok(CustomAttributeArgument::Array(Some(elements)))
            }
            other => Err(NotSupported(format!(
                "custom attribute argument of type {other:?}"
            ))),
        }
    }

    fn parse_by_tag(&mut self, tag: u8) -> Result<CustomAttributeArgument> {
        Ok(match tag {
            SERIALIZATION_TYPE::BOOLEAN => {
                CustomAttributeArgument::Bool(self.parser.read_le::<u8>()? != 0)
            }
            SERIALIZATION_TYPE::CHAR => {
                let value = self.parser.read_le::<u16>()?;
                match char::from_u32(u32::from(value)) {
                    Some(value) => CustomAttributeArgument::Char(value),
                    None => return Err(malformed_error!("Invalid char argument - {}", value)),
                }
            }
            SERIALIZATION_TYPE::I1 => CustomAttributeArgument::I1(self.parser.read_le::<i8>()?),
            SERIALIZATION_TYPE::U1 => CustomAttributeArgument::U1(self.parser.read_le::<u8>()?),
            SERIALIZATION_TYPE::I2 => CustomAttributeArgument::I2(self.parser.read_le::<i16>()?),
            SERIALIZATION_TYPE::U2 => CustomAttributeArgument::U2(self.parser.read_le::<u16>()?),
            SERIALIZATION_TYPE::I4 => CustomAttributeArgument::I4(self.parser.read_le::<i32>()?),
            SERIALIZATION_TYPE::U4 => CustomAttributeArgument::U4(self.parser.read_le::<u32>()?),
            SERIALIZATION_TYPE::I8 => CustomAttributeArgument::I8(self.parser.read_le::<i64>()?),
            SERIALIZATION_TYPE::U8 => CustomAttributeArgument::U8(self.parser.read_le::<u64>()?),
            SERIALIZATION_TYPE::R4 => CustomAttributeArgument::R4(self.parser.read_le::<f32>()?),
            SERIALIZATION_TYPE::R8 => CustomAttributeArgument::R8(self.parser.read_le::<f64>()?),
            SERIALIZATION_TYPE::STRING => {
                CustomAttributeArgument::String(self.parser.read_ser_string()?)
            }
            _ => {
                return Err(NotSupported(format!(
                    "custom attribute serialization type 0x{tag:02X}"
                )))
            }
        })
    }

    fn parse_named_argument(&mut self) -> Result<CustomAttributeNamedArgument> {
        let kind = self.parser.read_le::<u8>()?;
        let is_field = match kind {
            SERIALIZATION_TYPE::FIELD => true,
            SERIALIZATION_TYPE::PROPERTY => false,
            _ => {
                return Err(malformed_error!(
                    "Invalid named argument kind - 0x{:02X}",
                    kind
                ))
            }
        };

        let tag = self.parser.read_le::<u8>()?;
        let Some(name) = self.parser.read_ser_string()? else {
            return Err(malformed_error!("Named argument without a name"));
        };

        let value = if tag == SERIALIZATION_TYPE::SZARRAY {
            let element_tag = self.parser.read_le::<u8>()?;
            let count = self.parser.read_le::<u32>()?;
            if count == 0xFFFF_FFFF {
                CustomAttributeArgument::Array(None)
            } else {
                let mut elements = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    elements.push(self.parse_by_tag(element_tag)?);
                }
                CustomAttributeArgument::Array(Some(elements))
            }
        } else {
            self.parse_by_tag(tag)?
        };

        Ok(CustomAttributeNamedArgument {
            is_field,
            name,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::customattributes::encode_custom_attribute_value;

    fn ctor(params: Vec<TypeSignature>) -> SignatureMethod {
        SignatureMethod::instance(TypeSignature::Void, params)
    }

    #[test]
    fn test_parse_empty_blob() {
        let value = parse_custom_attribute_blob(&[], &ctor(vec![])).unwrap();
        assert!(value.fixed_args.is_empty());
        assert!(value.named_args.is_empty());
    }

    #[test]
    fn test_parse_invalid_prolog() {
        let result = parse_custom_attribute_blob(&[0x00, 0x01], &ctor(vec![]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_primitive_arguments() {
        let blob = [
            0x01, 0x00, // prolog
            0x01, // bool true
            0x41, 0x00, // 'A'
            0xFE, 0xFF, 0xFF, 0xFF, // -2
            0x03, b'a', b'b', b'c', // "abc"
            0xFF, // null string
            0x00, 0x00, // no named arguments
        ];
        let value = parse_custom_attribute_blob(
            &blob,
            &ctor(vec![
                TypeSignature::Boolean,
                TypeSignature::Char,
                TypeSignature::I4,
                TypeSignature::String,
                TypeSignature::String,
            ]),
        )
        .unwrap();

        assert_eq!(
            value.fixed_args,
            vec![
                CustomAttributeArgument::Bool(true),
                CustomAttributeArgument::Char('A'),
                CustomAttributeArgument::I4(-2),
                CustomAttributeArgument::String(Some("abc".to_string())),
                CustomAttributeArgument::String(None),
            ]
        );
    }

    #[test]
    fn test_parse_array_and_named_arguments() {
        let blob = [
            0x01, 0x00, // prolog
            0x02, 0x00, 0x00, 0x00, 0x07, 0x09, // u1[] { 7, 9 }
            0x01, 0x00, // one named argument
            0x54, 0x08, 0x05, b'V', b'a', b'l', b'u', b'e', 0x2A, 0x00, 0x00, 0x00,
        ];
        let value = parse_custom_attribute_blob(
            &blob,
            &ctor(vec![TypeSignature::sz_array(TypeSignature::U1)]),
        )
        .unwrap();

        assert_eq!(
            value.fixed_args,
            vec![CustomAttributeArgument::Array(Some(vec![
                CustomAttributeArgument::U1(7),
                CustomAttributeArgument::U1(9),
            ]))]
        );
        assert_eq!(value.named_args.len(), 1);
        assert!(!value.named_args[0].is_field);
        assert_eq!(value.named_args[0].name, "Value");
        assert_eq!(value.named_args[0].value, CustomAttributeArgument::I4(42));
    }

    #[test]
    fn test_unsupported_argument() {
        let blob = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        let result = parse_custom_attribute_blob(
            &blob,
            &ctor(vec![TypeSignature::ValueType(crate::metadata::token::Token::new(
                0x0100_0001,
            ))]),
        );
        assert!(matches!(result, Err(NotSupported(_))));
    }

    #[test]
    fn test_encoder_output_parses() {
        let args = vec![
            CustomAttributeArgument::I4(16),
            CustomAttributeArgument::String(Some("x".to_string())),
        ];
        let blob = encode_custom_attribute_value(&args).unwrap();
        let value = parse_custom_attribute_blob(
            &blob,
            &ctor(vec![TypeSignature::I4, TypeSignature::String]),
        )
        .unwrap();
        assert_eq!(value.fixed_args, args);
    }
}
