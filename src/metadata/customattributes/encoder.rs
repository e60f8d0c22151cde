use crate::{
    file::io::write_le,
    metadata::{customattributes::CustomAttributeArgument, signatures::write_compressed_uint},
    Result,
};

/// Encode fixed arguments into a custom attribute value blob without named arguments.
///
/// # Errors
/// Returns an error if a string is too long to be length-prefixed.
pub fn encode_custom_attribute_value(fixed_args: &[CustomAttributeArgument]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_le(&mut buffer, 0x0001_u16);

    for argument in fixed_args {
        encode_argument(argument, &mut buffer)?;
    }

    write_le(&mut buffer, 0_u16);
    Ok(buffer)
}

fn encode_argument(argument: &CustomAttributeArgument, buffer: &mut Vec<u8>) -> Result<()> {
    match argument {
        CustomAttributeArgument::Bool(value) => buffer.push(u8::from(*value)),
        CustomAttributeArgument::Char(value) => {
            let Ok(value) = u16::try_from(u32::from(*value)) else {
                return Err(malformed_error!("Char {} does not fit 16 bits", value));
            };
            write_le(buffer, value);
        }
        CustomAttributeArgument::I1(value) => write_le(buffer, *value),
        CustomAttributeArgument::U1(value) => write_le(buffer, *value),
        CustomAttributeArgument::I2(value) => write_le(buffer, *value),
        CustomAttributeArgument::U2(value) => write_le(buffer, *value),
        CustomAttributeArgument::I4(value) => write_le(buffer, *value),
        CustomAttributeArgument::U4(value) => write_le(buffer, *value),
        CustomAttributeArgument::I8(value) => write_le(buffer, *value),
        CustomAttributeArgument::U8(value) => write_le(buffer, *value),
        CustomAttributeArgument::R4(value) => write_le(buffer, *value),
        CustomAttributeArgument::R8(value) => write_le(buffer, *value),
        CustomAttributeArgument::String(None) => buffer.push(0xFF),
        CustomAttributeArgument::String(Some(value)) => {
            let Ok(len) = u32::try_from(value.len()) else {
                return Err(malformed_error!("String argument is too long"));
            };
            if len > 0x1FFF_FFFF {
                return Err(malformed_error!("String argument is too long"));
            }
            write_compressed_uint(buffer, len);
            buffer.extend_from_slice(value.as_bytes());
        }
        CustomAttributeArgument::Array(None) => write_le(buffer, 0xFFFF_FFFF_u32),
        CustomAttributeArgument::Array(Some(elements)) => {
            let Ok(len) = u32::try_from(elements.len()) else {
                return Err(malformed_error!("Array argument is too long"));
            };
            write_le(buffer, len);
            for element in elements {
                encode_argument(element, buffer)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_array_length_blob() {
        let blob = encode_custom_attribute_value(&[CustomAttributeArgument::I4(4)]).unwrap();
        assert_eq!(blob, vec![0x01, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn null_values() {
        let blob = encode_custom_attribute_value(&[
            CustomAttributeArgument::String(None),
            CustomAttributeArgument::Array(None),
        ])
        .unwrap();
        assert_eq!(
            blob,
            vec![0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]
        );
    }
}
