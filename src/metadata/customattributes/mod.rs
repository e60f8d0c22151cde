//! Custom attribute value blobs (§II.23.3).
//!
//! The type system looks at custom attributes for two things: finding marker attributes by
//! namespace and name, which needs no value decoding, and reading constructor arguments such
//! as the length of an `InlineArrayAttribute`. [`parse_custom_attribute_blob`] decodes fixed
//! arguments of primitive, string and single dimension array types plus named arguments;
//! enum and `System.Type` arguments are not decoded.
//!
//! [`encode_custom_attribute_value`] writes the same format for metadata assembled in memory.
//!
//! # Examples
//!
//! ```rust
//! use typescope::metadata::{
//!     customattributes::{parse_custom_attribute_blob, CustomAttributeArgument},
//!     signatures::{SignatureMethod, TypeSignature},
//! };
//!
//! let ctor = SignatureMethod::instance(TypeSignature::Void, vec![TypeSignature::I4]);
//! let blob = &[0x01, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
//! let value = parse_custom_attribute_blob(blob, &ctor)?;
//! assert_eq!(value.fixed_args, vec![CustomAttributeArgument::I4(8)]);
//! # Ok::<(), typescope::Error>(())
//! ```

mod encoder;
mod parser;
mod types;

pub use encoder::*;
pub use parser::*;
pub use types::*;
