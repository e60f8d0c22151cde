//! Metadata heaps.
//!
//! Only the two heaps this layer decodes itself are modelled:
//!
//! - **`#Strings`** ([`Strings`]) - NUL-terminated UTF-8 identifiers (type, namespace and
//!   member names). The first entry is always the empty string.
//! - **`#Blob`** ([`Blob`]) - length-prefixed binary entries holding signatures and custom
//!   attribute values.
//!
//! Both come with a builder laying out a heap in the on-disk format, used when metadata is
//! assembled in memory through [`crate::metadata::builder::MetadataBuilder`].

mod blob;
mod strings;

pub use blob::{Blob, BlobBuilder};
pub use strings::{Strings, StringsBuilder};
