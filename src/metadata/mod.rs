//! Metadata access and the type system built on top of it.
//!
//! # Key Components
//!
//! - [`token`] - Metadata tokens addressing table rows
//! - [`tables`] - Raw rows of the tables the type system reads
//! - [`streams`] - `#Strings` and `#Blob` heaps
//! - [`signatures`] - Signature blob decoding and encoding
//! - [`customattributes`] - Custom attribute value blobs
//! - [`reader`] - The [`reader::MetadataReader`] collaborator trait and its in-memory tables
//! - [`builder`] - Assembling metadata in memory
//! - [`typesystem`] - Lazy, canonical type descriptors resolved from metadata

pub mod builder;
pub mod customattributes;
pub mod reader;
pub mod signatures;
pub mod streams;
pub mod tables;
/// Metadata tokens addressing table rows
pub mod token;
pub mod typesystem;
