//! Bounds-checked binary reading primitives shared by the metadata heaps and the
//! signature codecs.
//!
//! - [`io`] - endian-aware reads and writes of primitive values
//! - [`parser`] - a cursor over a byte slice with ECMA-335 compressed integer support

pub mod io;
pub mod parser;
