//! String Heap (`#Strings`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#Strings` heap, which stores identifier strings in UTF-8
//! encoding, and [`StringsBuilder`] which lays out a heap in the same format.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{collections::HashMap, ffi::CStr};

use crate::{Error::OutOfBounds, Result};

/// '#Strings' hold the identifiers referenced from the metadata tables: type names, namespaces,
/// member names, ...
///
/// # Examples
///
/// ```rust
/// use typescope::metadata::streams::Strings;
/// let data = &[0u8, b'H', b'e', b'l', b'l', b'o', 0u8];
/// let strings = Strings::from(data).unwrap();
/// assert_eq!(strings.get(1).unwrap(), "Hello");
/// assert_eq!(strings.get(0).unwrap(), "");
/// ```
#[derive(Clone, Copy)]
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` view over `data`.
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the mandatory NUL entry.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #String heap is empty"));
        }

        Ok(Strings { data })
    }

    /// Get the string starting at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an index past the heap, or a malformed
    /// error for an unterminated or non UTF-8 entry.
    pub fn get(&self, index: u32) -> Result<&'a str> {
        let index = index as usize;
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => match result.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }

    /// Raw heap bytes
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// Incrementally lays out a `#Strings` heap, deduplicating identical entries.
pub struct StringsBuilder {
    data: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringsBuilder {
    /// Create a heap holding only the mandatory empty string at index 0
    #[must_use]
    pub fn new() -> Self {
        StringsBuilder {
            data: vec![0],
            offsets: HashMap::new(),
        }
    }

    /// Add `value`, returning its heap index. The empty string always maps to index 0.
    pub fn add(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }

        if let Some(offset) = self.offsets.get(value) {
            return *offset;
        }

        #[allow(clippy::cast_possible_truncation)]
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        self.offsets.insert(value.to_string(), offset);
        offset
    }

    /// Index of `value` if it was added before
    #[must_use]
    pub fn index_of(&self, value: &str) -> Option<u32> {
        if value.is_empty() {
            return Some(0);
        }
        self.offsets.get(value).copied()
    }

    /// Consume the builder and return the heap bytes
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

impl Default for StringsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data : [u8; 33] = [
            0x00,
            0x3c, 0x4d, 0x61, 0x69, 0x6e, 0x3e, 0x24, 0x00,
            0x43, 0x5f, 0x53, 0x68, 0x61, 0x72, 0x70, 0x5f, 0x50, 0x4f, 0x43, 0x5f, 0x31, 0x00,
            0x3c, 0x4d, 0x6f, 0x64, 0x75, 0x6c, 0x65, 0x3e, 0x00,
            0x00,
        ];

        let str_view = Strings::from(&data).unwrap();

        assert_eq!(str_view.get(1).unwrap(), "<Main>$");
        assert_eq!(str_view.get(9).unwrap(), "C_Sharp_POC_1");
        assert_eq!(str_view.get(23).unwrap(), "<Module>");
        // Pointing into the middle of an entry yields its suffix
        assert_eq!(str_view.get(26).unwrap(), "dule>");
    }

    #[test]
    fn invalid_heaps() {
        assert!(Strings::from(&[]).is_err());
        assert!(Strings::from(&[b'A', 0]).is_err());

        let unterminated = [0u8, b'A', b'B'];
        let strings = Strings::from(&unterminated).unwrap();
        assert!(strings.get(1).is_err());
        assert!(matches!(strings.get(3), Err(OutOfBounds)));
    }

    #[test]
    fn builder_deduplicates() {
        let mut builder = StringsBuilder::new();
        let system = builder.add("System");
        let object = builder.add("Object");
        assert_eq!(builder.add("System"), system);
        assert_eq!(builder.add(""), 0);
        assert_eq!(builder.index_of("Object"), Some(object));
        assert_eq!(builder.index_of("Missing"), None);

        let heap = builder.finish();
        let strings = Strings::from(&heap).unwrap();
        assert_eq!(strings.get(system).unwrap(), "System");
        assert_eq!(strings.get(object).unwrap(), "Object");
    }
}
