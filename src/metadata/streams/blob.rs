//! Blob Heap (`#Blob`) for .NET Metadata
//!
//! Every entry is a compressed length followed by that many bytes. Signatures and custom
//! attribute values referenced by the metadata tables live here.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::collections::HashMap;

use crate::{
    file::parser::Parser, metadata::signatures::write_compressed_uint, Error::OutOfBounds,
    Result,
};

/// A read-only view over a `#Blob` heap.
///
/// # Examples
///
/// ```rust
/// use typescope::metadata::streams::Blob;
/// let data = &[0u8, 0x03, 0x0A, 0x0B, 0x0C];
/// let blob = Blob::from(data).unwrap();
/// assert_eq!(blob.get(1).unwrap(), &[0x0A, 0x0B, 0x0C]);
/// ```
#[derive(Clone, Copy)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` view over `data`.
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the mandatory empty entry.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the blob entry starting at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the entry runs past the heap, or a malformed
    /// error for an invalid length prefix.
    pub fn get(&self, index: u32) -> Result<&'a [u8]> {
        let index = index as usize;
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;

        let Some(data_start) = index.checked_add(parser.pos()) else {
            return Err(OutOfBounds);
        };

        let Some(data_end) = data_start.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if data_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[data_start..data_end])
    }
}

/// Incrementally lays out a `#Blob` heap, deduplicating identical entries.
pub struct BlobBuilder {
    data: Vec<u8>,
    offsets: HashMap<Vec<u8>, u32>,
}

impl BlobBuilder {
    /// Create a heap holding only the mandatory empty entry at index 0
    #[must_use]
    pub fn new() -> Self {
        BlobBuilder {
            data: vec![0],
            offsets: HashMap::new(),
        }
    }

    /// Add `value`, returning its heap index. The empty blob always maps to index 0.
    pub fn add(&mut self, value: &[u8]) -> u32 {
        if value.is_empty() {
            return 0;
        }

        if let Some(offset) = self.offsets.get(value) {
            return *offset;
        }

        #[allow(clippy::cast_possible_truncation)]
        let offset = self.data.len() as u32;
        #[allow(clippy::cast_possible_truncation)]
        write_compressed_uint(&mut self.data, value.len() as u32);
        self.data.extend_from_slice(value);
        self.offsets.insert(value.to_vec(), offset);
        offset
    }

    /// Consume the builder and return the heap bytes
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

impl Default for BlobBuilder {
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
        let data = {
            let mut data = vec![0xCC; 400];
            /* i - 0    - should always be 0    */ data[0]          = 0b_00000000_u8;
            /* i - 1    - len 10                */ data[1]          = 0b_00001010_u8;
            /* i - 1    - len 10                */ data[2..12]      .copy_from_slice(&[0x0A; 10]);
            /* i - 12   - len 5                 */ data[12]         = 0b_00000101_u8;
            /* i - 12   - len 5                 */ data[13..18]     .copy_from_slice(&[0xAB; 5]);
            /* i - 18   - invalid length        */ data[18]         = 0b_11111111_u8;
            /* i - 19   - len 257               */ data[19]         = 0b_10000001_u8;
            /* i - 19   - len 257               */ data[20]         = 0b_00000001_u8;
            /* i - 19   - len 257               */ data[21..278]    .copy_from_slice(&[0xBA; 257]);
            /* i - 278  - len 4096, too long    */ data[278]        = 0b_10010000_u8;
            /* i - 278  - len 4096, too long    */ data[279]        = 0b_00000000_u8;
            data
        };

        let blob = Blob::from(&data).unwrap();

        assert_eq!(blob.get(0).unwrap().len(), 0);
        assert_eq!(blob.get(1).unwrap(), &[0x0A; 10]);
        assert_eq!(blob.get(12).unwrap(), &[0xAB; 5]);
        assert!(blob.get(18).is_err());
        assert_eq!(blob.get(19).unwrap(), &[0xBA; 257]);
        assert!(matches!(blob.get(278), Err(OutOfBounds)));
        assert!(matches!(blob.get(400), Err(OutOfBounds)));
    }

    #[test]
    fn builder_layout() {
        let mut builder = BlobBuilder::new();
        let first = builder.add(&[0x20, 0x00, 0x01]);
        let large = builder.add(&[0x55; 200]);
        assert_eq!(builder.add(&[0x20, 0x00, 0x01]), first);
        assert_eq!(builder.add(&[]), 0);

        let heap = builder.finish();
        let blob = Blob::from(&heap).unwrap();
        assert_eq!(blob.get(first).unwrap(), &[0x20, 0x00, 0x01]);
        assert_eq!(blob.get(large).unwrap(), &[0x55; 200]);
    }
}
