//! Name based type hashing.
//!
//! Hash codes are computed over UTF-16 code units of type names so that they agree with the
//! values a managed runtime computes for the same types. All arithmetic wraps.
//!
//! Combining functions exist for every way a type is constructed from others: nesting,
//! generic instantiation, arrays, by-refs and pointers. The hash of a constructed type is a
//! pure function of the hashes of its parts, so equal types hash equally across modules and
//! sessions.

const SEED: u32 = 0x6DA3_B944;

/// Incremental name hasher.
///
/// Appending `"System"`, `"."` and `"Object"` produces the same hash as hashing
/// `"System.Object"` in one go.
///
/// # Examples
///
/// ```rust
/// use typescope::metadata::typesystem::hash::{compute_name_hash_code, HashCodeBuilder};
///
/// let mut builder = HashCodeBuilder::new("System");
/// builder.append(".");
/// builder.append("Object");
/// assert_eq!(builder.to_hash_code(), compute_name_hash_code("System.Object"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HashCodeBuilder {
    hash1: u32,
    hash2: u32,
    characters_hashed: usize,
}

impl HashCodeBuilder {
    /// Start a hash with `seed` appended
    #[must_use]
    pub fn new(seed: &str) -> Self {
        let mut builder = HashCodeBuilder {
            hash1: SEED,
            hash2: 0,
            characters_hashed: 0,
        };
        builder.append(seed);
        builder
    }

    /// Append the UTF-16 code units of `value`
    pub fn append(&mut self, value: &str) {
        for unit in value.encode_utf16() {
            let unit = u32::from(unit);
            // Even positions feed the first lane, odd positions the second
            if self.characters_hashed & 1 == 0 {
                self.hash1 = self.hash1.wrapping_add(self.hash1.rotate_left(5)) ^ unit;
            } else {
                self.hash2 = self.hash2.wrapping_add(self.hash2.rotate_left(5)) ^ unit;
            }
            self.characters_hashed += 1;
        }
    }

    /// Finish the hash
    #[must_use]
    pub fn to_hash_code(&self) -> u32 {
        let hash1 = self.hash1.wrapping_add(self.hash1.rotate_left(8));
        let hash2 = self.hash2.wrapping_add(self.hash2.rotate_left(8));
        hash1 ^ hash2
    }
}

/// Hash of a single name
#[must_use]
pub fn compute_name_hash_code(name: &str) -> u32 {
    HashCodeBuilder::new(name).to_hash_code()
}

/// Hash of a type nested in a type hashing to `enclosing`
#[must_use]
pub fn compute_nested_type_hash_code(enclosing: u32, nested_name_hash: u32) -> u32 {
    enclosing.wrapping_add(enclosing.rotate_left(11)) ^ nested_name_hash
}

/// Hash of a generic definition instantiated over arguments with the given hashes
#[must_use]
pub fn compute_generic_instance_hash_code(
    definition: u32,
    arguments: impl IntoIterator<Item = u32>,
) -> u32 {
    let mut hash = definition;
    for argument in arguments {
        hash = hash.wrapping_add(hash.rotate_left(13)) ^ argument;
    }
    hash.wrapping_add(hash.rotate_left(15))
}

/// Hash of an array over an element hashing to `element`; `rank` is `None` for a single
/// dimension, zero based array.
///
/// Arrays hash like an instantiation of `System.Array`1` (or `System.MDArrayRank{rank}`1`)
/// over their element.
#[must_use]
pub fn compute_array_type_hash_code(element: u32, rank: Option<u32>) -> u32 {
    let mut hash = match rank {
        None => compute_name_hash_code("System.Array`1"),
        Some(rank) => compute_name_hash_code(&format!("System.MDArrayRank{rank}`1")),
    };
    hash = hash.wrapping_add(hash.rotate_left(13)) ^ element;
    hash.wrapping_add(hash.rotate_left(15))
}

/// Hash of an unmanaged pointer to a type hashing to `pointee`
#[must_use]
pub fn compute_pointer_type_hash_code(pointee: u32) -> u32 {
    pointee.wrapping_add(pointee.rotate_left(5)) ^ 0x12D0
}

/// Hash of a managed reference to a type hashing to `parameter`
#[must_use]
pub fn compute_byref_type_hash_code(parameter: u32) -> u32 {
    parameter.wrapping_add(parameter.rotate_left(7)) ^ 0x4C85
}

/// Hash of the signature variable `!index` (`!!index` when `is_method`)
#[must_use]
pub fn compute_signature_variable_hash_code(index: u32, is_method: bool) -> u32 {
    let base = if is_method { 0x5487_2645 } else { 0x2A8F_6C51 };
    index.wrapping_mul(0x0782_2381).wrapping_add(base)
}
