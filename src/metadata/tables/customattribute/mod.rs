mod raw;

pub use raw::*;
