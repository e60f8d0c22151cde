use crate::metadata::typesystem::TypeRc;

/// The shape a parameterized type gives its parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterizedKind {
    /// `T[]`
    SzArray,
    /// `T[,]` and friends, with the rank
    Array(u32),
    /// `T&`
    ByRef,
    /// `T*`
    Pointer,
}

/// A type constructed from a single parameter type: arrays, by-refs and pointers
pub struct ParameterizedType {
    kind: ParameterizedKind,
    parameter: TypeRc,
}

impl ParameterizedType {
    pub(crate) fn new(kind: ParameterizedKind, parameter: TypeRc) -> Self {
        ParameterizedType { kind, parameter }
    }

    /// The shape
    #[must_use]
    pub fn kind(&self) -> ParameterizedKind {
        self.kind
    }

    /// The element, referenced or pointed to type
    #[must_use]
    pub fn parameter_type(&self) -> &TypeRc {
        &self.parameter
    }

    /// Number of dimensions of an array, `None` for by-refs and pointers
    #[must_use]
    pub fn rank(&self) -> Option<u32> {
        match self.kind {
            ParameterizedKind::SzArray => Some(1),
            ParameterizedKind::Array(rank) => Some(rank),
            ParameterizedKind::ByRef | ParameterizedKind::Pointer => None,
        }
    }

    /// Name suffix appended to the parameter's name
    pub(crate) fn suffix(&self) -> String {
        match self.kind {
            ParameterizedKind::SzArray => "[]".to_string(),
            ParameterizedKind::Array(1) => "[*]".to_string(),
            ParameterizedKind::Array(rank) => {
                format!("[{}]", ",".repeat(rank.saturating_sub(1) as usize))
            }
            ParameterizedKind::ByRef => "&".to_string(),
            ParameterizedKind::Pointer => "*".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(ParameterizedKind::Array(2), ParameterizedKind::Array(2));
        assert_ne!(ParameterizedKind::Array(2), ParameterizedKind::Array(3));
        assert_ne!(ParameterizedKind::SzArray, ParameterizedKind::Array(1));
    }
}
