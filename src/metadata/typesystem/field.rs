use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock, Weak},
};

use crate::{
    metadata::{
        tables::{FieldAttributes, FieldRaw},
        token::Token,
        typesystem::{Instantiation, MemberSource, ModuleDesc, TypeRc},
    },
    Error::{Dropped, TypeNotFound},
    Result,
};

/// A shared, canonical field descriptor
pub type FieldRc = Arc<FieldDesc>;

enum FieldSource {
    Metadata {
        module: Weak<ModuleDesc>,
        token: Token,
        flags: u32,
        name_index: u32,
        signature_index: u32,
    },
    OnInstantiatedType {
        definition: FieldRc,
    },
}

/// A field of a type.
///
/// Interned like [`crate::metadata::typesystem::MethodDesc`]: metadata fields by their
/// module, views on instantiated types by the context.
pub struct FieldDesc {
    owner: TypeRc,
    source: FieldSource,
    name: OnceLock<String>,
    field_type: OnceLock<TypeRc>,
}

impl FieldDesc {
    pub(crate) fn new_metadata(module: Weak<ModuleDesc>, row: &FieldRaw, owner: TypeRc) -> Self {
        FieldDesc {
            owner,
            source: FieldSource::Metadata {
                module,
                token: row.token,
                flags: row.flags,
                name_index: row.name,
                signature_index: row.signature,
            },
            name: OnceLock::new(),
            field_type: OnceLock::new(),
        }
    }

    pub(crate) fn new_on_instantiated_type(definition: FieldRc, owner: TypeRc) -> Self {
        FieldDesc {
            owner,
            source: FieldSource::OnInstantiatedType { definition },
            name: OnceLock::new(),
            field_type: OnceLock::new(),
        }
    }

    /// The `Field` token, of the definition for views on instantiated types
    #[must_use]
    pub fn token(&self) -> Token {
        match &self.source {
            FieldSource::Metadata { token, .. } => *token,
            FieldSource::OnInstantiatedType { definition } => definition.token(),
        }
    }

    /// The type declaring this field
    #[must_use]
    pub fn owning_type(&self) -> &TypeRc {
        &self.owner
    }

    /// The module defining the field's metadata.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] once the module is gone.
    pub fn module(&self) -> Result<Arc<ModuleDesc>> {
        match &self.source {
            FieldSource::Metadata { module, .. } => module.upgrade().ok_or(Dropped("module")),
            FieldSource::OnInstantiatedType { definition } => definition.module(),
        }
    }

    /// # Errors
    /// Returns an error if the name cannot be decoded.
    pub fn name(&self) -> Result<&str> {
        match &self.source {
            FieldSource::Metadata { name_index, .. } => {
                if let Some(name) = self.name.get() {
                    return Ok(name);
                }

                let name = self.module()?.reader().strings()?.get(*name_index)?.to_string();
                Ok(self.name.get_or_init(|| name))
            }
            FieldSource::OnInstantiatedType { definition } => definition.name(),
        }
    }

    /// The declared type, with the owner's type arguments substituted for views on
    /// instantiated types.
    ///
    /// # Errors
    /// Returns an error if the signature blob is malformed or names a type that cannot be
    /// resolved.
    pub fn field_type(&self) -> Result<&TypeRc> {
        if let Some(field_type) = self.field_type.get() {
            return Ok(field_type);
        }

        let field_type = match &self.source {
            FieldSource::Metadata {
                signature_index, ..
            } => {
                let module = self.module()?;
                let blob = module.reader().blobs()?.get(*signature_index)?;
                let parsed = module.parse_field_signature(blob)?;
                module.resolve_type_signature(&parsed.base)?
            }
            FieldSource::OnInstantiatedType { definition } => definition
                .field_type()?
                .instantiate_signature(&self.owner.instantiation()?, &Instantiation::empty())?,
        };
        Ok(self.field_type.get_or_init(|| field_type))
    }

    /// `FieldAttributes` of the row
    #[must_use]
    pub fn attributes(&self) -> u32 {
        match &self.source {
            FieldSource::Metadata { flags, .. } => *flags,
            FieldSource::OnInstantiatedType { definition } => definition.attributes(),
        }
    }

    /// Returns true for static fields
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.attributes() & FieldAttributes::STATIC != 0
    }

    /// Returns true for compile time constants
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.attributes() & FieldAttributes::LITERAL != 0
    }

    /// Returns true for fields only assignable in a constructor
    #[must_use]
    pub fn is_init_only(&self) -> bool {
        self.attributes() & FieldAttributes::INIT_ONLY != 0
    }

    /// Returns true if a custom attribute of type `namespace.name` is applied to the field.
    ///
    /// # Errors
    /// Returns an error if an attribute row cannot be read.
    pub fn has_custom_attribute(&self, namespace: &str, name: &str) -> Result<bool> {
        self.module()?
            .has_custom_attribute(self.token(), namespace, name)
    }
}

impl PartialEq for FieldDesc {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for FieldDesc {}

impl Hash for FieldDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Debug for FieldDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldDesc({}::{})",
            self.owner,
            self.name().unwrap_or("<unresolved>")
        )
    }
}

/// Lazy sequence of the fields of a type, optionally restricted to one name
pub struct Fields {
    source: Option<MemberSource>,
    handles: Vec<Token>,
    next: usize,
    name: Option<String>,
}

impl Fields {
    pub(crate) fn new(source: Option<MemberSource>, name: Option<String>) -> Result<Self> {
        let handles = match &source {
            Some(source) => source.field_handles()?,
            None => Vec::new(),
        };

        Ok(Fields {
            source,
            handles,
            next: 0,
            name,
        })
    }

    fn accepts(&self, source: &MemberSource, token: Token) -> Result<bool> {
        let Some(name) = &self.name else {
            return Ok(true);
        };

        let reader = source.module.reader();
        let row = reader.field(token).ok_or(TypeNotFound(token))?;
        Ok(reader.strings()?.get(row.name)? == name)
    }
}

impl Iterator for Fields {
    type Item = Result<FieldRc>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_ref()?;

        while let Some(&handle) = self.handles.get(self.next) {
            self.next += 1;
            match self.accepts(source, handle) {
                Ok(true) => return Some(source.field(handle)),
                Ok(false) => {}
                Err(error) => return Some(Err(error)),
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.handles.len().saturating_sub(self.next)))
    }
}
