use std::sync::{Arc, OnceLock, Weak};

use tracing::debug;

use crate::{
    metadata::{
        customattributes::CustomAttributeArgument,
        tables::{TableId, TypeAttributes, TypeDefRaw},
        token::Token,
        typesystem::{
            hash::{compute_name_hash_code, compute_nested_type_hash_code, HashCodeBuilder},
            AttributeFlags, Instantiation, ModuleDesc, TypeKind, TypeRc,
        },
    },
    Error::{self, Dropped, TypeNotFound},
    Result,
};

const COMPILER_SERVICES: &str = "System.Runtime.CompilerServices";

/// Resolution state of a base type.
///
/// `None` is a resolved answer: interfaces and `System.Object` have no base type.
#[derive(Debug, Clone)]
pub enum BaseTypeState {
    /// Not resolved yet
    Uninitialized,
    /// Resolved, the type has no base type
    None,
    /// Resolved to this type
    Resolved(TypeRc),
}

/// Packing and size of a type's instance layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassLayoutMetadata {
    /// Field alignment in bytes, 0 for the default
    pub packing_size: u16,
    /// Total size in bytes, 0 if unspecified
    pub size: u32,
}

/// How strings are marshalled for platform invokes on a type's methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PInvokeStringFormat {
    /// `ansi`
    AnsiClass,
    /// `unicode`
    UnicodeClass,
    /// `autochar`
    AutoClass,
    /// A custom, implementation specific format
    CustomFormatClass,
}

/// A type defined by a `TypeDef` row.
///
/// Strings and the base type are decoded on first use and cached. Caches are publish-once:
/// concurrent first callers may each compute the value, the first to publish wins and the
/// others adopt it.
pub struct MetadataType {
    module: Weak<ModuleDesc>,
    token: Token,
    flags: u32,
    name_index: u32,
    namespace_index: u32,
    extends: Token,
    name: OnceLock<String>,
    namespace: OnceLock<String>,
    base_type: OnceLock<Option<TypeRc>>,
    instantiation: OnceLock<Instantiation>,
}

impl MetadataType {
    pub(crate) fn new(module: Weak<ModuleDesc>, row: &TypeDefRaw) -> Self {
        MetadataType {
            module,
            token: row.token,
            flags: row.flags,
            name_index: row.type_name,
            namespace_index: row.type_namespace,
            extends: row.extends,
            name: OnceLock::new(),
            namespace: OnceLock::new(),
            base_type: OnceLock::new(),
            instantiation: OnceLock::new(),
        }
    }

    /// The `TypeDef` token
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// The defining module.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] once the module is gone.
    pub fn module(&self) -> Result<Arc<ModuleDesc>> {
        self.module.upgrade().ok_or(Dropped("module"))
    }

    /// `TypeAttributes` of the row
    #[must_use]
    pub fn attributes(&self) -> u32 {
        self.flags
    }

    /// The `extends` token of the row, nil without a base type
    #[must_use]
    pub fn extends(&self) -> Token {
        self.extends
    }

    /// # Errors
    /// Returns an error if the module is gone or the string heap entry is invalid.
    pub fn name(&self) -> Result<&str> {
        if let Some(name) = self.name.get() {
            return Ok(name);
        }

        let name = self.module()?.reader().strings()?.get(self.name_index)?.to_string();
        Ok(self.name.get_or_init(|| name))
    }

    /// # Errors
    /// Returns an error if the module is gone or the string heap entry is invalid.
    pub fn namespace(&self) -> Result<&str> {
        if let Some(namespace) = self.namespace.get() {
            return Ok(namespace);
        }

        let namespace = self
            .module()?
            .reader()
            .strings()?
            .get(self.namespace_index)?
            .to_string();
        Ok(self.namespace.get_or_init(|| namespace))
    }

    /// `Namespace.Name`, `Outer+Inner` for nested types
    ///
    /// # Errors
    /// Returns an error if a name cannot be decoded or the enclosing type resolved.
    pub fn full_name(&self) -> Result<String> {
        let name = self.name()?;
        if let Some(containing) = self.containing_type()? {
            return Ok(format!("{}+{name}", containing.full_name()?));
        }

        let namespace = self.namespace()?;
        if namespace.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{namespace}.{name}"))
        }
    }

    /// Returns true if the visibility bits mark a nested type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        (self.flags & TypeAttributes::VISIBILITY_MASK) > TypeAttributes::PUBLIC
    }

    /// Returns true if the interface semantics bit is set
    #[must_use]
    pub fn is_interface(&self) -> bool {
        (self.flags & TypeAttributes::CLASS_SEMANTICS_MASK) == TypeAttributes::INTERFACE
    }

    /// Returns true for abstract types and interfaces
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags & TypeAttributes::ABSTRACT != 0
    }

    /// Returns true if the type cannot be derived from
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags & TypeAttributes::SEALED != 0
    }

    /// Returns true if fields carry explicit offsets
    #[must_use]
    pub fn is_explicit_layout(&self) -> bool {
        self.flags & TypeAttributes::EXPLICIT_LAYOUT != 0
    }

    /// Returns true if fields are laid out in declaration order
    #[must_use]
    pub fn is_sequential_layout(&self) -> bool {
        self.flags & TypeAttributes::SEQUENTIAL_LAYOUT != 0
    }

    /// Returns true if the type initializer may run lazily
    #[must_use]
    pub fn is_before_field_init(&self) -> bool {
        self.flags & TypeAttributes::BEFORE_FIELD_INIT != 0
    }

    /// Returns true for `TypeDef` row 1, the `<Module>` type
    #[must_use]
    pub fn is_module_type(&self) -> bool {
        self.token == Token::from_parts(TableId::TypeDef, 1)
    }

    /// String marshalling format from the row flags
    #[must_use]
    pub fn pinvoke_string_format(&self) -> PInvokeStringFormat {
        match self.flags & TypeAttributes::STRING_FORMAT_MASK {
            TypeAttributes::UNICODE_CLASS => PInvokeStringFormat::UnicodeClass,
            TypeAttributes::AUTO_CLASS => PInvokeStringFormat::AutoClass,
            TypeAttributes::CUSTOM_FORMAT_CLASS => PInvokeStringFormat::CustomFormatClass,
            _ => PInvokeStringFormat::AnsiClass,
        }
    }

    /// Where base type resolution stands, without triggering it
    #[must_use]
    pub fn base_type_state(&self) -> BaseTypeState {
        match self.base_type.get() {
            None => BaseTypeState::Uninitialized,
            Some(None) => BaseTypeState::None,
            Some(Some(base)) => BaseTypeState::Resolved(base.clone()),
        }
    }

    /// The base type named by `extends`.
    ///
    /// A base given as a `TypeSpec`, e.g. `List<!0>`, has the type's own generic parameters
    /// substituted for its signature variables.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeLoad`] if the base cannot be resolved or is not a class
    /// or instantiated class. Failures are not cached.
    pub fn base_type(&self) -> Result<Option<TypeRc>> {
        if let Some(base) = self.base_type.get() {
            return Ok(base.clone());
        }

        let base = self.resolve_base_type()?;
        Ok(self.base_type.get_or_init(|| base).clone())
    }

    fn resolve_base_type(&self) -> Result<Option<TypeRc>> {
        let Some(open) = self.open_base_type()? else {
            return Ok(None);
        };

        if self.extends.is_table(TableId::TypeSpec) {
            let own_parameters = self.instantiation()?;
            return open
                .instantiate_signature(own_parameters, &Instantiation::empty())
                .map(Some);
        }

        Ok(Some(open))
    }

    /// The base type as written in the metadata, signature variables not yet substituted.
    ///
    /// # Errors
    /// See [`MetadataType::base_type`].
    pub fn open_base_type(&self) -> Result<Option<TypeRc>> {
        if self.extends.is_null() {
            return Ok(None);
        }

        let module = self.module()?;
        let resolved = match module.get_type(self.extends) {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                let reason = format!("base type {} cannot be resolved", self.extends);
                return Err(self.load_error(&module, reason));
            }
            Err(error) if error.is_load_error() || error.is_configuration_error() => {
                return Err(error)
            }
            Err(error) => {
                let reason = format!("base type {} cannot be resolved: {error}", self.extends);
                return Err(self.load_error(&module, reason));
            }
        };

        if !matches!(
            resolved.kind(),
            TypeKind::Metadata(_) | TypeKind::Instantiated(_)
        ) {
            let reason = format!("base type {resolved} is not a class");
            return Err(self.load_error(&module, reason));
        }

        Ok(Some(resolved))
    }

    /// The generic parameters, empty for non-generic types.
    ///
    /// # Errors
    /// Returns an error if a generic parameter row cannot be resolved.
    pub fn instantiation(&self) -> Result<&Instantiation> {
        if let Some(instantiation) = self.instantiation.get() {
            return Ok(instantiation);
        }

        let parameters = self.module()?.generic_parameters(self.token)?;
        Ok(self.instantiation.get_or_init(|| parameters))
    }

    /// The enclosing type of a nested type.
    ///
    /// # Errors
    /// Returns an error for a nested type without a `NestedClass` row, or if the enclosing
    /// type cannot be resolved. A nesting chain that loops back on itself or runs deeper
    /// than `max_inheritance_depth` is [`Error::RecursionLimit`].
    pub fn containing_type(&self) -> Result<Option<TypeRc>> {
        if !self.is_nested() {
            return Ok(None);
        }

        let module = self.module()?;
        let reader = module.reader();
        let Some(enclosing) = reader.enclosing_type(self.token) else {
            return Err(malformed_error!(
                "Nested type {} has no enclosing type",
                self.token
            ));
        };

        // Names and hashes recurse through the enclosing types
        let max_depth = module.context()?.options().max_inheritance_depth;
        let mut current = enclosing;
        let mut depth = 0;
        loop {
            if current == self.token || depth >= max_depth {
                return Err(Error::RecursionLimit(max_depth));
            }
            match reader.enclosing_type(current) {
                Some(next) => current = next,
                None => break,
            }
            depth += 1;
        }

        module.get_type(enclosing)
    }

    /// Types nested directly in this type, in `NestedClass` order.
    ///
    /// # Errors
    /// Returns an error if a nested type cannot be resolved.
    pub fn get_nested_types(&self) -> Result<Vec<TypeRc>> {
        let module = self.module()?;
        module
            .reader()
            .nested_types(self.token)
            .iter()
            .filter_map(|nested| module.get_type(*nested).transpose())
            .collect()
    }

    /// Find a nested type by `Namespace.Name` or, without a namespace, its simple name.
    ///
    /// # Errors
    /// Returns an error if a nested type row cannot be read.
    pub fn get_nested_type(&self, name: &str) -> Result<Option<TypeRc>> {
        let module = self.module()?;
        let reader = module.reader();
        let strings = reader.strings()?;

        for nested in reader.nested_types(self.token) {
            let row = reader.type_def(*nested).ok_or(TypeNotFound(*nested))?;
            let nested_name = strings.get(row.type_name)?;
            let nested_namespace = strings.get(row.type_namespace)?;

            let matched = if nested_namespace.is_empty() {
                nested_name == name
            } else {
                name.strip_prefix(nested_namespace)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(|rest| rest == nested_name)
            };

            if matched {
                return module.get_type(*nested);
            }
        }

        Ok(None)
    }

    /// # Errors
    /// Returns an error if an attribute row cannot be read.
    pub fn has_custom_attribute(&self, namespace: &str, name: &str) -> Result<bool> {
        self.module()?
            .has_custom_attribute(self.token, namespace, name)
    }

    /// Scan the custom attributes once for the marker attributes
    pub(crate) fn scan_attribute_flags(&self, is_value_type: bool) -> Result<AttributeFlags> {
        let module = self.module()?;
        let mut flags = AttributeFlags::empty();

        for attribute in module.reader().custom_attributes(self.token) {
            let Some((namespace, name)) = module.attribute_namespace_and_name(attribute)? else {
                continue;
            };
            if namespace != COMPILER_SERVICES {
                continue;
            }

            match name {
                "IsByRefLikeAttribute" if is_value_type => flags |= AttributeFlags::IS_BYREF_LIKE,
                "IntrinsicAttribute" => flags |= AttributeFlags::IS_INTRINSIC,
                "InlineArrayAttribute" if is_value_type => {
                    flags |= AttributeFlags::IS_INLINE_ARRAY;
                }
                _ => {}
            }
        }

        Ok(flags)
    }

    /// The `int32` argument of `InlineArrayAttribute`, 0 if it is not an `int32`
    pub(crate) fn inline_array_length(&self) -> Result<i32> {
        let module = self.module()?;
        let Some(attribute) =
            module.find_custom_attribute(self.token, COMPILER_SERVICES, "InlineArrayAttribute")?
        else {
            return Ok(0);
        };

        let value = module.decode_custom_attribute(attribute)?;
        Ok(value
            .fixed_args
            .first()
            .and_then(CustomAttributeArgument::as_i4)
            .unwrap_or(0))
    }

    /// Packing and size from the `ClassLayout` table
    #[must_use]
    pub fn get_class_layout(&self) -> ClassLayoutMetadata {
        self.module
            .upgrade()
            .and_then(|module| {
                module
                    .reader()
                    .class_layout(self.token)
                    .map(|layout| ClassLayoutMetadata {
                        packing_size: layout.packing_size,
                        size: layout.class_size,
                    })
            })
            .unwrap_or_default()
    }

    pub(crate) fn compute_hash_code(&self) -> Result<u32> {
        let name = self.name()?;
        if let Some(containing) = self.containing_type()? {
            return Ok(compute_nested_type_hash_code(
                containing.hash_code()?,
                compute_name_hash_code(name),
            ));
        }

        let namespace = self.namespace()?;
        let mut builder = HashCodeBuilder::new(namespace);
        if !namespace.is_empty() {
            builder.append(".");
        }
        builder.append(name);
        Ok(builder.to_hash_code())
    }

    fn load_error(&self, module: &ModuleDesc, reason: String) -> Error {
        let namespace = self.namespace().unwrap_or_default().to_string();
        let name = self.name().unwrap_or_default().to_string();
        debug!(
            module = module.name(),
            namespace = namespace.as_str(),
            name = name.as_str(),
            reason = reason.as_str(),
            "type load failed"
        );

        Error::TypeLoad {
            module: module.name().to_string(),
            namespace,
            name,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{tables::TypeAttributes, typesystem::WellKnownType},
        test::CoreLibrary,
    };

    #[test]
    fn names_and_layout_flags() {
        let corelib = CoreLibrary::new();
        let int32 = corelib.well_known(WellKnownType::Int32);
        let metadata = int32.as_metadata().unwrap();

        assert_eq!(metadata.name().unwrap(), "Int32");
        assert_eq!(metadata.namespace().unwrap(), "System");
        assert_eq!(metadata.full_name().unwrap(), "System.Int32");
        assert!(metadata.is_sealed());
        assert!(metadata.is_sequential_layout());
        assert!(!metadata.is_explicit_layout());
        assert!(!metadata.is_nested());
        assert_eq!(metadata.pinvoke_string_format(), PInvokeStringFormat::AnsiClass);
        assert_eq!(metadata.attributes() & TypeAttributes::PUBLIC, TypeAttributes::PUBLIC);
    }

    #[test]
    fn base_type_state_transitions() {
        let corelib = CoreLibrary::new();
        let module = corelib.module();
        let string = module.get_type_by_name("System", "String").unwrap().unwrap();
        let metadata = string.as_metadata().unwrap();

        assert!(matches!(metadata.base_type_state(), BaseTypeState::Uninitialized));
        let base = metadata.base_type().unwrap().unwrap();
        assert!(base.is_well_known_type(WellKnownType::Object));
        assert!(matches!(metadata.base_type_state(), BaseTypeState::Resolved(_)));

        let object = corelib.well_known(WellKnownType::Object);
        let object = object.as_metadata().unwrap();
        assert!(object.base_type().unwrap().is_none());
        assert!(matches!(object.base_type_state(), BaseTypeState::None));
    }

    #[test]
    fn module_type() {
        let corelib = CoreLibrary::new();
        let module_type = corelib
            .module()
            .get_type(Token::from_parts(TableId::TypeDef, 1))
            .unwrap()
            .unwrap();
        assert!(module_type.as_metadata().unwrap().is_module_type());
        assert_eq!(module_type.name().unwrap(), "<Module>");
        assert!(!corelib.well_known(WellKnownType::Object).is_module_type());
    }
}
