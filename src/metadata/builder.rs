//! Assemble module metadata in memory.
//!
//! [`MetadataBuilder`] appends rows table by table and lays out the `#Strings` and `#Blob`
//! heaps in their on-disk encodings, so everything downstream decodes names and signatures
//! exactly as it would for metadata read from a file. [`MetadataBuilder::core_library`]
//! starts from a minimal core library defining every
//! [`crate::metadata::typesystem::WellKnownType`].
//!
//! # Examples
//!
//! ```rust
//! use typescope::metadata::{
//!     builder::MetadataBuilder,
//!     reader::MetadataReader,
//!     signatures::{SignatureMethod, TypeSignature},
//!     tables::{MethodAttributes, TypeAttributes},
//! };
//!
//! let mut builder = MetadataBuilder::new("App");
//! let corelib = builder.assembly_ref("System.Private.CoreLib");
//! let object = builder.type_ref(corelib, "System", "Object");
//! let program = builder.type_def("App", "Program", TypeAttributes::PUBLIC, object);
//! builder.method_def(
//!     program,
//!     "Main",
//!     MethodAttributes::PUBLIC | MethodAttributes::STATIC,
//!     &SignatureMethod::static_method(TypeSignature::Void, vec![]),
//! )?;
//!
//! let tables = builder.build();
//! assert_eq!(tables.type_def_count(), 2); // <Module> and Program
//! # Ok::<(), typescope::Error>(())
//! ```

use strum::IntoEnumIterator;

use crate::{
    metadata::{
        customattributes::{encode_custom_attribute_value, CustomAttributeArgument},
        reader::MetadataTables,
        signatures::{
            encode_field_signature, encode_method_signature, encode_typespec_signature,
            SignatureField, SignatureMethod, SignatureTypeSpec, TypeSignature,
        },
        streams::{BlobBuilder, StringsBuilder},
        tables::{
            AssemblyRefRaw, ClassLayoutRaw, CustomAttributeRaw, FieldAttributes, FieldRaw,
            GenericParamRaw, MemberRefRaw, MethodAttributes, MethodDefRaw, TableId,
            TypeAttributes, TypeDefRaw, TypeRefRaw, TypeSpecRaw,
        },
        token::Token,
        typesystem::WellKnownType,
    },
    Result,
};

fn next_token<T>(rows: &[T], table: TableId) -> (u32, Token) {
    #[allow(clippy::cast_possible_truncation)]
    let rid = rows.len() as u32 + 1;
    (rid, Token::from_parts(table, rid))
}

/// Builds [`MetadataTables`] row by row.
pub struct MetadataBuilder {
    tables: MetadataTables,
    strings: StringsBuilder,
    blobs: BlobBuilder,
}

impl MetadataBuilder {
    /// Start a module of `assembly_name`. `TypeDef` row 1 is the `<Module>` type.
    #[must_use]
    pub fn new(assembly_name: &str) -> Self {
        let mut builder = MetadataBuilder {
            tables: MetadataTables {
                assembly_name: assembly_name.to_string(),
                ..MetadataTables::default()
            },
            strings: StringsBuilder::new(),
            blobs: BlobBuilder::new(),
        };
        builder.type_def("", "<Module>", TypeAttributes::NOT_PUBLIC, Token::new(0));
        builder
    }

    /// Start a minimal core library named `assembly_name`.
    ///
    /// It defines every well-known type with its usual base type, `System.Delegate`,
    /// `System.Attribute`, the `System.Runtime.CompilerServices` marker attributes
    /// `IsByRefLikeAttribute`, `IntrinsicAttribute` and `InlineArrayAttribute`, and on
    /// `System.Object` a public default constructor, `ToString` and the virtual `Finalize`.
    ///
    /// # Errors
    /// Returns an error if a signature cannot be encoded.
    pub fn core_library(assembly_name: &str) -> Result<Self> {
        let mut builder = MetadataBuilder::new(assembly_name);
        let nil = Token::new(0);
        let public = TypeAttributes::PUBLIC;

        let object = builder.type_def("System", "Object", public, nil);
        let value_type = builder.type_def("System", "ValueType", public | TypeAttributes::ABSTRACT, object);
        let enum_type = builder.type_def("System", "Enum", public | TypeAttributes::ABSTRACT, value_type);
        let delegate = builder.type_def("System", "Delegate", public | TypeAttributes::ABSTRACT, object);
        let attribute = builder.type_def("System", "Attribute", public | TypeAttributes::ABSTRACT, object);

        for kind in WellKnownType::iter() {
            let (namespace, name) = kind.namespace_and_name();
            if builder.find_type_def(namespace, name).is_some() {
                continue;
            }

            let (flags, extends) = match kind {
                WellKnownType::String | WellKnownType::Exception => {
                    (public | TypeAttributes::SEALED, object)
                }
                WellKnownType::Array => (public | TypeAttributes::ABSTRACT, object),
                WellKnownType::MulticastDelegate => (public | TypeAttributes::ABSTRACT, delegate),
                _ => (
                    public | TypeAttributes::SEALED | TypeAttributes::SEQUENTIAL_LAYOUT,
                    value_type,
                ),
            };
            let token = builder.type_def(namespace, name, flags, extends);
            if kind == WellKnownType::Nullable {
                builder.generic_param(token, "T", 0);
            }
        }

        let ctor_flags = MethodAttributes::PUBLIC
            | MethodAttributes::HIDE_BY_SIG
            | MethodAttributes::SPECIAL_NAME
            | MethodAttributes::RTSPECIAL_NAME;
        let instance_void = SignatureMethod::instance(TypeSignature::Void, vec![]);
        builder.method_def(object, ".ctor", ctor_flags, &instance_void)?;
        builder.method_def(
            object,
            "ToString",
            MethodAttributes::PUBLIC
                | MethodAttributes::HIDE_BY_SIG
                | MethodAttributes::VIRTUAL
                | MethodAttributes::NEW_SLOT,
            &SignatureMethod::instance(TypeSignature::String, vec![]),
        )?;
        builder.method_def(
            object,
            "Finalize",
            MethodAttributes::FAMILY
                | MethodAttributes::HIDE_BY_SIG
                | MethodAttributes::VIRTUAL
                | MethodAttributes::NEW_SLOT,
            &instance_void,
        )?;
        builder.method_def(attribute, ".ctor", ctor_flags, &instance_void)?;
        builder.method_def(enum_type, ".ctor", ctor_flags, &instance_void)?;

        let compiler_services = "System.Runtime.CompilerServices";
        let sealed_attribute = public | TypeAttributes::SEALED | TypeAttributes::BEFORE_FIELD_INIT;
        for name in ["IsByRefLikeAttribute", "IntrinsicAttribute"] {
            let token = builder.type_def(compiler_services, name, sealed_attribute, attribute);
            builder.method_def(token, ".ctor", ctor_flags, &instance_void)?;
        }
        let inline_array =
            builder.type_def(compiler_services, "InlineArrayAttribute", sealed_attribute, attribute);
        builder.method_def(
            inline_array,
            ".ctor",
            ctor_flags,
            &SignatureMethod::instance(TypeSignature::Void, vec![TypeSignature::I4]),
        )?;
        let length_field = SignatureField {
            modifiers: vec![],
            base: TypeSignature::I4,
        };
        builder.field(
            inline_array,
            "<Length>k__BackingField",
            FieldAttributes::PRIVATE | FieldAttributes::INIT_ONLY,
            &length_field,
        )?;

        Ok(builder)
    }

    /// Add an `AssemblyRef` row naming another assembly
    pub fn assembly_ref(&mut self, name: &str) -> Token {
        let (rid, token) = next_token(&self.tables.assembly_refs, TableId::AssemblyRef);
        let name = self.strings.add(name);
        self.tables.assembly_refs.push(AssemblyRefRaw {
            rid,
            token,
            name,
            ..AssemblyRefRaw::default()
        });
        token
    }

    /// Add a `TypeRef` row resolved through `resolution_scope`
    pub fn type_ref(&mut self, resolution_scope: Token, namespace: &str, name: &str) -> Token {
        let (rid, token) = next_token(&self.tables.type_refs, TableId::TypeRef);
        let type_name = self.strings.add(name);
        let type_namespace = self.strings.add(namespace);
        self.tables.type_refs.push(TypeRefRaw {
            rid,
            token,
            resolution_scope,
            type_name,
            type_namespace,
        });
        token
    }

    /// Add a `TypeDef` row extending `extends`, a nil token for no base type
    pub fn type_def(&mut self, namespace: &str, name: &str, flags: u32, extends: Token) -> Token {
        let (rid, token) = next_token(&self.tables.type_defs, TableId::TypeDef);
        let type_name = self.strings.add(name);
        let type_namespace = self.strings.add(namespace);
        self.tables.type_defs.push(TypeDefRaw {
            rid,
            token,
            flags,
            type_name,
            type_namespace,
            extends,
            field_list: Vec::new(),
            method_list: Vec::new(),
        });
        token
    }

    /// Add a `TypeDef` row nested in `enclosing`. `flags` should carry a nested visibility.
    pub fn nested_type_def(
        &mut self,
        enclosing: Token,
        namespace: &str,
        name: &str,
        flags: u32,
        extends: Token,
    ) -> Token {
        let token = self.type_def(namespace, name, flags, extends);
        self.tables
            .nested_types
            .entry(enclosing)
            .or_default()
            .push(token);
        self.tables.enclosing_types.insert(token, enclosing);
        token
    }

    /// Add a `TypeSpec` row for `signature`.
    ///
    /// # Errors
    /// Returns an error if the signature cannot be encoded.
    pub fn type_spec(&mut self, signature: &TypeSignature) -> Result<Token> {
        let blob = encode_typespec_signature(&SignatureTypeSpec {
            base: signature.clone(),
        })?;
        let (rid, token) = next_token(&self.tables.type_specs, TableId::TypeSpec);
        let signature = self.blobs.add(&blob);
        self.tables.type_specs.push(TypeSpecRaw {
            rid,
            token,
            signature,
        });
        Ok(token)
    }

    /// Add a `MethodDef` row owned by the `TypeDef` `owner`.
    ///
    /// # Errors
    /// Returns an error if `owner` is not a `TypeDef` of this builder or the signature cannot
    /// be encoded.
    pub fn method_def(
        &mut self,
        owner: Token,
        name: &str,
        flags: u32,
        signature: &SignatureMethod,
    ) -> Result<Token> {
        let blob = encode_method_signature(signature)?;
        let owner_index = self.type_def_index(owner)?;

        let (rid, token) = next_token(&self.tables.method_defs, TableId::MethodDef);
        let name = self.strings.add(name);
        let signature = self.blobs.add(&blob);
        self.tables.method_defs.push(MethodDefRaw {
            rid,
            token,
            rva: 0,
            impl_flags: 0,
            flags,
            name,
            signature,
        });
        self.tables.type_defs[owner_index].method_list.push(token);
        Ok(token)
    }

    /// Add a `Field` row owned by the `TypeDef` `owner`.
    ///
    /// # Errors
    /// Returns an error if `owner` is not a `TypeDef` of this builder or the signature cannot
    /// be encoded.
    pub fn field(
        &mut self,
        owner: Token,
        name: &str,
        flags: u32,
        signature: &SignatureField,
    ) -> Result<Token> {
        let blob = encode_field_signature(signature)?;
        let owner_index = self.type_def_index(owner)?;

        let (rid, token) = next_token(&self.tables.fields, TableId::Field);
        let name = self.strings.add(name);
        let signature = self.blobs.add(&blob);
        self.tables.fields.push(FieldRaw {
            rid,
            token,
            flags,
            name,
            signature,
        });
        self.tables.type_defs[owner_index].field_list.push(token);
        Ok(token)
    }

    /// Add a `MemberRef` row for a method of `class`.
    ///
    /// # Errors
    /// Returns an error if the signature cannot be encoded.
    pub fn member_ref(
        &mut self,
        class: Token,
        name: &str,
        signature: &SignatureMethod,
    ) -> Result<Token> {
        let blob = encode_method_signature(signature)?;
        Ok(self.push_member_ref(class, name, &blob))
    }

    /// Add a `MemberRef` row for a field of `class`.
    ///
    /// # Errors
    /// Returns an error if the signature cannot be encoded.
    pub fn field_ref(
        &mut self,
        class: Token,
        name: &str,
        signature: &SignatureField,
    ) -> Result<Token> {
        let blob = encode_field_signature(signature)?;
        Ok(self.push_member_ref(class, name, &blob))
    }

    fn push_member_ref(&mut self, class: Token, name: &str, blob: &[u8]) -> Token {
        let (rid, token) = next_token(&self.tables.member_refs, TableId::MemberRef);
        let name = self.strings.add(name);
        let signature = self.blobs.add(blob);
        self.tables.member_refs.push(MemberRefRaw {
            rid,
            token,
            class,
            name,
            signature,
        });
        token
    }

    /// Add the next `GenericParam` row of `owner`, numbered after the ones already added
    pub fn generic_param(&mut self, owner: Token, name: &str, flags: u32) -> Token {
        let (rid, token) = next_token(&self.tables.generic_param_rows, TableId::GenericParam);
        let name = self.strings.add(name);
        let params = self.tables.generic_params.entry(owner).or_default();
        #[allow(clippy::cast_possible_truncation)]
        let number = params.len() as u32;
        params.push(token);
        self.tables.generic_param_rows.push(GenericParamRaw {
            rid,
            token,
            number,
            flags,
            owner,
            name,
        });
        token
    }

    /// Apply the attribute whose constructor is `constructor` to `parent`.
    ///
    /// # Errors
    /// Returns an error if an argument cannot be encoded.
    pub fn custom_attribute(
        &mut self,
        parent: Token,
        constructor: Token,
        fixed_args: &[CustomAttributeArgument],
    ) -> Result<Token> {
        let blob = encode_custom_attribute_value(fixed_args)?;
        let rid = self
            .tables
            .custom_attributes
            .values()
            .map(Vec::len)
            .sum::<usize>();
        #[allow(clippy::cast_possible_truncation)]
        let rid = rid as u32 + 1;
        let token = Token::from_parts(TableId::CustomAttribute, rid);
        let value = self.blobs.add(&blob);
        self.tables
            .custom_attributes
            .entry(parent)
            .or_default()
            .push(CustomAttributeRaw {
                rid,
                token,
                parent,
                constructor,
                value,
            });
        Ok(token)
    }

    /// Record packing and size of the `TypeDef` `parent`
    pub fn class_layout(&mut self, parent: Token, packing_size: u16, class_size: u32) -> Token {
        #[allow(clippy::cast_possible_truncation)]
        let rid = self.tables.class_layouts.len() as u32 + 1;
        let token = Token::from_parts(TableId::ClassLayout, rid);
        self.tables.class_layouts.insert(
            parent,
            ClassLayoutRaw {
                rid,
                token,
                packing_size,
                class_size,
                parent,
            },
        );
        token
    }

    /// Find a `TypeDef` added so far by namespace and name
    #[must_use]
    pub fn find_type_def(&self, namespace: &str, name: &str) -> Option<Token> {
        let name = self.strings.index_of(name)?;
        let namespace = self.strings.index_of(namespace)?;
        self.tables
            .type_defs
            .iter()
            .find(|row| row.type_name == name && row.type_namespace == namespace)
            .map(|row| row.token)
    }

    /// Find a `MethodDef` of the `TypeDef` `owner` by name
    #[must_use]
    pub fn find_method_def(&self, owner: Token, name: &str) -> Option<Token> {
        let name = self.strings.index_of(name)?;
        let index = self.type_def_index(owner).ok()?;
        self.tables.type_defs[index]
            .method_list
            .iter()
            .copied()
            .find(|method| self.tables.method_defs[method.row() as usize - 1].name == name)
    }

    fn type_def_index(&self, owner: Token) -> Result<usize> {
        if !owner.is_table(TableId::TypeDef)
            || owner.is_null()
            || owner.row() as usize > self.tables.type_defs.len()
        {
            return Err(malformed_error!("{} is not a TypeDef of this module", owner));
        }
        Ok(owner.row() as usize - 1)
    }

    /// Lay out the heaps and index the relations
    #[must_use]
    pub fn build(self) -> MetadataTables {
        let mut tables = self.tables;
        tables.strings = self.strings.finish();
        tables.blobs = self.blobs.finish();
        tables.index_members();
        tables
    }
}
