//! Integration tests for members, attributes, flags and token lookup.
//!
//! One fixture module exercises everything: constructors and finalizers, enums, inline
//! arrays, generic members viewed through instantiations and `MemberRef` resolution.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use typescope::{
    metadata::{
        builder::MetadataBuilder,
        customattributes::CustomAttributeArgument,
        signatures::{SignatureField, SignatureMethod, TypeSignature},
        tables::{
            FieldAttributes, GenericParamAttributes, MethodAttributes, TableId, TypeAttributes,
        },
        typesystem::{AttributeFlags, ClassLayoutMetadata, FlagCategory, GenericVariance},
    },
    prelude::*,
};

const CORELIB: &str = "System.Private.CoreLib";
const COMPILER_SERVICES: &str = "System.Runtime.CompilerServices";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Tokens of the fixture rows the tests look up directly
struct Fixture {
    context: Arc<TypeSystemContext>,
    module: Arc<ModuleDesc>,
    box_parameter: Token,
    object_to_string: Token,
    box_of_int_get: Token,
    box_of_int_value: Token,
    inherited_run: Token,
    missing_member: Token,
    box_of_int: Token,
}

impl Fixture {
    fn get(&self, namespace: &str, name: &str) -> Result<TypeRc> {
        self.module
            .get_type_by_name(namespace, name)?
            .ok_or_else(|| Error::TypeError(format!("{namespace}.{name} is not defined")))
    }
}

fn field_of(base: TypeSignature) -> SignatureField {
    SignatureField {
        modifiers: vec![],
        base,
    }
}

fn fixture() -> Result<Fixture> {
    init_logging();
    let context =
        TypeSystemContext::new(TypeSystemOptions::default().with_max_inheritance_depth(16));
    context.add_module(MetadataBuilder::core_library(CORELIB)?.build())?;
    context.initialize()?;

    let mut b = MetadataBuilder::new("Fixture");
    let corelib = b.assembly_ref(CORELIB);
    let object = b.type_ref(corelib, "System", "Object");
    let value_type = b.type_ref(corelib, "System", "ValueType");
    let enum_type = b.type_ref(corelib, "System", "Enum");

    let instance_void = SignatureMethod::instance(TypeSignature::Void, vec![]);
    let attribute_ctor =
        |b: &mut MetadataBuilder, name: &str, params: Vec<TypeSignature>| -> Result<Token> {
            let attribute = b.type_ref(corelib, COMPILER_SERVICES, name);
            let signature = SignatureMethod::instance(TypeSignature::Void, params);
            b.member_ref(attribute, ".ctor", &signature)
        };
    let by_ref_like = attribute_ctor(&mut b, "IsByRefLikeAttribute", vec![])?;
    let intrinsic = attribute_ctor(&mut b, "IntrinsicAttribute", vec![])?;
    let inline_array = attribute_ctor(&mut b, "InlineArrayAttribute", vec![TypeSignature::I4])?;

    let public = TypeAttributes::PUBLIC;
    let ctor = MethodAttributes::PUBLIC
        | MethodAttributes::HIDE_BY_SIG
        | MethodAttributes::SPECIAL_NAME
        | MethodAttributes::RTSPECIAL_NAME;

    // Resource overrides Finalize, Derived inherits it
    let resource = b.type_def("App", "Resource", public, object);
    b.method_def(resource, ".ctor", ctor, &instance_void)?;
    b.method_def(
        resource,
        ".cctor",
        MethodAttributes::PRIVATE
            | MethodAttributes::STATIC
            | MethodAttributes::SPECIAL_NAME
            | MethodAttributes::RTSPECIAL_NAME,
        &SignatureMethod::static_method(TypeSignature::Void, vec![]),
    )?;
    b.method_def(
        resource,
        "Finalize",
        MethodAttributes::FAMILY | MethodAttributes::HIDE_BY_SIG | MethodAttributes::VIRTUAL,
        &instance_void,
    )?;
    let run = b.method_def(
        resource,
        "Run",
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        &SignatureMethod::instance(TypeSignature::I4, vec![TypeSignature::I4]),
    )?;
    b.custom_attribute(run, intrinsic, &[])?;
    b.method_def(
        resource,
        "Native",
        MethodAttributes::PUBLIC | MethodAttributes::STATIC | MethodAttributes::PINVOKE_IMPL,
        &SignatureMethod {
            default: false,
            stdcall: true,
            ..SignatureMethod::static_method(TypeSignature::Void, vec![])
        },
    )?;
    let derived = b.type_def("App", "Derived", public, resource);

    let plain = b.type_def("App", "Plain", public, object);
    b.method_def(
        plain,
        ".ctor",
        ctor,
        &SignatureMethod::instance(TypeSignature::Void, vec![TypeSignature::I4]),
    )?;
    let shape = b.type_def("App", "Shape", public | TypeAttributes::ABSTRACT, object);
    b.method_def(shape, ".ctor", ctor, &instance_void)?;

    let color = b.type_def("App", "Color", public | TypeAttributes::SEALED, enum_type);
    b.field(
        color,
        "value__",
        FieldAttributes::PUBLIC | FieldAttributes::SPECIAL_NAME | FieldAttributes::RTSPECIAL_NAME,
        &field_of(TypeSignature::I4),
    )?;
    b.field(
        color,
        "Red",
        FieldAttributes::PUBLIC | FieldAttributes::STATIC | FieldAttributes::LITERAL,
        &field_of(TypeSignature::ValueType(color)),
    )?;

    let struct_flags = public | TypeAttributes::SEALED | TypeAttributes::SEQUENTIAL_LAYOUT;
    let buffer = b.type_def("App", "Buffer", struct_flags, value_type);
    b.field(buffer, "_element0", FieldAttributes::PRIVATE, &field_of(TypeSignature::I4))?;
    b.custom_attribute(buffer, inline_array, &[CustomAttributeArgument::I4(8)])?;
    b.class_layout(buffer, 4, 32);
    let span = b.type_def("App", "Span", struct_flags, value_type);
    b.custom_attribute(span, by_ref_like, &[])?;
    let not_a_buffer = b.type_def("App", "NotABuffer", public, object);
    b.custom_attribute(not_a_buffer, inline_array, &[CustomAttributeArgument::I4(4)])?;
    b.custom_attribute(not_a_buffer, by_ref_like, &[])?;
    b.custom_attribute(not_a_buffer, intrinsic, &[])?;

    let generic_box = b.type_def("App", "Box`1", public, object);
    let box_parameter = b.generic_param(generic_box, "T", 0);
    b.field(
        generic_box,
        "value",
        FieldAttributes::PUBLIC,
        &field_of(TypeSignature::GenericParamType(0)),
    )?;
    b.method_def(generic_box, ".ctor", ctor, &instance_void)?;
    let get_signature = SignatureMethod::instance(TypeSignature::GenericParamType(0), vec![]);
    b.method_def(
        generic_box,
        "Get",
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        &get_signature,
    )?;

    let producer = b.type_def(
        "App",
        "IProducer`1",
        public | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        Token::new(0),
    );
    b.generic_param(producer, "T", GenericParamAttributes::COVARIANT);

    // Cycle2 is the row after Cycle1
    let cycle_two = Token::from_parts(TableId::TypeDef, producer.row() + 2);
    let cycle_one = b.type_def("App", "Cycle1", public, cycle_two);
    b.type_def("App", "Cycle2", public, cycle_one);

    let object_to_string = b.member_ref(
        object,
        "ToString",
        &SignatureMethod::instance(TypeSignature::String, vec![]),
    )?;
    let box_of_int = b.type_spec(&TypeSignature::GenericInst(
        Box::new(TypeSignature::Class(generic_box)),
        vec![TypeSignature::I4],
    ))?;
    let box_of_int_get = b.member_ref(box_of_int, "Get", &get_signature)?;
    let box_of_int_value = b.field_ref(
        box_of_int,
        "value",
        &field_of(TypeSignature::GenericParamType(0)),
    )?;
    let inherited_run = b.member_ref(
        derived,
        "Run",
        &SignatureMethod::instance(TypeSignature::I4, vec![TypeSignature::I4]),
    )?;
    let missing_member = b.member_ref(object, "Missing", &instance_void)?;

    let module = context.add_module(b.build())?;
    Ok(Fixture {
        context,
        module,
        box_parameter,
        object_to_string,
        box_of_int_get,
        box_of_int_value,
        inherited_run,
        missing_member,
        box_of_int,
    })
}

#[test]
fn finalizers_follow_virtual_dispatch() -> Result<()> {
    let fixture = fixture()?;
    let resource = fixture.get("App", "Resource")?;
    let derived = fixture.get("App", "Derived")?;

    let finalizer = resource.get_finalizer()?.unwrap();
    assert_eq!(finalizer.name()?, "Finalize");
    assert!(Arc::ptr_eq(finalizer.owning_type(), &resource));
    assert!(resource.has_finalizer()?);

    let inherited = derived.get_finalizer()?.unwrap();
    assert!(Arc::ptr_eq(&inherited, &finalizer));
    assert!(derived.has_finalizer()?);

    // The root implementation does not count
    assert!(fixture.get("App", "Plain")?.get_finalizer()?.is_none());
    assert!(!fixture.get("App", "Plain")?.has_finalizer()?);
    let object = fixture.context.get_well_known_type(WellKnownType::Object)?;
    assert!(object.get_finalizer()?.is_none());
    Ok(())
}

#[test]
fn cyclic_inheritance_hits_the_depth_limit() -> Result<()> {
    let fixture = fixture()?;
    let cycle = fixture.get("App", "Cycle1")?;
    let other = cycle.base_type()?.unwrap();
    assert_eq!(other.full_name()?, "App.Cycle2");
    assert!(Arc::ptr_eq(&other.base_type()?.unwrap(), &cycle));

    let error = cycle.has_finalizer().unwrap_err();
    assert!(matches!(error, Error::RecursionLimit(16)));
    assert!(error.is_load_error());
    Ok(())
}

#[test]
fn cyclic_nesting_hits_the_depth_limit() -> Result<()> {
    let fixture = fixture()?;
    let mut b = MetadataBuilder::new("Nesting");
    let corelib = b.assembly_ref(CORELIB);
    let object = b.type_ref(corelib, "System", "Object");
    let outer = b.type_def("N", "Outer", TypeAttributes::PUBLIC, object);
    let nested = TypeAttributes::NESTED_PUBLIC;

    // Loop is its own enclosing type, Ping and Pong enclose each other
    let own = Token::from_parts(TableId::TypeDef, outer.row() + 1);
    let looped = b.nested_type_def(own, "", "Loop", nested, object);
    let pong = Token::from_parts(TableId::TypeDef, looped.row() + 2);
    let ping = b.nested_type_def(pong, "", "Ping", nested, object);
    b.nested_type_def(ping, "", "Pong", nested, object);
    let inner = b.nested_type_def(outer, "", "Inner", nested, object);
    let module = fixture.context.add_module(b.build())?;

    for token in [looped, ping, pong] {
        let ty = module.get_type(token)?.unwrap();
        assert!(ty.name().is_ok());
        for error in [
            ty.containing_type().unwrap_err(),
            ty.full_name().unwrap_err(),
            ty.hash_code().unwrap_err(),
        ] {
            assert!(matches!(error, Error::RecursionLimit(16)));
            assert!(error.is_load_error());
        }
        // Formatting falls back instead of recursing
        assert_eq!(ty.to_string(), "<unresolved type>");
    }

    let inner = module.get_type(inner)?.unwrap();
    assert_eq!(inner.full_name()?, "N.Outer+Inner");
    assert_eq!(inner.containing_type()?.unwrap().name()?, "Outer");
    Ok(())
}

#[test]
fn finalizer_lookup_requires_a_chain_rooted_at_object() -> Result<()> {
    let fixture = fixture()?;
    let mut b = MetadataBuilder::new("Unrooted");
    let root = b.type_def("N", "Root", TypeAttributes::PUBLIC, Token::new(0));
    b.type_def("N", "Leaf", TypeAttributes::PUBLIC, root);
    let module = fixture.context.add_module(b.build())?;

    let leaf = module.get_type_by_name("N", "Leaf")?.unwrap();
    assert!(Arc::ptr_eq(&leaf.base_type()?.unwrap(), &module.get_type(root)?.unwrap()));

    let error = leaf.get_finalizer().unwrap_err();
    assert!(matches!(error, Error::TypeLoad { .. }));
    assert!(error.is_load_error());
    assert!(leaf.has_finalizer().unwrap_err().is_load_error());
    Ok(())
}

#[test]
fn constructors() -> Result<()> {
    let fixture = fixture()?;
    let resource = fixture.get("App", "Resource")?;

    let default = resource.get_default_constructor()?.unwrap();
    assert!(default.is_constructor()?);
    assert!(default.signature()?.is_empty());
    let initializer = resource.get_static_constructor()?.unwrap();
    assert!(initializer.is_static_constructor()?);
    assert!(initializer.is_static());

    assert!(fixture.get("App", "Plain")?.get_default_constructor()?.is_none());
    assert!(fixture.get("App", "Plain")?.get_static_constructor()?.is_none());
    assert!(fixture.get("App", "Shape")?.get_default_constructor()?.is_none());
    assert!(fixture.get("App", "Shape")?.is_abstract());
    // Constructors are not inherited
    assert!(fixture.get("App", "Derived")?.get_default_constructor()?.is_none());
    Ok(())
}

#[test]
fn method_enumeration_and_lookup() -> Result<()> {
    let fixture = fixture()?;
    let resource = fixture.get("App", "Resource")?;

    let names = resource
        .get_methods()?
        .map(|method| Ok(method?.name()?.to_string()))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(names, [".ctor", ".cctor", "Finalize", "Run", "Native"]);
    let virtuals = resource.get_virtual_methods()?.collect::<Result<Vec<_>>>()?;
    assert_eq!(virtuals.len(), 1);
    assert_eq!(virtuals[0].name()?, "Finalize");

    let int32 = fixture.context.get_well_known_type(WellKnownType::Int32)?;
    let void = fixture.context.get_well_known_type(WellKnownType::Void)?;
    let run_signature = MethodSignature::new(
        MethodSignatureFlags::empty(),
        0,
        int32.clone(),
        vec![int32.clone()],
    );
    let run = resource.get_method("Run", Some(&run_signature), None)?.unwrap();
    assert!(run.has_custom_attribute(COMPILER_SERVICES, "IntrinsicAttribute")?);
    let without_parameters = MethodSignature::new(MethodSignatureFlags::empty(), 0, int32, vec![]);
    assert!(resource
        .get_method("Run", Some(&without_parameters), None)?
        .is_none());
    assert!(resource.get_method("Missing", None, None)?.is_none());

    // The stdcall convention only matters to the exact comparison
    let managed_static = MethodSignature::new(MethodSignatureFlags::STATIC, 0, void, vec![]);
    assert!(resource
        .get_method("Native", Some(&managed_static), None)?
        .is_none());
    let native = resource
        .get_method_with_equivalent_signature("Native", Some(&managed_static), None)?
        .unwrap();
    assert!(native
        .signature()?
        .flags()
        .contains(MethodSignatureFlags::UNMANAGED_CALLING_CONVENTION_STDCALL));
    assert!(native.signature()?.equivalent_to(&managed_static));
    assert_ne!(native.signature()?, &managed_static);
    Ok(())
}

#[test]
fn members_of_instantiated_types() -> Result<()> {
    let fixture = fixture()?;
    let definition = fixture.get("App", "Box`1")?;
    let int32 = fixture.context.get_well_known_type(WellKnownType::Int32)?;
    let box_of_int = fixture
        .context
        .instantiated_type(&definition, Instantiation::new(vec![int32.clone()]))?;
    assert!(Arc::ptr_eq(
        &fixture.module.get_type(fixture.box_of_int)?.unwrap(),
        &box_of_int
    ));

    let generic_get = definition.get_method("Get", None, None)?.unwrap();
    assert!(generic_get.signature()?.return_type().is_signature_variable());

    let get = box_of_int.get_method("Get", None, None)?.unwrap();
    assert!(Arc::ptr_eq(get.owning_type(), &box_of_int));
    assert!(Arc::ptr_eq(get.signature()?.return_type(), &int32));
    assert_eq!(get.token(), generic_get.token());
    assert!(std::ptr::eq(get.typical_definition(), &*generic_get));
    assert!(Arc::ptr_eq(
        &get,
        &fixture
            .context
            .method_on_instantiated_type(&generic_get, &box_of_int)
    ));
    assert_eq!(get, box_of_int.get_method("Get", None, None)?.unwrap());

    let value = box_of_int.get_field("value")?.unwrap();
    assert!(Arc::ptr_eq(value.field_type()?, &int32));
    assert!(Arc::ptr_eq(value.owning_type(), &box_of_int));
    assert_eq!(box_of_int.get_fields()?.count(), 1);
    assert!(box_of_int.get_default_constructor()?.is_some());

    // A substitution applied while matching finds the generic definition's method
    let int_getter = MethodSignature::new(MethodSignatureFlags::empty(), 0, int32.clone(), vec![]);
    let substitution = Instantiation::new(vec![int32]);
    assert!(definition.get_method("Get", Some(&int_getter), None)?.is_none());
    let found = definition
        .get_method("Get", Some(&int_getter), Some(&substitution))?
        .unwrap();
    assert!(Arc::ptr_eq(&found, &generic_get));
    Ok(())
}

#[test]
fn enums_and_fields() -> Result<()> {
    let fixture = fixture()?;
    let color = fixture.get("App", "Color")?;
    assert!(color.is_enum()?);
    assert!(color.is_value_type()?);
    assert!(color.is_sealed()?);
    assert!(color
        .underlying_type()?
        .is_well_known_type(WellKnownType::Int32));

    let red = color.get_field("Red")?.unwrap();
    assert!(red.is_static() && red.is_literal());
    assert!(Arc::ptr_eq(red.field_type()?, &color));
    assert!(color.get_field("Blue")?.is_none());

    let resource = fixture.get("App", "Resource")?;
    assert!(Arc::ptr_eq(&resource.underlying_type()?, &resource));
    Ok(())
}

#[test]
fn marker_attributes_and_layout() -> Result<()> {
    let fixture = fixture()?;

    let buffer = fixture.get("App", "Buffer")?;
    assert!(buffer.is_inline_array()?);
    assert_eq!(buffer.get_inline_array_length()?, 8);
    assert_eq!(
        buffer.get_class_layout(),
        ClassLayoutMetadata {
            packing_size: 4,
            size: 32
        }
    );
    assert!(buffer.is_sequential_layout());
    assert!(!buffer.is_byref_like()?);

    assert!(fixture.get("App", "Span")?.is_byref_like()?);

    // Value-type-only markers are ignored on classes
    let not_a_buffer = fixture.get("App", "NotABuffer")?;
    assert_eq!(not_a_buffer.attribute_flags()?, AttributeFlags::IS_INTRINSIC);
    assert!(!not_a_buffer.is_inline_array()?);
    assert!(matches!(
        not_a_buffer.get_inline_array_length(),
        Err(Error::TypeError(_))
    ));
    assert!(not_a_buffer.has_custom_attribute(COMPILER_SERVICES, "InlineArrayAttribute")?);
    assert!(!not_a_buffer.has_custom_attribute(COMPILER_SERVICES, "ObsoleteAttribute")?);
    assert_eq!(
        not_a_buffer.get_class_layout(),
        ClassLayoutMetadata::default()
    );
    Ok(())
}

#[test]
fn generic_variance() -> Result<()> {
    let fixture = fixture()?;
    let producer = fixture.get("App", "IProducer`1")?;
    assert!(producer.is_interface()?);
    assert!(producer.base_type()?.is_none());
    assert!(producer.has_generic_variance()?);
    assert_eq!(
        producer.instantiation()?[0]
            .as_generic_parameter()
            .unwrap()
            .variance(),
        GenericVariance::Covariant
    );

    assert!(!fixture.get("App", "Box`1")?.has_generic_variance()?);
    assert!(!fixture.get("App", "Resource")?.has_generic_variance()?);
    Ok(())
}

#[test]
fn flags_are_computed_per_category() -> Result<()> {
    let fixture = fixture()?;
    let derived = fixture.get("App", "Derived")?;

    let flags = derived.compute_flags(FlagCategory::CATEGORY | FlagCategory::FINALIZER)?;
    assert_eq!(flags.category, Some(TypeCategory::Class));
    assert_eq!(flags.has_finalizer, Some(true));
    assert_eq!(flags.attributes, None);
    assert_eq!(flags.has_generic_variance, None);

    let attributes = derived.compute_flags(FlagCategory::ATTRIBUTES)?;
    assert_eq!(attributes.attributes, Some(AttributeFlags::empty()));
    assert_eq!(attributes.category, None);

    let again = derived.compute_flags(FlagCategory::CATEGORY)?;
    assert_eq!(again.category, Some(TypeCategory::Class));
    assert!(again.has_finalizer.is_none());
    Ok(())
}

#[test]
fn tokens_resolve_to_entities() -> Result<()> {
    let fixture = fixture()?;
    let module = &fixture.module;
    let object = fixture.context.get_well_known_type(WellKnownType::Object)?;

    let Some(Entity::Method(to_string)) = module.get_object(fixture.object_to_string)? else {
        panic!("ToString did not resolve to a method");
    };
    assert_eq!(to_string.name()?, "ToString");
    assert!(Arc::ptr_eq(to_string.owning_type(), &object));

    let Some(Entity::Method(get)) = module.get_object(fixture.box_of_int_get)? else {
        panic!("Box<int>::Get did not resolve to a method");
    };
    let box_of_int = module.get_type(fixture.box_of_int)?.unwrap();
    assert!(Arc::ptr_eq(get.owning_type(), &box_of_int));
    assert!(get
        .signature()?
        .return_type()
        .is_well_known_type(WellKnownType::Int32));

    let Some(Entity::Field(value)) = module.get_object(fixture.box_of_int_value)? else {
        panic!("Box<int>::value did not resolve to a field");
    };
    assert!(Arc::ptr_eq(value.owning_type(), &box_of_int));

    let Some(Entity::Method(run)) = module.get_object(fixture.inherited_run)? else {
        panic!("Derived::Run did not resolve to a method");
    };
    assert_eq!(run.owning_type().name()?, "Resource");

    assert!(module.get_object(fixture.missing_member)?.is_none());

    let Some(Entity::Type(parameter)) = module.get_object(fixture.box_parameter)? else {
        panic!("the generic parameter did not resolve to a type");
    };
    assert!(parameter.is_generic_parameter());
    assert_eq!(parameter.name()?, "T");
    let definition = fixture.get("App", "Box`1")?;
    assert!(Arc::ptr_eq(&parameter, &definition.instantiation()?[0]));

    let Some(Entity::Type(ty)) = module.get_object(Token::from_parts(TableId::TypeDef, 2))? else {
        panic!("the first TypeDef did not resolve to a type");
    };
    assert_eq!(ty.full_name()?, "App.Resource");

    assert!(matches!(
        module.get_object(Token::from_parts(TableId::Param, 1)),
        Err(Error::NotSupported(_))
    ));
    Ok(())
}
