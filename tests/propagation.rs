//! Integration tests for serializability closure propagation.

use std::sync::Arc;

use cilweave::prelude::*;

fn local_type(row: u32, name: &str) -> CilTypeRc {
    Arc::new(CilType::new(
        Token::from_parts(0x02, row),
        "App.Messages",
        name,
        TypeSource::CurrentModule,
        0,
        Vec::new(),
    ))
}

fn external_type(row: u32, name: &str, attributes: u32) -> CilTypeRc {
    Arc::new(CilType::new(
        Token::from_parts(0x01, row),
        "System",
        name,
        TypeSource::External("System.Private.CoreLib".to_string()),
        attributes,
        Vec::new(),
    ))
}

fn field(row: u32, signature: TypeSignature) -> FieldRc {
    Arc::new(Field::new(
        Token::from_parts(0x04, row),
        format!("field{row}"),
        signature,
    ))
}

struct Fixture {
    registry: TypeRegistry,
    diagnostics: Diagnostics,
}

impl Fixture {
    fn new(types: &[&CilTypeRc]) -> Self {
        let registry = TypeRegistry::new();
        for ty in types {
            registry.insert(ty).unwrap();
        }
        Self {
            registry,
            diagnostics: Diagnostics::new(),
        }
    }

    fn propagate(&self, seeds: &[CilTypeRc]) {
        let ctx = WeaveContext::new(&self.registry, &self.diagnostics);
        SerializabilityWalker::new("marker")
            .propagate(seeds, &ctx)
            .unwrap();
    }
}

#[test]
fn propagation_is_idempotent() {
    let seed = local_type(1, "Order");
    let nested = local_type(2, "OrderLine");
    seed.add_field(field(1, TypeSignature::Class(nested.token)));
    let fixture = Fixture::new(&[&seed, &nested]);

    fixture.propagate(&[seed.clone()]);
    let first_run = (seed.attributes_raw(), nested.attributes_raw());

    fixture.propagate(&[seed.clone()]);
    let second_run = (seed.attributes_raw(), nested.attributes_raw());

    assert!(seed.is_serializable());
    assert!(nested.is_serializable());
    assert_eq!(first_run, second_run);
}

#[test]
fn self_referential_field_terminates() {
    // type A with a field of type "sequence of A"
    let a = local_type(1, "Node");
    a.add_field(field(
        1,
        TypeSignature::SzArray(Box::new(TypeSignature::Class(a.token))),
    ));
    let fixture = Fixture::new(&[&a]);

    fixture.propagate(&[a.clone()]);
    assert!(a.is_serializable());
    assert!(!fixture.diagnostics.has_any());
}

#[test]
fn generic_self_reference_terminates() {
    // type A with a field of type List<A>, List being a local generic type
    let a = local_type(1, "Tree");
    let list = local_type(2, "List`1");
    a.add_field(field(
        1,
        TypeSignature::GenericInst(
            Box::new(TypeSignature::Class(list.token)),
            vec![TypeSignature::Class(a.token)],
        ),
    ));
    let fixture = Fixture::new(&[&a, &list]);

    fixture.propagate(&[a.clone()]);
    assert!(a.is_serializable());
    assert!(list.is_serializable());
}

#[test]
fn mutual_reference_terminates() {
    let a = local_type(1, "Invoice");
    let b = local_type(2, "Customer");
    a.add_field(field(1, TypeSignature::Class(b.token)));
    b.add_field(field(2, TypeSignature::Class(a.token)));
    let fixture = Fixture::new(&[&a, &b]);

    fixture.propagate(&[a.clone()]);
    assert!(a.is_serializable());
    assert!(b.is_serializable());
}

#[test]
fn external_types_are_verified_not_mutated() {
    let seed = local_type(1, "Order");
    let external = external_type(1, "Uri", 0);
    seed.add_field(field(1, TypeSignature::Class(external.token)));
    let fixture = Fixture::new(&[&seed, &external]);

    let before = external.attributes_raw();
    fixture.propagate(&[seed.clone()]);

    assert!(seed.is_serializable());
    assert!(!external.is_serializable());
    assert_eq!(external.attributes_raw(), before);

    let warnings = fixture.diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].token, Some(external.token));
}

#[test]
fn serializable_external_types_pass_verification_silently() {
    let seed = local_type(1, "Order");
    // 0x2000 is the serializable attribute bit
    let external = external_type(1, "DateTime", 0x2000);
    seed.add_field(field(1, TypeSignature::Class(external.token)));
    let fixture = Fixture::new(&[&seed, &external]);

    fixture.propagate(&[seed.clone()]);
    assert!(!fixture.diagnostics.has_any());
}

#[test]
fn base_types_join_the_closure() {
    let base = local_type(1, "MessageBase");
    let seed = local_type(2, "OrderPlaced");
    seed.set_base(&base).unwrap();
    let fixture = Fixture::new(&[&base, &seed]);

    fixture.propagate(&[seed.clone()]);
    assert!(base.is_serializable());
}

#[test]
fn pass_discovers_seeds_by_marker_attribute() {
    let marker = "Messaging.MessageAttribute";
    let marked = Arc::new(CilType::new(
        Token::from_parts(0x02, 1),
        "App.Messages",
        "OrderPlaced",
        TypeSource::CurrentModule,
        0,
        vec![marker.to_string()],
    ));
    let unmarked = local_type(2, "Helper");
    let fixture = Fixture::new(&[&marked, &unmarked]);

    let ctx = WeaveContext::new(&fixture.registry, &fixture.diagnostics);
    SerializabilityWalker::new(marker).run(&ctx).unwrap();

    assert!(marked.is_serializable());
    assert!(!unmarked.is_serializable());
}

#[test]
fn indirect_references_resolve_before_recursion() {
    let seed = local_type(1, "Order");
    let target = local_type(2, "OrderLine");
    // the field references OrderLine through a TypeRef token
    let type_ref = Token::from_parts(0x01, 40);
    seed.add_field(field(1, TypeSignature::Class(type_ref)));

    let fixture = Fixture::new(&[&seed, &target]);
    fixture.registry.insert_type_ref(type_ref, target.token);

    fixture.propagate(&[seed.clone()]);
    assert!(target.is_serializable());
}
