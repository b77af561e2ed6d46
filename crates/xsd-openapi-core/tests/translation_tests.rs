//! Behavioural tests of the translation engine, built from in-code graphs.
//!
//! Each test states one observable property of a conversion run: reference
//! integrity, termination on recursive types, alternation shapes, derivation
//! semantics and deterministic emission order.

use pretty_assertions::assert_eq;
use serde_json::json;
use xsd_openapi_core::{
    convert, convert_all, AttributeDecl, ContentModel, ConvertError, ConvertOptions,
    DiagnosticKind, DiagnosticsMode, ElementDecl, Facets, ObjectSchema, Particle, Primitive,
    RootRef, SchemaName, SchemaObject, StructuredType, TypeGraph, TypeKind, TypeNode, TypeRef,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn element(name: &str, type_ref: TypeRef) -> Particle {
    Particle::element(name, type_ref)
}

fn object<'a>(schema: Option<&'a SchemaObject>, name: &str) -> &'a ObjectSchema {
    schema
        .and_then(SchemaObject::as_object)
        .unwrap_or_else(|| panic!("expected object schema for {name}"))
}

fn run(graph: &TypeGraph, root: &str) -> xsd_openapi_core::Document {
    convert(graph, &[RootRef::type_name(root)], &ConvertOptions::default())
        .unwrap_or_else(|e| panic!("conversion of {root} failed: {e}"))
        .document
}

fn payment_graph() -> TypeGraph {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "Payment",
        StructuredType::new(ContentModel::sequence(vec![
            element("amount", TypeRef::builtin("decimal")),
            Particle::group(ContentModel::choice(vec![
                element("creditCard", TypeRef::named("CreditCard")),
                element("bankAccount", TypeRef::named("BankAccount")),
            ])),
        ])),
    ));
    graph.add_type(TypeNode::structured(
        "CreditCard",
        StructuredType::new(ContentModel::sequence(vec![element(
            "number",
            TypeRef::builtin("string"),
        )])),
    ));
    graph.add_type(TypeNode::structured(
        "BankAccount",
        StructuredType::new(ContentModel::sequence(vec![element(
            "iban",
            TypeRef::builtin("string"),
        )])),
    ));
    graph
}

// ── Reference integrity ─────────────────────────────────────────────────────

#[test]
fn test_no_dangling_references_in_acyclic_graph() {
    let document = run(&payment_graph(), "Payment");
    assert!(document.dangling_references().is_empty());
    for name in ["Payment", "CreditCard", "BankAccount"] {
        assert!(document.get(name).is_some(), "missing {name}");
    }
}

// ── Recursion ───────────────────────────────────────────────────────────────

#[test]
fn test_self_reference_terminates_with_one_back_reference() {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "Node",
        StructuredType::new(ContentModel::sequence(vec![
            element("value", TypeRef::builtin("string")),
            element("next", TypeRef::named("Node")).optional(),
        ])),
    ));
    let document = run(&graph, "Node");

    let node = document.get("Node").unwrap();
    let refs: Vec<&str> = node.references().iter().map(|n| n.as_str()).collect();
    assert_eq!(refs, vec!["Node"]);
    assert_eq!(object(Some(node), "Node").required, vec!["value"]);
}

#[test]
fn test_mutual_recursion_terminates() {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "Person",
        StructuredType::new(ContentModel::sequence(vec![
            element("employer", TypeRef::named("Company")).optional(),
        ])),
    ));
    graph.add_type(TypeNode::structured(
        "Company",
        StructuredType::new(ContentModel::sequence(vec![
            element("employee", TypeRef::named("Person")).optional().unbounded(),
        ])),
    ));
    let document = run(&graph, "Person");
    let names: Vec<&str> = document.names().map(SchemaName::as_str).collect();
    assert_eq!(names, vec!["Person", "Company"]);
    assert!(document.dangling_references().is_empty());
}

#[test]
fn test_depth_limit_is_reported() {
    let mut graph = TypeGraph::new();
    for i in 0..10 {
        graph.add_type(TypeNode::structured(
            format!("T{i}"),
            StructuredType::new(ContentModel::sequence(vec![element(
                "next",
                TypeRef::named(format!("T{}", i + 1)),
            )])),
        ));
    }
    graph.add_type(TypeNode::structured(
        "T10",
        StructuredType::new(ContentModel::sequence(vec![])),
    ));

    let shallow = ConvertOptions {
        max_depth: 4,
        ..ConvertOptions::default()
    };
    let err = convert(&graph, &[RootRef::type_name("T0")], &shallow).unwrap_err();
    assert!(matches!(err, ConvertError::DepthLimitExceeded { max_depth: 4, .. }));

    assert!(convert(&graph, &[RootRef::type_name("T0")], &ConvertOptions::default()).is_ok());
}

// ── Alternation ─────────────────────────────────────────────────────────────

#[test]
fn test_two_branch_alternation_shape() {
    let document = run(&payment_graph(), "Payment");
    let payment = object(document.get("Payment"), "Payment");

    assert_eq!(payment.variant_sets.len(), 1);
    let set = &payment.variant_sets[0];
    assert_eq!(set.len(), 2);
    for variant in &set.variants {
        let branch = object(Some(variant), "variant");
        assert_eq!(branch.properties.len(), 1);
        assert_eq!(branch.required.len(), 1);
    }
    assert!(!payment.is_required("creditCard"));
    assert!(!payment.is_required("bankAccount"));
    assert!(!payment.properties.contains_key("creditCard"));
}

#[test]
fn test_top_level_choice_is_bare_variant_set() {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "Contact",
        StructuredType::new(ContentModel::choice(vec![
            element("email", TypeRef::builtin("string")),
            element("phone", TypeRef::builtin("string")),
            Particle::group(ContentModel::choice(vec![
                element("fax", TypeRef::builtin("string")),
                element("telex", TypeRef::builtin("string")),
            ])),
        ])),
    ));
    let document = run(&graph, "Contact");
    let set = document.get("Contact").and_then(SchemaObject::as_variant_set).unwrap();
    assert_eq!(set.len(), 4);
}

// ── Derivation ──────────────────────────────────────────────────────────────

fn extension_graph(own_required: bool) -> TypeGraph {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "Base",
        StructuredType::new(ContentModel::sequence(vec![
            element("a", TypeRef::builtin("string")),
            element("b", TypeRef::builtin("string")).optional(),
        ])),
    ));
    let mut own = element("c", TypeRef::builtin("string"));
    if !own_required {
        own = own.optional();
    }
    graph.add_type(TypeNode::structured(
        "Derived",
        StructuredType::new(ContentModel::sequence(vec![
            own,
            element("d", TypeRef::builtin("int")),
        ]))
        .extending(TypeRef::named("Base")),
    ));
    graph
}

#[test]
fn test_extension_required_is_union() {
    let document = run(&extension_graph(true), "Derived");
    let derived = object(document.get("Derived"), "Derived");
    assert_eq!(derived.required, vec!["a", "c", "d"]);

    let relaxed = run(&extension_graph(false), "Derived");
    let relaxed = object(relaxed.get("Derived"), "Derived");
    assert_eq!(relaxed.required, vec!["a", "d"]);
    assert!(relaxed.required.iter().all(|r| derived.required.contains(r)));
    assert!(relaxed.required.len() < derived.required.len());
}

fn narrowing_graph(values: &[&str]) -> TypeGraph {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::atomic(
        "Letter",
        TypeRef::builtin("string"),
        Facets::enumeration(["A", "B", "C"]),
    ));
    graph.add_type(TypeNode::atomic(
        "Narrow",
        TypeRef::named("Letter"),
        Facets::enumeration(values.iter().copied()),
    ));
    graph
}

#[test]
fn test_narrowing_enumeration_subset() {
    let document = run(&narrowing_graph(&["A", "B"]), "Narrow");
    let narrow = document.get("Narrow").and_then(SchemaObject::as_scalar).unwrap();
    assert_eq!(narrow.constraints.enumeration, Some(vec![json!("A"), json!("B")]));

    let err = convert(
        &narrowing_graph(&["A", "D"]),
        &[RootRef::type_name("Narrow")],
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::InvalidNarrowing { .. }));
}

#[test]
fn test_extension_chain_through_registry() {
    let mut graph = extension_graph(true);
    graph.add_type(TypeNode::structured(
        "MoreDerived",
        StructuredType::new(ContentModel::sequence(vec![element(
            "e",
            TypeRef::builtin("boolean"),
        )]))
        .extending(TypeRef::named("Derived")),
    ));
    let document = run(&graph, "MoreDerived");
    let names: Vec<&str> = document.names().map(SchemaName::as_str).collect();
    assert_eq!(names, vec!["MoreDerived", "Derived", "Base"]);
    let more = object(document.get("MoreDerived"), "MoreDerived");
    let keys: Vec<&str> = more.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "c", "d", "e"]);
}

/// `Node` mentions `SpecialNode`, which extends `Node`.
fn base_referencing_derived_graph() -> TypeGraph {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "Node",
        StructuredType::new(ContentModel::sequence(vec![
            element("value", TypeRef::builtin("string")),
            element("special", TypeRef::named("SpecialNode")).optional(),
        ])),
    ));
    graph.add_type(TypeNode::structured(
        "SpecialNode",
        StructuredType::new(ContentModel::sequence(vec![element(
            "flag",
            TypeRef::builtin("boolean"),
        )]))
        .extending(TypeRef::named("Node")),
    ));
    graph
}

#[test]
fn test_base_referencing_its_derived_type() {
    let graph = base_referencing_derived_graph();

    let from_base = run(&graph, "Node");
    let names: Vec<&str> = from_base.names().map(SchemaName::as_str).collect();
    assert_eq!(names, vec!["Node", "SpecialNode"]);
    let special = object(from_base.get("SpecialNode"), "SpecialNode");
    let keys: Vec<&str> = special.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["value", "special", "flag"]);
    assert_eq!(special.required, vec!["value", "flag"]);
    assert_eq!(
        special.properties["special"].as_reference().map(SchemaName::as_str),
        Some("SpecialNode")
    );
    assert!(from_base.dangling_references().is_empty());

    let from_derived = run(&graph, "SpecialNode");
    let names: Vec<&str> = from_derived.names().map(SchemaName::as_str).collect();
    assert_eq!(names, vec!["SpecialNode", "Node"]);
    for name in ["Node", "SpecialNode"] {
        assert_eq!(from_base.get(name), from_derived.get(name), "{name} differs");
    }

    let all = convert_all(&graph, &ConvertOptions::default()).unwrap();
    assert!(all.diagnostics.is_empty());
    for name in ["Node", "SpecialNode"] {
        assert_eq!(all.document.get(name), from_base.get(name), "{name} differs");
    }
}

#[test]
fn test_derivation_cycle_is_still_rejected() {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "A",
        StructuredType::new(ContentModel::sequence(vec![element("a", TypeRef::builtin("string"))]))
            .extending(TypeRef::named("B")),
    ));
    graph.add_type(TypeNode::structured(
        "B",
        StructuredType::new(ContentModel::sequence(vec![element("b", TypeRef::builtin("string"))]))
            .extending(TypeRef::named("A")),
    ));
    let err = convert(&graph, &[RootRef::type_name("A")], &ConvertOptions::default()).unwrap_err();
    assert!(err.to_string().contains("circular type derivation"), "{err}");
}

#[test]
fn test_convert_all_independent_of_declaration_order() {
    let forward = base_referencing_derived_graph();
    let mut reversed = TypeGraph::new();
    let nodes: Vec<TypeNode> = forward.types().map(|(_, node)| node.clone()).collect();
    for node in nodes.into_iter().rev() {
        reversed.add_type(node);
    }
    for mut graph in [forward, reversed] {
        graph.add_element(ElementDecl::new("node", TypeRef::named("Node")));
        let first = convert_all(&graph, &ConvertOptions::default()).unwrap();
        let swapped = convert(
            &graph,
            &[RootRef::element("node"), RootRef::type_name("SpecialNode")],
            &ConvertOptions::default(),
        )
        .unwrap();
        for name in ["Node", "SpecialNode"] {
            assert!(first.document.get(name).is_some(), "missing {name}");
            assert_eq!(first.document.get(name), swapped.document.get(name), "{name} differs");
        }
    }
}

// ── Restriction of referenced members ───────────────────────────────────────

fn restated_member_graph() -> TypeGraph {
    let mut graph = TypeGraph::new();
    graph.add_type(TypeNode::structured(
        "Address",
        StructuredType::new(ContentModel::sequence(vec![element(
            "street",
            TypeRef::builtin("string"),
        )])),
    ));
    graph.add_type(TypeNode::structured(
        "Holder",
        StructuredType::new(ContentModel::sequence(vec![
            element("addr", TypeRef::named("Address")),
            element("code", TypeRef::named("Code")),
        ])),
    ));
    graph.add_type(TypeNode::atomic(
        "Code",
        TypeRef::builtin("string"),
        Facets::enumeration(["A", "B", "C"]),
    ));
    graph.add_type(TypeNode::atomic("Subset", TypeRef::builtin("string"), Facets::enumeration(["A", "B"])));
    graph.add_type(TypeNode::atomic("Other", TypeRef::builtin("string"), Facets::enumeration(["A", "D"])));
    graph.add_type(TypeNode::atomic("Plain", TypeRef::builtin("string"), Facets::default()));
    graph.add_type(TypeNode::atomic("Narrower", TypeRef::named("Code"), Facets::enumeration(["C"])));
    graph
}

fn restrict_holder(graph: &mut TypeGraph, name: &str, addr: TypeRef, code: TypeRef) {
    graph.add_type(TypeNode::structured(
        name,
        StructuredType::new(ContentModel::sequence(vec![
            element("addr", addr),
            element("code", code),
        ]))
        .restricting(TypeRef::named("Holder")),
    ));
}

#[test]
fn test_restriction_rejects_member_kind_change() {
    let mut graph = restated_member_graph();
    restrict_holder(&mut graph, "Flat", TypeRef::builtin("boolean"), TypeRef::named("Code"));
    let err = convert(&graph, &[RootRef::type_name("Flat")], &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidNarrowing { .. }), "{err}");
}

#[test]
fn test_restriction_of_named_atomic_member() {
    let mut graph = restated_member_graph();
    restrict_holder(&mut graph, "WithOther", TypeRef::named("Address"), TypeRef::named("Other"));
    restrict_holder(&mut graph, "WithPlain", TypeRef::named("Address"), TypeRef::named("Plain"));
    restrict_holder(&mut graph, "WithSubset", TypeRef::named("Address"), TypeRef::named("Subset"));
    restrict_holder(&mut graph, "WithNarrower", TypeRef::named("Address"), TypeRef::named("Narrower"));

    for widening in ["WithOther", "WithPlain"] {
        let err = convert(&graph, &[RootRef::type_name(widening)], &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidNarrowing { .. }), "{widening}: {err}");
    }

    for (root, target) in [("WithSubset", "Subset"), ("WithNarrower", "Narrower")] {
        let document = run(&graph, root);
        let restricted = object(document.get(root), root);
        assert_eq!(
            restricted.properties["code"].as_reference().map(SchemaName::as_str),
            Some(target)
        );
    }
}

// ── End-to-end ──────────────────────────────────────────────────────────────

#[test]
fn test_payment_end_to_end() {
    let document = run(&payment_graph(), "Payment");
    let payment = object(document.get("Payment"), "Payment");

    assert_eq!(payment.required, vec!["amount"]);
    let keys: Vec<&str> = payment.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["amount"]);
    assert_eq!(
        payment.properties["amount"].as_scalar().map(|s| s.primitive),
        Some(Primitive::Number)
    );

    let targets: Vec<Vec<&str>> = payment.variant_sets[0]
        .variants
        .iter()
        .map(|variant| {
            let branch = object(Some(variant), "variant");
            branch
                .properties
                .iter()
                .map(|(name, schema)| {
                    assert!(schema.as_reference().is_some(), "{name} should be a reference");
                    schema.as_reference().map(SchemaName::as_str).unwrap_or_default()
                })
                .collect()
        })
        .collect();
    assert_eq!(targets, vec![vec!["CreditCard"], vec!["BankAccount"]]);
    assert_eq!(document.roots, vec![SchemaName::new("Payment")]);
}

// ── Determinism ─────────────────────────────────────────────────────────────

#[test]
fn test_emission_order_is_deterministic() {
    let graph = payment_graph();
    let first = convert_all(&graph, &ConvertOptions::default()).unwrap();
    let second = convert_all(&graph, &ConvertOptions::default()).unwrap();

    let a: Vec<&str> = first.document.names().map(SchemaName::as_str).collect();
    let b: Vec<&str> = second.document.names().map(SchemaName::as_str).collect();
    assert_eq!(a, b);
    assert_eq!(a, vec!["Payment", "CreditCard", "BankAccount"]);
    assert_eq!(
        serde_json::to_string(&first.document).unwrap(),
        serde_json::to_string(&second.document).unwrap()
    );
}

// ── Collect mode ────────────────────────────────────────────────────────────

#[test]
fn test_collect_mode_isolates_defects() {
    let mut graph = payment_graph();
    graph.add_type(TypeNode::structured(
        "Broken",
        StructuredType::new(ContentModel::choice(vec![element(
            "only",
            TypeRef::builtin("string"),
        )])),
    ));
    graph.add_type(TypeNode::structured(
        "UsesBroken",
        StructuredType::new(ContentModel::sequence(vec![
            element("broken", TypeRef::named("Broken")),
            element("label", TypeRef::builtin("xs:nonsense")),
        ])),
    ));
    let options = ConvertOptions {
        diagnostics: DiagnosticsMode::Collect,
        ..ConvertOptions::default()
    };

    let result = convert_all(&graph, &options).unwrap();
    let kinds: Vec<(&str, &DiagnosticKind)> = result
        .diagnostics
        .iter()
        .map(|d| (d.schema.as_str(), &d.kind))
        .collect();
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds[0].0, "Broken");
    assert_eq!(kinds[1].0, "UsesBroken");
    assert!(matches!(kinds[1].1, DiagnosticKind::UnsupportedConstruct { .. }));
    assert!(result.document.get("Payment").and_then(SchemaObject::as_object).is_some());
    assert!(result.document.dangling_references().is_empty());

    assert!(convert_all(&graph, &ConvertOptions::default()).is_err());
}

// ── Elements and anonymous types ────────────────────────────────────────────

#[test]
fn test_anonymous_types_and_element_roots() {
    let mut graph = TypeGraph::new();
    let anonymous = graph.add_type(TypeNode::anonymous(
        "order/line",
        TypeKind::Structured(
            StructuredType::new(ContentModel::sequence(vec![element(
                "sku",
                TypeRef::builtin("string"),
            )]))
            .with_attributes(vec![AttributeDecl::new("n", TypeRef::builtin("int"))]),
        ),
    ));
    graph.add_type(TypeNode::structured(
        "Order",
        StructuredType::new(ContentModel::sequence(vec![
            element("line", TypeRef::Anonymous(anonymous)).unbounded(),
        ])),
    ));
    graph.add_element(ElementDecl::new("order", TypeRef::named("Order")));
    graph.add_element(ElementDecl::new("line", TypeRef::Anonymous(anonymous)));
    graph.add_element(ElementDecl::new("count", TypeRef::builtin("int")));

    let roots = [
        RootRef::element("order"),
        RootRef::element("line"),
        RootRef::element("count"),
    ];
    let result = convert(&graph, &roots, &ConvertOptions::default()).unwrap();
    let names: Vec<&str> = result.document.names().map(SchemaName::as_str).collect();
    assert_eq!(names, vec!["Order", "OrderLine", "count"]);
    assert_eq!(
        result.document.roots,
        vec![
            SchemaName::new("Order"),
            SchemaName::new("OrderLine"),
            SchemaName::new("count"),
        ]
    );
}
