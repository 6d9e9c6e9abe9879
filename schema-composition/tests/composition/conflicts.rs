use pretty_assertions::assert_eq;
use rstest::rstest;
use schema_composition::AbsentFieldPolicy;
use schema_composition::CompositionOptions;
use schema_composition::compose;

use super::ServiceDefinition;
use super::assert_composition_error;
use super::compose_services;
use super::field_names;
use super::parse_subgraphs;
use super::route;

const QUERY: &str = "type Query { ping: String }";

#[test]
fn conflicting_field_types_are_reported_with_both_origins() {
    let message = assert_composition_error(
        &[
            ServiceDefinition::plain("a", "type Query { ping: String } type Thing { x: Int }"),
            ServiceDefinition::plain("b", "type Thing { x: String }"),
        ],
        "TYPE_CONFLICT",
    );
    assert_eq!(
        message,
        "Type [name:Thing, kind:Object, namespace:b] is conflicting with existing type \
         [name:Thing, kind:Object, namespace:a]. Field x has type Int in the existing type but \
         String in the incoming one."
    );
}

#[test]
fn the_first_registrant_is_the_existing_type() {
    let message = assert_composition_error(
        &[
            ServiceDefinition::plain("b", "type Query { ping: String } type Thing { x: String }"),
            ServiceDefinition::plain("a", "type Thing { x: Int }"),
        ],
        "TYPE_CONFLICT",
    );
    assert!(message.starts_with("Type [name:Thing, kind:Object, namespace:a]"), "{message}");
}

#[rstest]
#[case::object_and_interface("type Thing { x: Int }", "interface Thing { x: Int }")]
#[case::enum_and_scalar("enum Thing { A B }", "scalar Thing")]
#[case::union_and_input("union Thing = Query", "input Thing { x: Int }")]
fn kinds_must_agree(#[case] first: &str, #[case] second: &str) {
    let first = format!("{QUERY} {first}");
    let message = assert_composition_error(
        &[
            ServiceDefinition::plain("a", &first),
            ServiceDefinition::plain("b", second),
        ],
        "TYPE_CONFLICT",
    );
    assert!(message.contains("Type kinds differ"), "{message}");
}

#[test]
fn plain_subgraphs_must_declare_the_same_fields() {
    let message = assert_composition_error(
        &[
            ServiceDefinition::plain("a", "type Query { ping: String } type Thing { x: Int }"),
            ServiceDefinition::plain("b", "type Thing { x: Int y: Int }"),
        ],
        "TYPE_CONFLICT",
    );
    assert!(message.ends_with("Field y: Int is only declared by one of them."), "{message}");
}

#[test]
fn identical_plain_types_keep_the_first_routing() {
    let graph = compose_services(&[
        ServiceDefinition::plain("a", "type Query { ping: String } type Thing { x: Int }"),
        ServiceDefinition::plain("b", "type Thing { x: Int }"),
    ])
    .unwrap();

    assert_eq!(route(&graph, "Thing", "x"), ("a".to_owned(), "STATIC".to_owned()));
    assert_eq!(graph.get_type("Thing").unwrap().namespace, "a");
}

#[test]
fn federation_subgraphs_may_add_nullable_fields() {
    let graph = compose_services(&[
        ServiceDefinition::federation("a", "type Query { ping: String } type Thing { x: Int }"),
        ServiceDefinition::federation("b", "type Thing { x: Int y: Int }"),
    ])
    .unwrap();

    assert_eq!(field_names(&graph, "Thing"), ["x", "y"]);
    assert_eq!(route(&graph, "Thing", "x"), ("a".to_owned(), "STATIC".to_owned()));
    assert_eq!(route(&graph, "Thing", "y"), ("b".to_owned(), "DYNAMIC".to_owned()));
}

#[test]
fn one_sided_non_null_fields_are_rejected_by_default() {
    let message = assert_composition_error(
        &[
            ServiceDefinition::federation(
                "a",
                "type Query { ping: String } type Thing { x: Int y: Int! }",
            ),
            ServiceDefinition::federation("b", "type Thing { x: Int }"),
        ],
        "TYPE_CONFLICT",
    );
    assert!(message.ends_with("Field y: Int! is only declared by one of them."), "{message}");
}

#[test]
fn one_sided_non_null_fields_can_be_allowed() {
    let options = CompositionOptions {
        absent_field_policy: AbsentFieldPolicy::Allow,
        ..Default::default()
    };
    let subgraphs = parse_subgraphs(&[
        ServiceDefinition::federation(
            "a",
            "type Query { ping: String } type Thing { x: Int y: Int! }",
        ),
        ServiceDefinition::federation("b", "type Thing { x: Int }"),
    ]);
    let graph = compose(&subgraphs, &options).unwrap();
    assert_eq!(field_names(&graph, "Thing"), ["x", "y"]);
    assert_eq!(route(&graph, "Thing", "y"), ("a".to_owned(), "STATIC".to_owned()));
}

#[test]
fn a_plain_subgraph_cannot_add_fields_to_a_federation_type() {
    assert_composition_error(
        &[
            ServiceDefinition::federation("a", "type Query { ping: String } type Thing { x: Int }"),
            ServiceDefinition::plain("b", "type Thing { x: Int y: Int }"),
        ],
        "TYPE_CONFLICT",
    );
}

#[test]
fn shared_field_types_must_match_in_federation() {
    assert_composition_error(
        &[
            ServiceDefinition::federation("a", "type Query { ping: String } type Thing { x: Int }"),
            ServiceDefinition::federation("b", "type Thing { x: Int! }"),
        ],
        "TYPE_CONFLICT",
    );
}

#[rstest]
#[case::enum_values("enum Color { RED GREEN }", "enum Color { RED BLUE }")]
#[case::union_members(
    "union Pet = Cat | Dog type Cat { name: String } type Dog { name: String }",
    "union Pet = Cat type Cat { name: String }"
)]
fn plain_value_types_must_be_identical(#[case] first: &str, #[case] second: &str) {
    let first = format!("{QUERY} {first}");
    assert_composition_error(
        &[
            ServiceDefinition::plain("a", &first),
            ServiceDefinition::plain("b", second),
        ],
        "TYPE_CONFLICT",
    );
}

#[test]
fn input_types_are_compared_field_by_field() {
    assert_composition_error(
        &[
            ServiceDefinition::plain("a", "type Query { ping: String } input Filter { term: String }"),
            ServiceDefinition::plain("b", "input Filter { term: [String] }"),
        ],
        "TYPE_CONFLICT",
    );
}
