use pretty_assertions::assert_eq;
use rstest::rstest;
use schema_composition::ServiceKind;
use schema_composition::Subgraph;

use super::ServiceDefinition;
use super::assert_composition_error;
use super::compose_services;

const PRODUCTS: &str = r#"
    type Query {
      topProducts: [Product]
    }

    type Product @key(fields: "id") {
      id: ID!
      name: String
    }
"#;

#[test]
fn plain_subgraphs_cannot_use_federation_directives() {
    let message = assert_composition_error(
        &[ServiceDefinition::plain("legacy", PRODUCTS)],
        "INVALID_LOCATION_FOR_FEDERATION_DIRECTIVE",
    );
    assert_eq!(
        message,
        "Directive @key on Product is not allowed in subgraph \"legacy\": it is not a federation subgraph"
    );
}

#[rstest]
#[case::external("type Query { a: String } type T { id: ID @external }")]
#[case::requires("type Query { a: String } type T { id: ID b: Int @requires(fields: \"id\") }")]
#[case::provides("type Query { t: T @provides(fields: \"id\") } type T { id: ID }")]
#[case::extends("type Query { a: String } type T @extends { id: ID }")]
fn every_federation_directive_needs_a_federation_subgraph(#[case] type_defs: &str) {
    assert_composition_error(
        &[ServiceDefinition::plain("legacy", type_defs)],
        "INVALID_LOCATION_FOR_FEDERATION_DIRECTIVE",
    );
}

#[test]
fn inaccessible_is_allowed_everywhere() {
    let graph = compose_services(&[ServiceDefinition::plain(
        "legacy",
        "type Query { a: String b: String @inaccessible }",
    )])
    .unwrap();
    assert!(graph.get_type("Query").unwrap().field("b").unwrap().is_inaccessible());
}

#[test]
fn keys_must_select_existing_fields() {
    let message = assert_composition_error(
        &[
            ServiceDefinition::federation("products", PRODUCTS),
            ServiceDefinition::federation(
                "catalog",
                r#"type Product @key(fields: "sku") { id: ID! title: String }"#,
            ),
        ],
        "INVALID_FIELD_SET_REFERENCE",
    );
    assert_eq!(
        message,
        "Invalid field set \"sku\" in @key on Product in subgraph \"catalog\": field \"sku\" does not exist on type Product"
    );
}

#[rstest]
#[case::leaf_selection(r#"type Product @key(fields: "id { value }") { id: ID! }"#)]
#[case::unbalanced_braces(r#"type Product @key(fields: "owner { id") { owner: Owner } type Owner { id: ID! }"#)]
#[case::unknown_nested_field(r#"type Product @key(fields: "owner { name }") { owner: Owner } type Owner { id: ID! }"#)]
#[case::requires_unknown_field(r#"type Product @key(fields: "id") { id: ID! total: Int @requires(fields: "price") }"#)]
#[case::provides_unknown_field(r#"type Query { product: Product @provides(fields: "title") } type Product { id: ID! }"#)]
fn field_sets_are_checked_against_the_subgraph(#[case] type_defs: &str) {
    assert_composition_error(
        &[ServiceDefinition::federation("products", type_defs)],
        "INVALID_FIELD_SET_REFERENCE",
    );
}

#[test]
fn keys_may_not_be_declared_twice() {
    let message = assert_composition_error(
        &[ServiceDefinition::federation(
            "products",
            r#"type Product @key(fields: "id sku") @key(fields: "sku  id") { id: ID! sku: String! }"#,
        )],
        "DUPLICATE_KEY",
    );
    assert_eq!(
        message,
        "Duplicate @key(fields: \"sku  id\") on type Product in subgraph \"products\""
    );
}

#[test]
fn fields_argument_may_not_be_empty() {
    let message = assert_composition_error(
        &[ServiceDefinition::federation(
            "products",
            r#"type Product @key(fields: "  ") { id: ID! }"#,
        )],
        "EMPTY_FIELDS_ARGUMENT",
    );
    assert_eq!(
        message,
        "Empty fields argument in @key on Product in subgraph \"products\""
    );
}

#[rstest]
#[case::missing(r#"type Product @key { id: ID! }"#)]
#[case::not_a_string(r#"type Product @key(fields: 3) { id: ID! }"#)]
fn fields_argument_must_be_a_string(#[case] type_defs: &str) {
    assert_composition_error(
        &[ServiceDefinition::federation("products", type_defs)],
        "MALFORMED_DIRECTIVE",
    );
}

#[test]
fn resolver_fields_take_no_arguments() {
    let message = assert_composition_error(
        &[ServiceDefinition::federation(
            "orders",
            r#"
            type Query { me: User }
            type User {
              id: ID!
              orders(first: Int): [String] @resolver(path: "orders.byUser")
            }
            "#,
        )],
        "ARGUMENT_DEFINITION_NOT_ALLOWED",
    );
    assert!(message.contains("orders in container type User"), "{message}");
}

#[test]
fn resolver_fields_without_arguments_are_accepted() {
    let graph = compose_services(&[ServiceDefinition::plain(
        "orders",
        r#"type Query { orders: [String] @resolver(path: "orders.all") }"#,
    )])
    .unwrap();
    assert!(graph.get_type("Query").unwrap().has_field("orders"));
}

#[test]
fn a_failing_subgraph_fails_the_whole_composition() {
    // the valid subgraph comes first; nothing of it may leak out
    let result = compose_services(&[
        ServiceDefinition::federation("products", PRODUCTS),
        ServiceDefinition::plain("legacy", "type Query { a: String } type T @key(fields: \"id\") { id: ID }"),
    ]);
    assert_eq!(
        result.map(|_| ()).map_err(|error| error.code()),
        Err("INVALID_LOCATION_FOR_FEDERATION_DIRECTIVE")
    );
}

#[rstest]
#[case::syntax_error("type Query { a: String")]
#[case::operation("type Query { a: String } query { a }")]
#[case::declared_twice("type Query { a: String } type Query { b: String }")]
fn invalid_schemas_are_rejected_on_parse(#[case] type_defs: &str) {
    let error = Subgraph::parse("broken", ServiceKind::Plain, type_defs).unwrap_err();
    assert!(
        matches!(error.code(), "INVALID_SDL" | "DUPLICATE_TYPE_DEFINITION"),
        "{error}"
    );
}
