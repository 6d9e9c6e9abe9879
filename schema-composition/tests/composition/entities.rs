use pretty_assertions::assert_eq;
use rstest::rstest;
use schema_composition::CompositionOptions;
use schema_composition::UnifiedSchemaGraph;
use schema_composition::compose;
use schema_composition::schema::FederationDirective;

use super::ServiceDefinition;
use super::assert_composition_error;
use super::compose_services;
use super::field_names;
use super::parse_subgraphs;
use super::route;

const PRODUCTS: &str = r#"
    type Query {
      topProducts: [Product]
    }

    type Product @key(fields: "id") {
      id: ID!
      name: String
    }
"#;

const PRICING: &str = r#"
    type Product @extends @key(fields: "id") {
      id: ID! @external
      price: Float
    }
"#;

fn products() -> ServiceDefinition<'static> {
    ServiceDefinition::federation("products", PRODUCTS)
}

fn pricing() -> ServiceDefinition<'static> {
    ServiceDefinition::federation("pricing", PRICING)
}

#[rstest]
#[case::base_first(&[products(), pricing()])]
#[case::extension_first(&[pricing(), products()])]
fn extension_fields_join_the_base_entity(#[case] services: &[ServiceDefinition<'_>]) {
    let graph = compose_services(services).unwrap();

    assert_eq!(field_names(&graph, "Product"), ["id", "name", "price"]);
    assert_eq!(route(&graph, "Product", "id"), ("products".to_owned(), "STATIC".to_owned()));
    assert_eq!(route(&graph, "Product", "name"), ("products".to_owned(), "STATIC".to_owned()));
    assert_eq!(route(&graph, "Product", "price"), ("pricing".to_owned(), "DYNAMIC".to_owned()));
    assert_eq!(graph.entities()["Product"].namespace, "products");
    assert!(graph.unrouted_fields().is_empty());
}

#[test]
fn composition_is_order_independent_for_entities() {
    let base_first = compose_services(&[products(), pricing()]).unwrap();
    let extension_first = compose_services(&[pricing(), products()]).unwrap();

    assert_eq!(base_first.get_type("Product"), extension_first.get_type("Product"));
    assert_eq!(base_first.routing(), extension_first.routing());
    assert_eq!(base_first.extension_contexts(), extension_first.extension_contexts());
}

#[test]
fn composed_entities_are_plain_types() {
    let graph = compose_services(&[products(), pricing()]).unwrap();
    insta::assert_snapshot!(graph.to_string(), @r###"
    type Query {
      topProducts: [Product]
    }

    type Product {
      id: ID!
      name: String
      price: Float
    }
    "###);
}

#[test]
fn federation_directives_can_be_kept() {
    let options = CompositionOptions {
        strip_federation_directives: false,
        ..Default::default()
    };
    let graph = compose(&parse_subgraphs(&[products(), pricing()]), &options).unwrap();
    let product = graph.get_type("Product").unwrap();
    assert!(product.directives.has(FederationDirective::Key));
    assert!(!product.is_extension);
}

#[test]
fn extension_fields_carry_an_execution_context() {
    let reviews = ServiceDefinition::federation(
        "reviews",
        r#"
        extend type Product @key(fields: "id") {
          id: ID! @external
          name: String @external
          summary: String @requires(fields: "name")
        }
        "#,
    );
    let graph = compose_services(&[products(), reviews]).unwrap();

    let context = graph
        .extension_contexts()
        .values()
        .find(|context| context.coordinate.to_string() == "Product.summary")
        .unwrap();
    assert_eq!(context.namespace, "reviews");
    assert!(context.requires_typename_injection);
    assert_eq!(context.keys[0].fingerprint, "id");
    assert_eq!(
        context.required_fields.as_ref().map(|set| set.source.as_str()),
        Some("name")
    );
    assert_eq!(graph.extension_contexts().len(), 1);
}

#[test]
fn several_extensions_of_one_entity() {
    let inventory = ServiceDefinition::federation(
        "inventory",
        r#"
        extend type Product @key(fields: "id") {
          id: ID! @external
          inStock: Boolean
        }
        "#,
    );
    let graph = compose_services(&[pricing(), inventory, products()]).unwrap();

    assert_eq!(field_names(&graph, "Product"), ["id", "name", "price", "inStock"]);
    assert_eq!(route(&graph, "Product", "inStock"), ("inventory".to_owned(), "DYNAMIC".to_owned()));
    assert_eq!(graph.entity_extensions().len(), 2);
}

#[test]
fn two_base_definitions_share_an_entity() {
    let catalog = ServiceDefinition::federation(
        "catalog",
        r#"
        type Product @key(fields: "id") {
          id: ID!
          description: String
        }
        "#,
    );
    let graph = compose_services(&[products(), catalog]).unwrap();

    assert_eq!(field_names(&graph, "Product"), ["id", "name", "description"]);
    assert_eq!(route(&graph, "Product", "description"), ("catalog".to_owned(), "DYNAMIC".to_owned()));
    assert_eq!(route(&graph, "Product", "id"), ("products".to_owned(), "STATIC".to_owned()));
}

#[test]
fn extension_without_base_is_rejected() {
    let message = assert_composition_error(&[pricing()], "ENTITY_EXTENSION");
    assert_eq!(
        message,
        "Base type does not exist for entity extension Product declared in subgraph \"pricing\""
    );
}

#[test]
fn external_fields_must_exist_on_the_base() {
    let shipping = ServiceDefinition::federation(
        "shipping",
        r#"
        extend type Product @key(fields: "id") {
          id: ID! @external
          weight: Int @external
          estimate: Int @requires(fields: "weight")
        }
        "#,
    );
    let message = assert_composition_error(&[products(), shipping], "EXTERNAL_FIELD_NOT_FOUND_IN_BASE");
    assert!(message.contains("Product.weight"), "{message}");
}

#[test]
fn extension_fields_must_match_base_fields() {
    let pricing = ServiceDefinition::federation(
        "pricing",
        r#"
        extend type Product @key(fields: "id") {
          id: ID! @external
          name: Int
        }
        "#,
    );
    assert_composition_error(&[products(), pricing], "TYPE_CONFLICT");
}

#[test]
fn extension_keys_over_fields_unknown_to_the_base() {
    let pricing = ServiceDefinition::federation(
        "pricing",
        r#"
        extend type Product @key(fields: "sku") {
          sku: String! @external
          price: Float
        }
        "#,
    );
    assert_composition_error(&[products(), pricing], "EXTERNAL_FIELD_NOT_FOUND_IN_BASE");
}

#[test]
fn entity_status_must_agree() {
    let plain_product = ServiceDefinition::federation(
        "legacy",
        r#"
        type Product {
          id: ID!
        }
        "#,
    );
    assert_composition_error(&[products(), plain_product], "TYPE_CONFLICT");
}

#[test]
fn types_with_only_inaccessible_fields_are_rejected() {
    let secrets = ServiceDefinition::federation(
        "secrets",
        r#"
        type Query {
          secret: Secret
        }

        type Secret {
          value: String @inaccessible
        }
        "#,
    );
    let message = assert_composition_error(&[secrets], "ONLY_INACCESSIBLE_FIELDS");
    assert!(message.contains("Secret"), "{message}");
}

#[test]
fn inaccessible_survives_pure_form() {
    let pricing = ServiceDefinition::federation(
        "pricing",
        r#"
        extend type Product @key(fields: "id") {
          id: ID! @external
          cost: Float @inaccessible
        }
        "#,
    );
    let graph: UnifiedSchemaGraph = compose_services(&[products(), pricing]).unwrap();
    let product = graph.get_type("Product").unwrap();
    assert!(product.field("cost").unwrap().is_inaccessible());
    assert!(!product.field("id").unwrap().is_external());
}
