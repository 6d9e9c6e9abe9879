mod admission;
mod conflicts;
mod entities;

use schema_composition::CompositionError;
use schema_composition::CompositionOptions;
use schema_composition::ServiceKind;
use schema_composition::Subgraph;
use schema_composition::UnifiedSchemaGraph;
use schema_composition::compose;

pub(crate) struct ServiceDefinition<'a> {
    pub(crate) name: &'a str,
    pub(crate) kind: ServiceKind,
    pub(crate) type_defs: &'a str,
}

impl<'a> ServiceDefinition<'a> {
    pub(crate) fn federation(name: &'a str, type_defs: &'a str) -> Self {
        Self {
            name,
            kind: ServiceKind::Federation,
            type_defs,
        }
    }

    pub(crate) fn plain(name: &'a str, type_defs: &'a str) -> Self {
        Self {
            name,
            kind: ServiceKind::Plain,
            type_defs,
        }
    }
}

pub(crate) fn parse_subgraphs(service_list: &[ServiceDefinition<'_>]) -> Vec<Subgraph> {
    service_list
        .iter()
        .map(|service| {
            Subgraph::parse(service.name, service.kind, service.type_defs)
                .unwrap_or_else(|error| panic!("invalid subgraph {}: {error}", service.name))
        })
        .collect()
}

pub(crate) fn compose_services(
    service_list: &[ServiceDefinition<'_>],
) -> Result<UnifiedSchemaGraph, CompositionError> {
    compose(&parse_subgraphs(service_list), &CompositionOptions::default())
}

/// Asserts that composition fails with an error of the given code and returns its message.
pub(crate) fn assert_composition_error(
    service_list: &[ServiceDefinition<'_>],
    expected_code: &str,
) -> String {
    match compose_services(service_list) {
        Ok(graph) => panic!("expected {expected_code}, composition succeeded:\n{graph}"),
        Err(error) => {
            assert_eq!(error.code(), expected_code, "unexpected error: {error}");
            error.to_string()
        }
    }
}

/// `(namespace, fetch kind)` of a field of the composed graph.
pub(crate) fn route(graph: &UnifiedSchemaGraph, type_name: &str, field_name: &str) -> (String, String) {
    let entry = graph
        .field_routing(type_name, field_name)
        .unwrap_or_else(|| panic!("{type_name}.{field_name} has no routing entry"));
    (entry.namespace.clone(), entry.fetch_kind.to_string())
}

pub(crate) fn field_names(graph: &UnifiedSchemaGraph, type_name: &str) -> Vec<String> {
    graph
        .get_type(type_name)
        .and_then(|definition| definition.fields())
        .map(|fields| fields.keys().map(ToString::to_string).collect())
        .unwrap_or_default()
}
