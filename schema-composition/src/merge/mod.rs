//! Folding subgraphs, in order, into one unified schema graph.

use std::fmt;

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::error::CompositionError;
use crate::options::CompositionOptions;
use crate::routing::FetchKind;
use crate::routing::FieldRoutingEntry;
use crate::routing::FieldRoutingRegistry;
use crate::schema::DirectiveDefinition;
use crate::schema::FederationDirective;
use crate::schema::FieldCoordinate;
use crate::schema::FieldSet;
use crate::schema::KeyDirectiveDefinition;
use crate::schema::OperationKind;
use crate::schema::TypeDefinition;
use crate::schema::is_built_in_scalar;
use crate::subgraph::FederationMetadata;
use crate::subgraph::Subgraph;
use crate::utils::logging::snapshot;

mod conflict;
pub(crate) mod entity;
mod fields;
mod value_types;

/// The owning subgraph and keys of an entity's base definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub namespace: String,
    pub keys: Vec<KeyDirectiveDefinition>,
}

/// How the execution layer resolves a field contributed to an entity by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityExtensionContext {
    pub coordinate: FieldCoordinate,
    pub parent_type: Name,
    /// The subgraph whose extension contributed the field.
    pub namespace: String,
    /// The extension's keys, used to build entity representations.
    pub keys: Vec<KeyDirectiveDefinition>,
    /// Fields of the base entity to fetch before calling the extension subgraph.
    pub required_fields: Option<FieldSet>,
    /// Entity representations sent to the extension subgraph need `__typename`.
    pub requires_typename_injection: bool,
}

/// The result of composing subgraphs: one merged type map plus everything the execution layer
/// needs to route fields back to the subgraphs that own them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnifiedSchemaGraph {
    types: IndexMap<Name, TypeDefinition>,
    operation_types: IndexMap<OperationKind, Name>,
    routing: FieldRoutingRegistry,
    entities: IndexMap<Name, EntityRecord>,
    entity_extensions: IndexMap<String, Vec<TypeDefinition>>,
    federation_metadata: IndexMap<String, FederationMetadata>,
    directive_definitions: IndexMap<Name, DirectiveDefinition>,
    extension_contexts: IndexMap<FieldCoordinate, EntityExtensionContext>,
}

/// State of folding one subgraph into the graph. Dropped once the subgraph is folded.
pub(crate) struct FoldContext<'a> {
    graph: &'a mut UnifiedSchemaGraph,
    subgraph: &'a Subgraph,
    options: &'a CompositionOptions,
    /// Types merged field by field below a root operation field.
    nested_types: IndexSet<Name>,
    /// Types admitted wholesale while folding this subgraph.
    admitted_types: IndexSet<Name>,
}

impl UnifiedSchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `subgraphs` into the graph, in order. The order decides which definition is the
    /// existing one and which is incoming.
    ///
    /// Entity extensions are only registered here; [`UnifiedSchemaGraph::compose_entities`]
    /// merges them into their base entities once every subgraph is folded.
    #[instrument(skip_all)]
    pub fn fold(
        mut self,
        subgraphs: &[Subgraph],
        options: &CompositionOptions,
    ) -> Result<Self, CompositionError> {
        for subgraph in subgraphs {
            debug!("folding subgraph \"{}\"", subgraph.namespace);
            FoldContext {
                graph: &mut self,
                subgraph,
                options,
                nested_types: IndexSet::new(),
                admitted_types: IndexSet::new(),
            }
            .fold()?;
            snapshot!(self.routing, "routing after fold");
        }
        Ok(self)
    }

    pub fn types(&self) -> &IndexMap<Name, TypeDefinition> {
        &self.types
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn operation_type(&self, kind: OperationKind) -> Option<&TypeDefinition> {
        self.operation_types
            .get(&kind)
            .and_then(|name| self.types.get(name))
    }

    pub fn operation_types(&self) -> &IndexMap<OperationKind, Name> {
        &self.operation_types
    }

    pub fn routing(&self) -> &FieldRoutingRegistry {
        &self.routing
    }

    /// The routing entry of `type_name.field_name`.
    pub fn field_routing(&self, type_name: &str, field_name: &str) -> Option<&FieldRoutingEntry> {
        let type_name = Name::new(type_name).ok()?;
        let field_name = Name::new(field_name).ok()?;
        self.routing.entry(&type_name, &field_name)
    }

    pub fn entities(&self) -> &IndexMap<Name, EntityRecord> {
        &self.entities
    }

    /// Entity extensions, grouped by the namespace that declared them.
    pub fn entity_extensions(&self) -> &IndexMap<String, Vec<TypeDefinition>> {
        &self.entity_extensions
    }

    pub fn federation_metadata(&self, namespace: &str) -> Option<&FederationMetadata> {
        self.federation_metadata.get(namespace)
    }

    pub fn directive_definitions(&self) -> &IndexMap<Name, DirectiveDefinition> {
        &self.directive_definitions
    }

    pub fn extension_contexts(&self) -> &IndexMap<FieldCoordinate, EntityExtensionContext> {
        &self.extension_contexts
    }

    /// Output fields that have no routing entry. Empty for every successfully composed graph.
    pub fn unrouted_fields(&self) -> Vec<FieldCoordinate> {
        self.types
            .values()
            .filter_map(|definition| Some((definition, definition.fields()?)))
            .flat_map(|(definition, fields)| {
                fields
                    .keys()
                    .map(|field_name| FieldCoordinate::new(definition.name.clone(), field_name.clone()))
            })
            .filter(|coordinate| !self.routing.contains(coordinate))
            .collect()
    }

    /// Records a base entity. The first base definition wins; keys of later ones are added.
    fn register_entity(&mut self, definition: &TypeDefinition) {
        let keys = definition
            .directives
            .get_all(FederationDirective::Key)
            .filter_map(KeyDirectiveDefinition::from_directive);
        let record = self
            .entities
            .entry(definition.name.clone())
            .or_insert_with(|| EntityRecord {
                namespace: definition.namespace.clone(),
                keys: Vec::new(),
            });
        for key in keys {
            if !record
                .keys
                .iter()
                .any(|known| known.fingerprint == key.fingerprint)
            {
                record.keys.push(key);
            }
        }
    }

    /// Records an entity extension. Folding the same subgraph twice keeps a single copy.
    fn register_entity_extension(&mut self, definition: &TypeDefinition) {
        trace!(
            "registered extension of {} from \"{}\"",
            definition.name, definition.namespace
        );
        let extensions = self
            .entity_extensions
            .entry(definition.namespace.clone())
            .or_default();
        match extensions
            .iter_mut()
            .find(|extension| extension.name == definition.name)
        {
            Some(existing) => *existing = definition.clone(),
            None => extensions.push(definition.clone()),
        }
    }
}

impl FoldContext<'_> {
    fn namespace(&self) -> &str {
        &self.subgraph.namespace
    }

    fn fold(mut self) -> Result<(), CompositionError> {
        let subgraph = self.subgraph;
        self.merge_operation_types()?;

        if subgraph.is_federation() {
            self.merge_shared_value_types()?;
        }

        for incoming in subgraph.types.values() {
            if self.skips_shared_type_checks(incoming) {
                continue;
            }
            let Some(existing) = self.graph.types.get(&incoming.name) else {
                continue;
            };
            conflict::resolve(
                existing,
                incoming,
                subgraph.is_federation(),
                self.options.absent_field_policy,
            )?;
            if subgraph.is_federation() && existing.is_entity() && incoming.is_entity() {
                self.reconcile_entity(incoming);
            }
        }

        for incoming in subgraph.types.values() {
            if subgraph.is_operation_type(&incoming.name)
                || self.graph.types.contains_key(&incoming.name)
            {
                continue;
            }
            self.admit_type(incoming);
        }

        for (name, definition) in &subgraph.directive_definitions {
            self.graph
                .directive_definitions
                .entry(name.clone())
                .or_insert_with(|| definition.clone());
        }
        if subgraph.is_federation() {
            self.graph.federation_metadata.insert(
                subgraph.namespace.clone(),
                FederationMetadata::collect(subgraph),
            );
        }
        Ok(())
    }

    /// Merges the non-entity types this subgraph shares with the graph. Runs before conflict
    /// resolution, so what a federation subgraph adds is no longer one-sided when compared.
    fn merge_shared_value_types(&mut self) -> Result<(), CompositionError> {
        let subgraph = self.subgraph;
        for incoming in subgraph.types.values() {
            if self.skips_shared_type_checks(incoming) || incoming.is_entity() {
                continue;
            }
            let Some(existing) = self.graph.types.get(&incoming.name) else {
                continue;
            };
            // entity status mismatches are reported by the conflict resolver
            if existing.is_entity() {
                continue;
            }
            if existing.is_extension && !incoming.is_extension {
                let displaced = existing.clone();
                conflict::resolve(
                    &displaced,
                    incoming,
                    true,
                    self.options.absent_field_policy,
                )?;
                self.adopt_base_value_type(displaced, incoming);
            } else {
                self.merge_shared_value_type(incoming)?;
            }
        }
        Ok(())
    }

    /// Root operation types and the types handled while merging them are not compared again.
    fn skips_shared_type_checks(&self, incoming: &TypeDefinition) -> bool {
        self.subgraph.is_operation_type(&incoming.name)
            || self.nested_types.contains(&incoming.name)
            || self.admitted_types.contains(&incoming.name)
    }

    /// Copies a type absent from the graph into it, with STATIC routing entries for its fields.
    fn admit_type(&mut self, incoming: &TypeDefinition) {
        trace!("admitting {} from \"{}\"", incoming.name, self.namespace());
        if incoming.is_entity_extension() {
            self.graph.register_entity_extension(incoming);
        } else if incoming.is_entity() {
            self.graph.register_entity(incoming);
        }
        self.register_fields(incoming, FetchKind::Static);
        self.graph
            .types
            .insert(incoming.name.clone(), incoming.clone());
        self.admitted_types.insert(incoming.name.clone());
    }

    /// Admits `type_name` and every type reachable from it, unless already in the graph.
    fn admit_reachable_types(&mut self, type_name: &Name) {
        let subgraph = self.subgraph;
        let mut pending = vec![type_name.clone()];
        while let Some(type_name) = pending.pop() {
            if is_built_in_scalar(&type_name) || self.graph.types.contains_key(&type_name) {
                continue;
            }
            let Some(incoming) = subgraph.types.get(&type_name) else {
                continue;
            };
            self.admit_type(incoming);
            pending.extend(incoming.referenced_type_names().into_iter().cloned());
        }
    }

    fn register_fields(&mut self, definition: &TypeDefinition, fetch_kind: FetchKind) {
        let Some(fields) = definition.fields() else {
            return;
        };
        let namespace = self.subgraph.namespace.as_str();
        for field_name in fields.keys() {
            self.graph.routing.register(
                FieldCoordinate::new(definition.name.clone(), field_name.clone()),
                FieldRoutingEntry::new(namespace, fetch_kind),
            );
        }
    }
}

impl fmt::Display for UnifiedSchemaGraph {
    /// Renders the graph as SDL, root operation types first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots = OperationKind::ALL
            .into_iter()
            .filter_map(|kind| self.operation_type(kind));
        let others = self
            .types
            .values()
            .filter(|definition| !self.operation_types.values().any(|name| *name == definition.name));
        for (index, definition) in roots.chain(others).enumerate() {
            if index > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            write!(f, "{definition}")?;
        }
        Ok(())
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<UnifiedSchemaGraph>();
    assert_send_sync::<Subgraph>();
};
