use apollo_compiler::Name;
use tracing::debug;
use tracing::trace;

use super::FoldContext;
use crate::error::CompositionError;
use crate::routing::FetchKind;
use crate::routing::FieldRoutingEntry;
use crate::schema::FieldCoordinate;
use crate::schema::FieldDefinition;
use crate::schema::FieldsContainer;
use crate::schema::OperationKind;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;
use crate::schema::field_type_names;
use crate::utils::merge_descriptions;

impl FoldContext<'_> {
    /// Merges the fields of each incoming root operation type into the graph's root type of the
    /// same kind, creating it on first sight.
    pub(super) fn merge_operation_types(&mut self) -> Result<(), CompositionError> {
        let subgraph = self.subgraph;
        for kind in OperationKind::ALL {
            let Some(incoming) = subgraph.operation_type(kind) else {
                continue;
            };
            let root_name = match self.graph.operation_types.get(&kind) {
                Some(name) => name.clone(),
                None => {
                    let name = kind.default_type_name();
                    let root = TypeDefinition::new(
                        name.clone(),
                        subgraph.namespace.clone(),
                        TypeKind::Object(FieldsContainer::default()),
                    );
                    self.graph.types.insert(name.clone(), root);
                    self.graph.operation_types.insert(kind, name.clone());
                    name
                }
            };
            debug!(
                "merging {} fields of \"{}\" into {root_name}",
                incoming.name, subgraph.namespace
            );
            if let Some(root) = self.graph.types.get_mut(&root_name) {
                root.description = merge_descriptions(
                    root.description.as_deref(),
                    incoming.description.as_deref(),
                );
            }
            let Some(fields) = incoming.fields() else {
                continue;
            };
            for field in fields.values() {
                self.merge_field(&root_name, field)?;
            }
        }
        Ok(())
    }

    /// Merges one incoming field into the field of the same name on `parent`, or adds it.
    ///
    /// Fields returning the same object or interface type are merged recursively. Any other
    /// pair of same-named fields must come from the same subgraph with the same type.
    pub(super) fn merge_field(
        &mut self,
        parent: &Name,
        incoming: &FieldDefinition,
    ) -> Result<(), CompositionError> {
        let subgraph = self.subgraph;
        let coordinate = FieldCoordinate::new(parent.clone(), incoming.name.clone());
        let Some(existing) = self
            .graph
            .types
            .get(parent)
            .and_then(|definition| definition.field(&incoming.name))
            .cloned()
        else {
            self.add_field(parent, incoming, FetchKind::Dynamic);
            return Ok(());
        };

        let existing_type = self.graph.types.get(existing.ty.inner_named_type());
        let incoming_type = subgraph.types.get(incoming.ty.inner_named_type());
        match (existing_type, incoming_type) {
            (Some(existing_type), Some(incoming_type))
                if is_mergeable(existing_type) && is_mergeable(incoming_type) =>
            {
                if existing.ty != incoming.ty
                    || !existing_type.same_kind_as(incoming_type)
                {
                    return Err(CompositionError::TypeConflict {
                        existing: existing_type.describe(),
                        incoming: incoming_type.describe(),
                        reason: format!(
                            "Field {coordinate} returns {} in the graph but {} in subgraph \"{}\".",
                            existing.ty, incoming.ty, subgraph.namespace
                        ),
                    });
                }
                let type_name = existing_type.name.clone();
                self.promote(&coordinate, &type_name);
                self.merge_nested_type(&type_name, incoming_type)
            }
            _ => {
                let existing_namespace = self
                    .graph
                    .routing
                    .get(&coordinate)
                    .map(|entry| entry.namespace.clone())
                    .unwrap_or_default();
                if existing_namespace == subgraph.namespace && existing.ty == incoming.ty {
                    return Ok(());
                }
                Err(CompositionError::FieldMergeNotAllowed {
                    coordinate,
                    existing_namespace,
                    incoming_namespace: subgraph.namespace.clone(),
                })
            }
        }
    }

    /// Adds a field absent from `parent`, routed to the incoming subgraph, and admits the types
    /// it refers to.
    pub(super) fn add_field(&mut self, parent: &Name, field: &FieldDefinition, fetch_kind: FetchKind) {
        if let Some(fields) = self
            .graph
            .types
            .get_mut(parent)
            .and_then(TypeDefinition::fields_mut)
        {
            fields.insert(field.name.clone(), field.clone());
        }
        self.graph.routing.register(
            FieldCoordinate::new(parent.clone(), field.name.clone()),
            FieldRoutingEntry::new(self.subgraph.namespace.clone(), fetch_kind),
        );
        for type_name in field_type_names(field) {
            self.admit_reachable_types(type_name);
        }
    }

    /// Merges the fields of an incoming type reached through a root operation field into the
    /// graph's type of the same name. Each type is merged at most once per subgraph, which also
    /// stops the recursion on cyclic types.
    fn merge_nested_type(
        &mut self,
        type_name: &Name,
        incoming: &TypeDefinition,
    ) -> Result<(), CompositionError> {
        if !self.nested_types.insert(type_name.clone()) {
            return Ok(());
        }
        trace!("merging nested type {type_name} from \"{}\"", self.subgraph.namespace);

        let incoming_interfaces = match &incoming.kind {
            TypeKind::Object(container) | TypeKind::Interface(container) => {
                container.implements_interfaces.clone()
            }
            _ => Default::default(),
        };
        if let Some(existing) = self.graph.types.get_mut(type_name) {
            existing.description = merge_descriptions(
                existing.description.as_deref(),
                incoming.description.as_deref(),
            );
            if let TypeKind::Object(container) | TypeKind::Interface(container) = &mut existing.kind
            {
                container
                    .implements_interfaces
                    .extend(incoming_interfaces.iter().cloned());
            }
        }
        for interface in &incoming_interfaces {
            self.admit_reachable_types(interface);
        }

        let Some(fields) = incoming.fields() else {
            return Ok(());
        };
        for field in fields.values() {
            self.merge_field(type_name, field)?;
        }
        Ok(())
    }

    /// Marks a field whose return type now spans several subgraphs as STATIC. The field's
    /// previous entry moves down to the fields of its return type, which the previous owner
    /// still resolves.
    fn promote(&mut self, coordinate: &FieldCoordinate, return_type: &Name) {
        let Some(entry) = self.graph.routing.get(coordinate) else {
            return;
        };
        if entry.is_static() || entry.namespace == self.subgraph.namespace {
            return;
        }
        let Some(previous) = self.graph.routing.promote(coordinate) else {
            return;
        };
        let children = self
            .graph
            .types
            .get(return_type)
            .and_then(TypeDefinition::fields)
            .map(|fields| fields.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        for child in children {
            self.graph.routing.set(
                FieldCoordinate::new(return_type.clone(), child),
                previous.clone(),
            );
        }
    }
}

/// Object and interface types are merged field by field. Entities are not: their fields come
/// together through entity composition instead.
fn is_mergeable(definition: &TypeDefinition) -> bool {
    definition.fields().is_some() && !definition.is_entity()
}
