use apollo_compiler::Name;
use tracing::trace;

use super::FoldContext;
use crate::error::CompositionError;
use crate::routing::FetchKind;
use crate::routing::FieldRoutingEntry;
use crate::schema::Directive;
use crate::schema::DirectiveList;
use crate::schema::FederationDirective;
use crate::schema::FieldCoordinate;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;
use crate::utils::merge_descriptions;

impl FoldContext<'_> {
    /// Merges a value type that several federation subgraphs declare. Members are only ever
    /// added: enum values, union members, implemented interfaces, output and input fields.
    pub(super) fn merge_shared_value_type(
        &mut self,
        incoming: &TypeDefinition,
    ) -> Result<(), CompositionError> {
        let name = incoming.name.clone();
        trace!("merging shared value type {name} from \"{}\"", self.subgraph.namespace);
        let Some(existing) = self.graph.types.get_mut(&name) else {
            return Ok(());
        };
        existing.description = merge_descriptions(
            existing.description.as_deref(),
            incoming.description.as_deref(),
        );

        match (&mut existing.kind, &incoming.kind) {
            (TypeKind::Enum(existing_values), TypeKind::Enum(incoming_values)) => {
                for (value_name, value) in incoming_values {
                    match existing_values.get_mut(value_name) {
                        Some(existing_value) => {
                            propagate_inaccessible(&mut existing_value.directives, &value.directives)
                        }
                        None => {
                            existing_values.insert(value_name.clone(), value.clone());
                        }
                    }
                }
                Ok(())
            }
            (TypeKind::Union(existing_members), TypeKind::Union(incoming_members)) => {
                let added = incoming_members
                    .iter()
                    .filter(|member| !existing_members.contains(*member))
                    .cloned()
                    .collect::<Vec<_>>();
                existing_members.extend(added.iter().cloned());
                for member in &added {
                    self.admit_reachable_types(member);
                }
                Ok(())
            }
            (TypeKind::Object(existing_container), TypeKind::Object(incoming_container))
            | (TypeKind::Interface(existing_container), TypeKind::Interface(incoming_container)) => {
                let added = incoming_container
                    .implements_interfaces
                    .iter()
                    .filter(|interface| !existing_container.implements_interfaces.contains(*interface))
                    .cloned()
                    .collect::<Vec<_>>();
                existing_container
                    .implements_interfaces
                    .extend(added.iter().cloned());
                if matches!(incoming.kind, TypeKind::Interface(_)) {
                    self.check_interface_implementers(&name, incoming)?;
                }
                for interface in &added {
                    self.admit_reachable_types(interface);
                }
                self.merge_shared_fields(&name, incoming)
            }
            (TypeKind::InputObject(existing_fields), TypeKind::InputObject(incoming_fields)) => {
                let added = incoming_fields
                    .values()
                    .filter(|field| !existing_fields.contains_key(&field.name))
                    .cloned()
                    .collect::<Vec<_>>();
                for field in &added {
                    existing_fields.insert(field.name.clone(), field.clone());
                }
                for field in &added {
                    self.admit_reachable_types(field.ty.inner_named_type());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Replaces a non-entity extension folded before its base definition. The base keeps its
    /// own fields STATIC; members only the extension declared are kept, and its fields stay
    /// with the subgraph that contributed them, DYNAMIC.
    pub(super) fn adopt_base_value_type(&mut self, displaced: TypeDefinition, base: &TypeDefinition) {
        let name = base.name.clone();
        trace!(
            "{name} from \"{}\" takes over the extension from \"{}\"",
            base.namespace, displaced.namespace
        );
        let mut adopted = base.clone();
        adopted.description = merge_descriptions(
            base.description.as_deref(),
            displaced.description.as_deref(),
        );
        match (&mut adopted.kind, displaced.kind) {
            (TypeKind::Object(adopted_container), TypeKind::Object(displaced_container))
            | (TypeKind::Interface(adopted_container), TypeKind::Interface(displaced_container)) => {
                adopted_container
                    .implements_interfaces
                    .extend(displaced_container.implements_interfaces);
                for (field_name, field) in displaced_container.fields {
                    match adopted_container.fields.get_mut(&field_name) {
                        Some(existing) => {
                            propagate_inaccessible(&mut existing.directives, &field.directives)
                        }
                        None => {
                            adopted_container.fields.insert(field_name, field);
                        }
                    }
                }
            }
            (TypeKind::Enum(adopted_values), TypeKind::Enum(displaced_values)) => {
                for (value_name, value) in displaced_values {
                    match adopted_values.get_mut(&value_name) {
                        Some(existing) => {
                            propagate_inaccessible(&mut existing.directives, &value.directives)
                        }
                        None => {
                            adopted_values.insert(value_name, value);
                        }
                    }
                }
            }
            (TypeKind::Union(adopted_members), TypeKind::Union(displaced_members)) => {
                adopted_members.extend(displaced_members);
            }
            (TypeKind::InputObject(adopted_fields), TypeKind::InputObject(displaced_fields)) => {
                for (field_name, field) in displaced_fields {
                    adopted_fields.entry(field_name).or_insert(field);
                }
            }
            _ => {}
        }

        if let Some(fields) = adopted.fields() {
            for field_name in fields.keys() {
                let coordinate = FieldCoordinate::new(name.clone(), field_name.clone());
                let entry = if base.has_field(field_name) {
                    FieldRoutingEntry::new(base.namespace.as_str(), FetchKind::Static)
                } else {
                    let namespace = self
                        .graph
                        .routing
                        .get(&coordinate)
                        .map_or(displaced.namespace.as_str(), |entry| entry.namespace.as_str())
                        .to_owned();
                    FieldRoutingEntry::new(namespace, FetchKind::Dynamic)
                };
                self.graph.routing.set(coordinate, entry);
            }
        }
        self.graph.types.insert(name.clone(), adopted);
        self.admitted_types.insert(name);
    }

    fn merge_shared_fields(
        &mut self,
        name: &Name,
        incoming: &TypeDefinition,
    ) -> Result<(), CompositionError> {
        let Some(incoming_fields) = incoming.fields() else {
            return Ok(());
        };
        for (field_name, field) in incoming_fields {
            let existing_field = self
                .graph
                .types
                .get_mut(name)
                .and_then(TypeDefinition::fields_mut)
                .and_then(|fields| fields.get_mut(field_name));
            match existing_field {
                Some(existing_field) => {
                    propagate_inaccessible(&mut existing_field.directives, &field.directives)
                }
                None => self.add_field(name, field, FetchKind::Dynamic),
            }
        }
        Ok(())
    }

    /// A field added to an interface must already be declared by every object type of the
    /// graph implementing that interface.
    fn check_interface_implementers(
        &self,
        interface: &Name,
        incoming: &TypeDefinition,
    ) -> Result<(), CompositionError> {
        let (Some(existing), Some(incoming_fields)) =
            (self.graph.types.get(interface), incoming.fields())
        else {
            return Ok(());
        };
        for field_name in incoming_fields.keys() {
            if existing.has_field(field_name) {
                continue;
            }
            let missing = self
                .graph
                .types
                .values()
                .filter(|definition| {
                    matches!(definition.kind, TypeKind::Object(_))
                        && definition.implements(interface)
                        && !definition.has_field(field_name)
                })
                .map(|definition| definition.name.clone())
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                return Err(CompositionError::InterfaceFieldNotImplemented {
                    interface: interface.clone(),
                    field: field_name.clone(),
                    implementers: missing,
                    namespace: self.subgraph.namespace.clone(),
                });
            }
        }
        Ok(())
    }
}

/// `@inaccessible` on any contribution hides the member; it is never removed.
fn propagate_inaccessible(existing: &mut DirectiveList, incoming: &DirectiveList) {
    if incoming.has(FederationDirective::Inaccessible)
        && !existing.has(FederationDirective::Inaccessible)
    {
        existing.push(Directive::new(apollo_compiler::name!("inaccessible")));
    }
}
