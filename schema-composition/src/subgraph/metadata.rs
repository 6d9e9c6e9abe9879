use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Serialize;

use super::Subgraph;
use crate::schema::FederationDirective;
use crate::schema::FieldCoordinate;
use crate::schema::FieldSet;
use crate::schema::KeyDirectiveDefinition;
use crate::schema::field_set::FieldsArgument;
use crate::schema::field_set::fields_argument;

/// Federation directives of one subgraph, parsed once at admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FederationMetadata {
    /// Keys of every entity, base or extension.
    pub keys: IndexMap<Name, Vec<KeyDirectiveDefinition>>,
    /// Entity types this subgraph extends rather than owns.
    pub extensions: IndexSet<Name>,
    pub external_fields: IndexSet<FieldCoordinate>,
    pub requires: IndexMap<FieldCoordinate, FieldSet>,
    pub provides: IndexMap<FieldCoordinate, FieldSet>,
}

impl FederationMetadata {
    /// Collects the metadata of a subgraph that passed admission validation.
    pub(crate) fn collect(subgraph: &Subgraph) -> Self {
        let mut metadata = Self::default();
        for definition in subgraph.types.values() {
            if definition.is_entity() {
                let keys = definition
                    .directives
                    .get_all(FederationDirective::Key)
                    .filter_map(KeyDirectiveDefinition::from_directive)
                    .collect();
                metadata.keys.insert(definition.name.clone(), keys);
                if definition.is_extension {
                    metadata.extensions.insert(definition.name.clone());
                }
            }
            let Some(fields) = definition.fields() else {
                continue;
            };
            for field in fields.values() {
                let coordinate = FieldCoordinate::new(definition.name.clone(), field.name.clone());
                if field.is_external() {
                    metadata.external_fields.insert(coordinate.clone());
                }
                for directive in field.directives.iter() {
                    let target = match directive.federation_kind() {
                        Some(FederationDirective::Requires) => &mut metadata.requires,
                        Some(FederationDirective::Provides) => &mut metadata.provides,
                        _ => continue,
                    };
                    if let FieldsArgument::Present(source) = fields_argument(directive) {
                        if let Ok(field_set) = FieldSet::parse(source) {
                            target.insert(coordinate.clone(), field_set);
                        }
                    }
                }
            }
        }
        metadata
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
            && self.external_fields.is_empty()
            && self.requires.is_empty()
            && self.provides.is_empty()
    }
}
