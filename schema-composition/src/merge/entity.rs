//! Entities: types that several subgraphs contribute fields to, identified by `@key`.
//!
//! During the fold the base definition of an entity becomes the graph's definition whichever
//! subgraph comes first, and extensions are set aside. [`UnifiedSchemaGraph::compose_entities`]
//! then merges every extension into its base in one pass.

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::debug;
use tracing::instrument;
use tracing::trace;

use super::EntityExtensionContext;
use super::FoldContext;
use super::UnifiedSchemaGraph;
use crate::error::CompositionError;
use crate::options::CompositionOptions;
use crate::routing::FetchKind;
use crate::routing::FieldRoutingEntry;
use crate::schema::Directive;
use crate::schema::FederationDirective;
use crate::schema::FieldCoordinate;
use crate::schema::KeyDirectiveDefinition;
use crate::schema::TypeDefinition;
use crate::subgraph::validate::parse_fields_argument;
use crate::utils::logging::snapshot;

impl FoldContext<'_> {
    /// Reconciles an incoming entity with the entity of the same name already in the graph.
    pub(super) fn reconcile_entity(&mut self, incoming: &TypeDefinition) {
        let Some(existing) = self.graph.types.get(&incoming.name) else {
            return;
        };
        match (existing.is_extension, incoming.is_extension) {
            (false, true) | (true, true) => {
                trace!("{} from \"{}\" extends a known entity", incoming.name, incoming.namespace);
                self.graph.register_entity_extension(incoming);
            }
            (true, false) => {
                debug!(
                    "base definition of {} from \"{}\" replaces extension from \"{}\"",
                    incoming.name, incoming.namespace, existing.namespace
                );
                let displaced = existing.clone();
                self.graph.register_entity(incoming);
                self.graph
                    .types
                    .insert(incoming.name.clone(), incoming.clone());
                // fields the base owns were routed to the extension while it stood in for it
                if let Some(fields) = displaced.fields() {
                    for field_name in fields.keys().filter(|name| incoming.has_field(name)) {
                        self.graph.routing.reassign(
                            &FieldCoordinate::new(incoming.name.clone(), field_name.clone()),
                            &incoming.namespace,
                        );
                    }
                }
                self.register_fields(incoming, FetchKind::Static);
            }
            (false, false) => {
                self.graph.register_entity(incoming);
                let Some(fields) = incoming.fields() else {
                    return;
                };
                for field in fields.values() {
                    if !self.graph.types[&incoming.name].has_field(&field.name) {
                        self.add_field(&incoming.name, field, FetchKind::Dynamic);
                    }
                }
            }
        }
    }
}

impl UnifiedSchemaGraph {
    /// Merges every registered entity extension into its base entity, then checks the keys of
    /// every entity against its final definition.
    ///
    /// Runs once, after every subgraph is folded.
    #[instrument(skip_all)]
    pub fn compose_entities(
        mut self,
        options: &CompositionOptions,
    ) -> Result<Self, CompositionError> {
        let extensions = self
            .entity_extensions
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<_>>();
        for extension in &extensions {
            self.merge_entity_extension(extension)?;
        }
        for extension in &extensions {
            self.validate_extension_keys(extension)?;
        }
        self.validate_entity_keys()?;

        if options.strip_federation_directives {
            self.rewrite_into_pure_form();
        }
        self.validate_inaccessible_fields()?;
        snapshot!(self.extension_contexts, "entity extension contexts");
        Ok(self)
    }

    fn merge_entity_extension(&mut self, extension: &TypeDefinition) -> Result<(), CompositionError> {
        let namespace = extension.namespace.as_str();
        let missing_base = || CompositionError::EntityExtension {
            type_name: extension.name.clone(),
            namespace: namespace.to_owned(),
        };
        if !self.entities.contains_key(&extension.name) {
            return Err(missing_base());
        }
        let Some(base) = self.types.get_mut(&extension.name) else {
            return Err(missing_base());
        };
        if base.is_extension {
            return Err(missing_base());
        }
        debug!("merging extension of {} from \"{namespace}\"", extension.name);

        let Some(extension_fields) = extension.fields() else {
            return Ok(());
        };
        let keys = extension
            .directives
            .get_all(FederationDirective::Key)
            .filter_map(KeyDirectiveDefinition::from_directive)
            .collect::<Vec<_>>();

        let mut added = Vec::new();
        for field in extension_fields.values() {
            let coordinate = FieldCoordinate::new(extension.name.clone(), field.name.clone());
            match base.field(&field.name) {
                Some(_) if field.is_external() => {}
                None if field.is_external() => {
                    return Err(CompositionError::ExternalFieldNotFoundInBase {
                        coordinate,
                        namespace: namespace.to_owned(),
                    });
                }
                Some(shared) if shared.ty == field.ty => {}
                Some(shared) => {
                    return Err(CompositionError::TypeConflict {
                        existing: base.describe(),
                        incoming: extension.describe(),
                        reason: format!(
                            "Field {coordinate} has type {} in the base entity but {} in the extension.",
                            shared.ty, field.ty
                        ),
                    });
                }
                None => {
                    if let Some(fields) = base.fields_mut() {
                        fields.insert(field.name.clone(), field.clone());
                    }
                    added.push((coordinate, field));
                }
            }
        }

        for (coordinate, field) in added {
            let required_fields = match field.directives.get_all(FederationDirective::Requires).next() {
                Some(directive) => {
                    Some(parse_fields_argument(directive, &coordinate.to_string(), namespace)?)
                }
                None => None,
            };
            self.routing.set(
                coordinate.clone(),
                FieldRoutingEntry::new(namespace, FetchKind::Dynamic),
            );
            self.extension_contexts.insert(
                coordinate.clone(),
                EntityExtensionContext {
                    coordinate,
                    parent_type: extension.name.clone(),
                    namespace: namespace.to_owned(),
                    keys: keys.clone(),
                    required_fields,
                    requires_typename_injection: true,
                },
            );
        }

        self.validate_required_fields(extension)
    }

    /// `@requires` of an extension must select fields of the composed base entity.
    fn validate_required_fields(&self, extension: &TypeDefinition) -> Result<(), CompositionError> {
        let (Some(base), Some(fields)) = (self.types.get(&extension.name), extension.fields())
        else {
            return Ok(());
        };
        for field in fields.values() {
            let location = FieldCoordinate::new(extension.name.clone(), field.name.clone()).to_string();
            for directive in field.directives.get_all(FederationDirective::Requires) {
                let field_set = parse_fields_argument(directive, &location, &extension.namespace)?;
                field_set.check_references(base, &self.types).map_err(|message| {
                    CompositionError::InvalidFieldSetReference {
                        directive: directive.name.clone(),
                        location: location.clone(),
                        field_set: field_set.source.clone(),
                        namespace: extension.namespace.clone(),
                        message,
                    }
                })?;
            }
        }
        Ok(())
    }

    /// Keys an extension declares must select fields of the composed base entity.
    fn validate_extension_keys(&self, extension: &TypeDefinition) -> Result<(), CompositionError> {
        let Some(base) = self.types.get(&extension.name) else {
            return Ok(());
        };
        check_keys(base, extension, &self.types)
    }

    fn validate_entity_keys(&self) -> Result<(), CompositionError> {
        for name in self.entities.keys() {
            if let Some(entity) = self.types.get(name) {
                check_keys(entity, entity, &self.types)?;
            }
        }
        Ok(())
    }

    /// Rewrites entities into plain GraphQL types. `@inaccessible` stays.
    /// Rewrites every type as a plain definition: no extension marker and none of the
    /// directives only entities use.
    fn rewrite_into_pure_form(&mut self) {
        for definition in self.types.values_mut() {
            trace!("rewriting {} into pure form", definition.name);
            definition.is_extension = false;
            definition.directives.retain(is_kept_in_pure_form);
            if let Some(fields) = definition.fields_mut() {
                for field in fields.values_mut() {
                    field.directives.retain(is_kept_in_pure_form);
                }
            }
        }
    }

    fn validate_inaccessible_fields(&self) -> Result<(), CompositionError> {
        for definition in self.types.values() {
            let Some(fields) = definition.fields() else {
                continue;
            };
            if !fields.is_empty() && fields.values().all(|field| field.is_inaccessible()) {
                return Err(CompositionError::OnlyInaccessibleFields {
                    type_name: definition.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_kept_in_pure_form(directive: &Directive) -> bool {
    !directive
        .federation_kind()
        .is_some_and(FederationDirective::is_entity_only)
}

/// Checks the `@key` field sets `declaring` applies against the composed `entity`.
fn check_keys(
    entity: &TypeDefinition,
    declaring: &TypeDefinition,
    types: &IndexMap<Name, TypeDefinition>,
) -> Result<(), CompositionError> {
    let location = declaring.name.to_string();
    let mut fingerprints = IndexSet::new();
    for directive in declaring.directives.get_all(FederationDirective::Key) {
        let field_set = parse_fields_argument(directive, &location, &declaring.namespace)?;
        field_set
            .check_references(entity, types)
            .map_err(|message| CompositionError::InvalidFieldSetReference {
                directive: directive.name.clone(),
                location: location.clone(),
                field_set: field_set.source.clone(),
                namespace: declaring.namespace.clone(),
                message,
            })?;
        if !fingerprints.insert(field_set.fingerprint()) {
            return Err(CompositionError::DuplicateKey {
                type_name: declaring.name.clone(),
                field_set: field_set.source,
                namespace: declaring.namespace.clone(),
            });
        }
    }
    Ok(())
}
