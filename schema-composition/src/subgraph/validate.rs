//! Admission checks run on each subgraph on its own, before anything is folded.

use indexmap::IndexSet;
use tracing::debug;

use super::Subgraph;
use crate::error::CompositionError;
use crate::schema::Directive;
use crate::schema::FederationDirective;
use crate::schema::FieldCoordinate;
use crate::schema::FieldDefinition;
use crate::schema::FieldSet;
use crate::schema::TypeDefinition;
use crate::schema::field_set::FieldSetParseError;
use crate::schema::field_set::FieldsArgument;
use crate::schema::field_set::fields_argument;

pub(crate) fn validate_subgraph(subgraph: &Subgraph) -> Result<(), CompositionError> {
    debug!("validating subgraph \"{}\"", subgraph.namespace);
    for definition in subgraph.types.values() {
        let location = definition.name.to_string();
        for directive in definition.directives.iter() {
            check_directive_location(subgraph, directive, &location)?;
        }
        validate_keys(subgraph, definition)?;

        let Some(fields) = definition.fields() else {
            continue;
        };
        for field in fields.values() {
            let coordinate = FieldCoordinate::new(definition.name.clone(), field.name.clone());
            validate_field(subgraph, definition, field, &coordinate)?;
        }
    }
    Ok(())
}

fn validate_field(
    subgraph: &Subgraph,
    parent: &TypeDefinition,
    field: &FieldDefinition,
    coordinate: &FieldCoordinate,
) -> Result<(), CompositionError> {
    let location = coordinate.to_string();
    for directive in field.directives.iter() {
        check_directive_location(subgraph, directive, &location)?;
        match directive.federation_kind() {
            Some(FederationDirective::Requires) => {
                let field_set = parse_fields_argument(directive, &location, &subgraph.namespace)?;
                // Fields required by an extension live in the base type, which is only known once
                // every subgraph is folded in.
                if !parent.is_extension {
                    check_field_set_references(
                        directive,
                        &field_set,
                        parent,
                        subgraph,
                        &location,
                    )?;
                }
            }
            Some(FederationDirective::Provides) => {
                let field_set = parse_fields_argument(directive, &location, &subgraph.namespace)?;
                if let Some(provided) = subgraph.types.get(field.ty.inner_named_type()) {
                    check_field_set_references(directive, &field_set, provided, subgraph, &location)?;
                }
            }
            Some(FederationDirective::Resolver) if !field.arguments.is_empty() => {
                return Err(CompositionError::ArgumentDefinitionNotAllowed {
                    coordinate: coordinate.clone(),
                    namespace: subgraph.namespace.clone(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_keys(subgraph: &Subgraph, definition: &TypeDefinition) -> Result<(), CompositionError> {
    let location = definition.name.to_string();
    let mut fingerprints = IndexSet::new();
    for directive in definition.directives.get_all(FederationDirective::Key) {
        let field_set = parse_fields_argument(directive, &location, &subgraph.namespace)?;
        check_field_set_references(directive, &field_set, definition, subgraph, &location)?;
        if !fingerprints.insert(field_set.fingerprint()) {
            return Err(CompositionError::DuplicateKey {
                type_name: definition.name.clone(),
                field_set: field_set.source,
                namespace: subgraph.namespace.clone(),
            });
        }
    }
    Ok(())
}

fn check_directive_location(
    subgraph: &Subgraph,
    directive: &Directive,
    location: &str,
) -> Result<(), CompositionError> {
    let federation_only = directive
        .federation_kind()
        .is_some_and(FederationDirective::requires_federation);
    if federation_only && !subgraph.is_federation() {
        return Err(CompositionError::InvalidLocationForFederationDirective {
            directive: directive.name.clone(),
            location: location.to_owned(),
            namespace: subgraph.namespace.clone(),
        });
    }
    Ok(())
}

fn check_field_set_references(
    directive: &Directive,
    field_set: &FieldSet,
    parent: &TypeDefinition,
    subgraph: &Subgraph,
    location: &str,
) -> Result<(), CompositionError> {
    field_set
        .check_references(parent, &subgraph.types)
        .map_err(|message| CompositionError::InvalidFieldSetReference {
            directive: directive.name.clone(),
            location: location.to_owned(),
            field_set: field_set.source.clone(),
            namespace: subgraph.namespace.clone(),
            message,
        })
}

/// Reads and parses the `fields` argument of `@key`, `@requires` or `@provides`.
pub(crate) fn parse_fields_argument(
    directive: &Directive,
    location: &str,
    namespace: &str,
) -> Result<FieldSet, CompositionError> {
    let malformed = |message: &str| CompositionError::MalformedDirective {
        directive: directive.name.clone(),
        location: location.to_owned(),
        namespace: namespace.to_owned(),
        message: message.to_owned(),
    };
    let source = match fields_argument(directive) {
        FieldsArgument::Missing => return Err(malformed("missing \"fields\" argument")),
        FieldsArgument::NotAString => {
            return Err(malformed("the \"fields\" argument must be a string"));
        }
        FieldsArgument::Present(source) => source,
    };
    FieldSet::parse(source).map_err(|error| match error {
        FieldSetParseError::Empty => CompositionError::EmptyFieldsArgument {
            directive: directive.name.clone(),
            location: location.to_owned(),
            namespace: namespace.to_owned(),
        },
        FieldSetParseError::Invalid(message) => CompositionError::InvalidFieldSetReference {
            directive: directive.name.clone(),
            location: location.to_owned(),
            field_set: source.to_owned(),
            namespace: namespace.to_owned(),
            message,
        },
    })
}
