use apollo_compiler::Name;
use itertools::Itertools;

use crate::schema::FieldCoordinate;

/// Errors raised while admitting or composing subgraphs.
///
/// Every error is fatal to the composition run: the accumulator is dropped and no partial graph
/// is handed back to the caller. Messages always carry the offending type or field and the
/// namespaces involved so the source schema can be fixed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositionError {
    #[error("Type {incoming} is conflicting with existing type {existing}. {reason}")]
    TypeConflict {
        existing: String,
        incoming: String,
        reason: String,
    },
    #[error(
        "Implementing types {} do not contain the new field {field} from interface {interface} (subgraph \"{namespace}\")",
        .implementers.iter().join(",")
    )]
    InterfaceFieldNotImplemented {
        interface: Name,
        field: Name,
        implementers: Vec<Name>,
        namespace: String,
    },
    #[error(
        "Field {coordinate} is defined by subgraph \"{existing_namespace}\" and cannot be merged with the definition from subgraph \"{incoming_namespace}\": only fields of object type can be merged"
    )]
    FieldMergeNotAllowed {
        coordinate: FieldCoordinate,
        existing_namespace: String,
        incoming_namespace: String,
    },
    #[error("Invalid @{directive} on {location} in subgraph \"{namespace}\": {message}")]
    MalformedDirective {
        directive: Name,
        location: String,
        namespace: String,
        message: String,
    },
    #[error("Type {type_name} is defined more than once in subgraph \"{namespace}\"")]
    DuplicateTypeDefinition { type_name: Name, namespace: String },
    #[error("Invalid schema definition for subgraph \"{namespace}\": {message}")]
    InvalidSdl { namespace: String, message: String },
    #[error(
        "Base type does not exist for entity extension {type_name} declared in subgraph \"{namespace}\""
    )]
    EntityExtension { type_name: Name, namespace: String },
    #[error(
        "Directive @{directive} on {location} is not allowed in subgraph \"{namespace}\": it is not a federation subgraph"
    )]
    InvalidLocationForFederationDirective {
        directive: Name,
        location: String,
        namespace: String,
    },
    #[error(
        "External field {coordinate} declared in subgraph \"{namespace}\" is not found in the base type"
    )]
    ExternalFieldNotFoundInBase {
        coordinate: FieldCoordinate,
        namespace: String,
    },
    #[error(
        "Invalid field set \"{field_set}\" in @{directive} on {location} in subgraph \"{namespace}\": {message}"
    )]
    InvalidFieldSetReference {
        directive: Name,
        location: String,
        field_set: String,
        namespace: String,
        message: String,
    },
    #[error("Empty fields argument in @{directive} on {location} in subgraph \"{namespace}\"")]
    EmptyFieldsArgument {
        directive: Name,
        location: String,
        namespace: String,
    },
    #[error("Duplicate @key(fields: \"{field_set}\") on type {type_name} in subgraph \"{namespace}\"")]
    DuplicateKey {
        type_name: Name,
        field_set: String,
        namespace: String,
    },
    #[error(
        "Field {} in container type {} with resolver directive not allowed to have argument definitions (subgraph \"{namespace}\")",
        .coordinate.field_name, .coordinate.type_name
    )]
    ArgumentDefinitionNotAllowed {
        coordinate: FieldCoordinate,
        namespace: String,
    },
    #[error("Type {type_name} is in the API schema but all of its fields are @inaccessible")]
    OnlyInaccessibleFields { type_name: Name },
}

impl CompositionError {
    /// A stable, machine-readable code for the error, e.g. `TYPE_CONFLICT`.
    pub fn code(&self) -> &'static str {
        self.into()
    }
}
