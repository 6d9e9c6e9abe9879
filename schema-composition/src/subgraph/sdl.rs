use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::trace;

use super::Subgraph;
use crate::error::CompositionError;
use crate::schema::DirectiveDefinition;
use crate::schema::DirectiveList;
use crate::schema::EnumValueDefinition;
use crate::schema::FederationDirective;
use crate::schema::FieldDefinition;
use crate::schema::FieldsContainer;
use crate::schema::InputValueDefinition;
use crate::schema::OperationKind;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;

pub(super) fn parse(mut subgraph: Subgraph, sdl: &str) -> Result<Subgraph, CompositionError> {
    let document = ast::Document::parse(sdl, subgraph.namespace.as_str()).map_err(|invalid| {
        CompositionError::InvalidSdl {
            namespace: subgraph.namespace.clone(),
            message: invalid.errors.to_string(),
        }
    })?;

    // Extensions are applied once every definition of the document is known, so that
    // `extend type` may appear before the type it extends.
    let mut extensions = Vec::new();
    for definition in &document.definitions {
        let converted = match definition {
            ast::Definition::SchemaDefinition(schema) => {
                add_root_operations(&mut subgraph, &schema.root_operations);
                continue;
            }
            ast::Definition::SchemaExtension(schema) => {
                add_root_operations(&mut subgraph, &schema.root_operations);
                continue;
            }
            ast::Definition::DirectiveDefinition(directive) => {
                subgraph
                    .directive_definitions
                    .insert(directive.name.clone(), convert_directive_definition(directive));
                continue;
            }
            ast::Definition::OperationDefinition(_) | ast::Definition::FragmentDefinition(_) => {
                return Err(CompositionError::InvalidSdl {
                    namespace: subgraph.namespace.clone(),
                    message: "executable definitions are not allowed in a schema".to_owned(),
                });
            }
            ast::Definition::ScalarTypeDefinition(scalar) => TypeDefinition {
                description: description(&scalar.description),
                directives: (&scalar.directives).into(),
                ..TypeDefinition::new(scalar.name.clone(), "", TypeKind::Scalar)
            },
            ast::Definition::ObjectTypeDefinition(object) => TypeDefinition {
                description: description(&object.description),
                directives: (&object.directives).into(),
                ..TypeDefinition::new(
                    object.name.clone(),
                    "",
                    TypeKind::Object(fields_container(&object.implements_interfaces, &object.fields)),
                )
            },
            ast::Definition::InterfaceTypeDefinition(interface) => TypeDefinition {
                description: description(&interface.description),
                directives: (&interface.directives).into(),
                ..TypeDefinition::new(
                    interface.name.clone(),
                    "",
                    TypeKind::Interface(fields_container(
                        &interface.implements_interfaces,
                        &interface.fields,
                    )),
                )
            },
            ast::Definition::UnionTypeDefinition(union) => TypeDefinition {
                description: description(&union.description),
                directives: (&union.directives).into(),
                ..TypeDefinition::new(
                    union.name.clone(),
                    "",
                    TypeKind::Union(union.members.iter().cloned().collect()),
                )
            },
            ast::Definition::EnumTypeDefinition(enum_type) => TypeDefinition {
                description: description(&enum_type.description),
                directives: (&enum_type.directives).into(),
                ..TypeDefinition::new(
                    enum_type.name.clone(),
                    "",
                    TypeKind::Enum(enum_values(&enum_type.values)),
                )
            },
            ast::Definition::InputObjectTypeDefinition(input) => TypeDefinition {
                description: description(&input.description),
                directives: (&input.directives).into(),
                ..TypeDefinition::new(
                    input.name.clone(),
                    "",
                    TypeKind::InputObject(input_fields(&input.fields)),
                )
            },
            ast::Definition::ScalarTypeExtension(scalar) => {
                extensions.push(extension(scalar.name.clone(), &scalar.directives, TypeKind::Scalar));
                continue;
            }
            ast::Definition::ObjectTypeExtension(object) => {
                extensions.push(extension(
                    object.name.clone(),
                    &object.directives,
                    TypeKind::Object(fields_container(&object.implements_interfaces, &object.fields)),
                ));
                continue;
            }
            ast::Definition::InterfaceTypeExtension(interface) => {
                extensions.push(extension(
                    interface.name.clone(),
                    &interface.directives,
                    TypeKind::Interface(fields_container(
                        &interface.implements_interfaces,
                        &interface.fields,
                    )),
                ));
                continue;
            }
            ast::Definition::UnionTypeExtension(union) => {
                extensions.push(extension(
                    union.name.clone(),
                    &union.directives,
                    TypeKind::Union(union.members.iter().cloned().collect()),
                ));
                continue;
            }
            ast::Definition::EnumTypeExtension(enum_type) => {
                extensions.push(extension(
                    enum_type.name.clone(),
                    &enum_type.directives,
                    TypeKind::Enum(enum_values(&enum_type.values)),
                ));
                continue;
            }
            ast::Definition::InputObjectTypeExtension(input) => {
                extensions.push(extension(
                    input.name.clone(),
                    &input.directives,
                    TypeKind::InputObject(input_fields(&input.fields)),
                ));
                continue;
            }
        };
        let is_extension = converted.directives.has(FederationDirective::Extends);
        subgraph.add_type(TypeDefinition {
            is_extension,
            ..converted
        })?;
    }

    for extension in extensions {
        match subgraph.types.get_mut(&extension.name) {
            Some(existing) => {
                if !existing.same_kind_as(&extension) {
                    return Err(CompositionError::InvalidSdl {
                        namespace: subgraph.namespace.clone(),
                        message: format!(
                            "type {} is extended as {} but defined as {}",
                            extension.name,
                            extension.kind.name(),
                            existing.kind.name()
                        ),
                    });
                }
                trace!("folding local extension of {} into its definition", extension.name);
                apply_extension(existing, extension);
            }
            None => subgraph.add_type(extension)?,
        }
    }
    Ok(subgraph)
}

fn add_root_operations(
    subgraph: &mut Subgraph,
    root_operations: &[Node<(ast::OperationType, ast::NamedType)>],
) {
    for operation in root_operations {
        let (operation_type, type_name) = &**operation;
        let kind = match operation_type {
            ast::OperationType::Query => OperationKind::Query,
            ast::OperationType::Mutation => OperationKind::Mutation,
            ast::OperationType::Subscription => OperationKind::Subscription,
        };
        subgraph.operations.insert(kind, type_name.clone());
    }
}

fn extension(name: Name, directives: &ast::DirectiveList, kind: TypeKind) -> TypeDefinition {
    TypeDefinition {
        directives: directives.into(),
        is_extension: true,
        ..TypeDefinition::new(name, "", kind)
    }
}

/// Adds the members of a local `extend` declaration to the definition it extends.
fn apply_extension(definition: &mut TypeDefinition, extension: TypeDefinition) {
    for directive in extension.directives.0 {
        if directive.is(FederationDirective::Extends) {
            definition.is_extension = true;
        }
        definition.directives.push(directive);
    }
    match (&mut definition.kind, extension.kind) {
        (TypeKind::Object(existing), TypeKind::Object(added))
        | (TypeKind::Interface(existing), TypeKind::Interface(added)) => {
            existing.implements_interfaces.extend(added.implements_interfaces);
            for (name, field) in added.fields {
                existing.fields.entry(name).or_insert(field);
            }
        }
        (TypeKind::Enum(existing), TypeKind::Enum(added)) => {
            for (name, value) in added {
                existing.entry(name).or_insert(value);
            }
        }
        (TypeKind::Union(existing), TypeKind::Union(added)) => existing.extend(added),
        (TypeKind::InputObject(existing), TypeKind::InputObject(added)) => {
            for (name, field) in added {
                existing.entry(name).or_insert(field);
            }
        }
        _ => {}
    }
}

fn description(description: &Option<Node<str>>) -> Option<String> {
    description.as_deref().map(ToOwned::to_owned)
}

fn fields_container(
    implements_interfaces: &[Name],
    fields: &[Node<ast::FieldDefinition>],
) -> FieldsContainer {
    FieldsContainer {
        implements_interfaces: implements_interfaces.iter().cloned().collect::<IndexSet<_>>(),
        fields: fields
            .iter()
            .map(|field| {
                let converted = FieldDefinition {
                    name: field.name.clone(),
                    description: description(&field.description),
                    ty: (&field.ty).into(),
                    arguments: field.arguments.iter().map(|argument| input_value(argument)).collect(),
                    directives: (&field.directives).into(),
                };
                (field.name.clone(), converted)
            })
            .collect(),
    }
}

fn input_value(value: &ast::InputValueDefinition) -> InputValueDefinition {
    InputValueDefinition {
        name: value.name.clone(),
        description: description(&value.description),
        ty: (&*value.ty).into(),
        default_value: value.default_value.as_deref().map(Into::into),
        directives: DirectiveList::from(&value.directives),
    }
}

fn input_fields(fields: &[Node<ast::InputValueDefinition>]) -> IndexMap<Name, InputValueDefinition> {
    fields
        .iter()
        .map(|field| (field.name.clone(), input_value(field)))
        .collect()
}

fn enum_values(
    values: &[Node<ast::EnumValueDefinition>],
) -> IndexMap<Name, EnumValueDefinition> {
    values
        .iter()
        .map(|value| {
            let converted = EnumValueDefinition {
                value: value.value.clone(),
                description: description(&value.description),
                directives: (&value.directives).into(),
            };
            (value.value.clone(), converted)
        })
        .collect()
}

fn convert_directive_definition(definition: &ast::DirectiveDefinition) -> DirectiveDefinition {
    DirectiveDefinition {
        name: definition.name.clone(),
        description: description(&definition.description),
        arguments: definition
            .arguments
            .iter()
            .map(|argument| input_value(argument))
            .collect(),
        repeatable: definition.repeatable,
        locations: definition
            .locations
            .iter()
            .map(|location| location.to_string())
            .collect(),
    }
}
