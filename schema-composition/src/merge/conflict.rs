//! Compatibility of two same-named types contributed by different subgraphs.

use apollo_compiler::Name;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::CompositionError;
use crate::options::AbsentFieldPolicy;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;
use crate::schema::TypeRef;

/// Checks that `incoming` may coexist with the `existing` definition of the same name.
///
/// In a federation comparison one-sided fields are tolerated as long as the other subgraph can
/// still answer for the type: both sides are entities, either side only extends the type, or the
/// field is nullable.
pub(super) fn resolve(
    existing: &TypeDefinition,
    incoming: &TypeDefinition,
    federation: bool,
    absent_field_policy: AbsentFieldPolicy,
) -> Result<(), CompositionError> {
    let conflict = |reason: String| CompositionError::TypeConflict {
        existing: existing.describe(),
        incoming: incoming.describe(),
        reason,
    };

    if !existing.same_kind_as(incoming) {
        return Err(conflict(format!(
            "Type kinds differ: {} and {}.",
            existing.kind.name(),
            incoming.kind.name()
        )));
    }
    if federation && existing.is_entity() != incoming.is_entity() {
        return Err(conflict(
            "A type must be an entity in every subgraph declaring it, or in none.".to_owned(),
        ));
    }

    let partial_declarations = (existing.is_entity() && incoming.is_entity())
        || existing.is_extension
        || incoming.is_extension;
    match (&existing.kind, &incoming.kind) {
        (TypeKind::Object(existing_container), TypeKind::Object(incoming_container))
        | (TypeKind::Interface(existing_container), TypeKind::Interface(incoming_container)) => {
            check_fields(
                field_types(&existing_container.fields),
                field_types(&incoming_container.fields),
                federation,
                partial_declarations,
                absent_field_policy,
            )
            .map_err(conflict)
        }
        (TypeKind::InputObject(existing_fields), TypeKind::InputObject(incoming_fields)) => {
            check_fields(
                input_field_types(existing_fields),
                input_field_types(incoming_fields),
                federation,
                partial_declarations,
                absent_field_policy,
            )
            .map_err(conflict)
        }
        (TypeKind::Enum(existing_values), TypeKind::Enum(incoming_values)) => {
            if federation || existing_values.keys().eq(incoming_values.keys()) {
                Ok(())
            } else {
                Err(conflict(format!(
                    "Enum values differ: [{}] and [{}].",
                    existing_values.keys().join(", "),
                    incoming_values.keys().join(", ")
                )))
            }
        }
        (TypeKind::Union(existing_members), TypeKind::Union(incoming_members)) => {
            let same_members = existing_members.len() == incoming_members.len()
                && existing_members.iter().all(|member| incoming_members.contains(member));
            if federation || same_members {
                Ok(())
            } else {
                Err(conflict(format!(
                    "Union members differ: [{}] and [{}].",
                    existing_members.iter().join(", "),
                    incoming_members.iter().join(", ")
                )))
            }
        }
        _ => Ok(()),
    }
}

fn field_types(
    fields: &IndexMap<Name, crate::schema::FieldDefinition>,
) -> IndexMap<&Name, &TypeRef> {
    fields.iter().map(|(name, field)| (name, &field.ty)).collect()
}

fn input_field_types(
    fields: &IndexMap<Name, crate::schema::InputValueDefinition>,
) -> IndexMap<&Name, &TypeRef> {
    fields.iter().map(|(name, field)| (name, &field.ty)).collect()
}

fn check_fields(
    existing: IndexMap<&Name, &TypeRef>,
    incoming: IndexMap<&Name, &TypeRef>,
    federation: bool,
    partial_declarations: bool,
    absent_field_policy: AbsentFieldPolicy,
) -> Result<(), String> {
    for (name, incoming_type) in &incoming {
        if let Some(existing_type) = existing.get(name) {
            if existing_type != incoming_type {
                return Err(format!(
                    "Field {name} has type {existing_type} in the existing type but {incoming_type} in the incoming one."
                ));
            }
        }
    }

    let one_sided = existing
        .iter()
        .filter(|(name, _)| !incoming.contains_key(*name))
        .chain(incoming.iter().filter(|(name, _)| !existing.contains_key(*name)));
    for (name, ty) in one_sided {
        let tolerated = federation
            && (partial_declarations
                || absent_field_policy == AbsentFieldPolicy::Allow
                || !ty.is_non_null());
        if !tolerated {
            return Err(format!("Field {name}: {ty} is only declared by one of them."));
        }
    }
    Ok(())
}
