use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::ast;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use crate::schema::Directive;
use crate::schema::FederationDirective;
use crate::schema::TypeDefinition;
use crate::schema::directive::FIELDS_ARGUMENT_NAME;
use crate::schema::directive::RESOLVABLE_ARGUMENT_NAME;
use crate::schema::directive::Value;

/// One selected field of a field set, with its own nested selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSelection {
    pub name: Name,
    pub selections: Vec<FieldSelection>,
}

/// The parsed `fields` argument of `@key`, `@requires` or `@provides`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    pub source: String,
    pub selections: Vec<FieldSelection>,
}

/// Why a field set string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldSetParseError {
    Empty,
    Invalid(String),
}

impl FieldSet {
    /// Parses a field set such as `"id organization { id }"`. Curly braces around the whole
    /// selection are optional.
    pub(crate) fn parse(source: &str) -> Result<Self, FieldSetParseError> {
        let trimmed = source.trim();
        let inner = trimmed.trim_start_matches('{').trim_end_matches('}');
        if inner.trim().is_empty() {
            return Err(FieldSetParseError::Empty);
        }
        let document_source = if trimmed.starts_with('{') {
            trimmed.to_owned()
        } else {
            format!("{{ {trimmed} }}")
        };
        let document = ast::Document::parse(document_source, "field_set.graphql")
            .map_err(|invalid| FieldSetParseError::Invalid(invalid.errors.to_string()))?;

        let mut definitions = document.definitions.iter();
        let (Some(ast::Definition::OperationDefinition(operation)), None) =
            (definitions.next(), definitions.next())
        else {
            return Err(FieldSetParseError::Invalid(
                "a field set must be a single selection set".to_owned(),
            ));
        };
        Ok(Self {
            source: source.to_owned(),
            selections: convert_selections(&operation.selection_set)?,
        })
    }

    /// Structural identity of the field set: selections sorted by name at every level, so that
    /// `"id sku"` and `"sku id"` produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.selections)
    }

    /// Names of the top-level selected fields.
    pub fn top_level_fields(&self) -> impl Iterator<Item = &Name> {
        self.selections.iter().map(|selection| &selection.name)
    }

    /// Checks that every selection names a field of `parent`, resolving nested selections
    /// through `types`.
    pub(crate) fn check_references(
        &self,
        parent: &TypeDefinition,
        types: &IndexMap<Name, TypeDefinition>,
    ) -> Result<(), String> {
        check_selections(&self.selections, parent, types)
    }
}

fn check_selections(
    selections: &[FieldSelection],
    parent: &TypeDefinition,
    types: &IndexMap<Name, TypeDefinition>,
) -> Result<(), String> {
    for selection in selections {
        let Some(field) = parent.field(&selection.name) else {
            return Err(format!(
                "field \"{}\" does not exist on type {}",
                selection.name, parent.name
            ));
        };
        if selection.selections.is_empty() {
            continue;
        }
        let nested_type_name = field.ty.inner_named_type();
        match types.get(nested_type_name) {
            Some(nested) if nested.fields().is_some() => {
                check_selections(&selection.selections, nested, types)?
            }
            Some(_) => {
                return Err(format!(
                    "field \"{}.{}\" of type {nested_type_name} cannot have a selection",
                    parent.name, selection.name
                ));
            }
            None => {
                return Err(format!(
                    "type {nested_type_name} of field \"{}.{}\" is not defined",
                    parent.name, selection.name
                ));
            }
        }
    }
    Ok(())
}

fn convert_selections(
    selections: &[ast::Selection],
) -> Result<Vec<FieldSelection>, FieldSetParseError> {
    selections
        .iter()
        .map(|selection| match selection {
            ast::Selection::Field(field) => {
                if let Some(alias) = &field.alias {
                    return Err(FieldSetParseError::Invalid(format!(
                        "aliases are not supported (\"{alias}\")"
                    )));
                }
                if !field.arguments.is_empty() {
                    return Err(FieldSetParseError::Invalid(format!(
                        "arguments are not supported (on \"{}\")",
                        field.name
                    )));
                }
                Ok(FieldSelection {
                    name: field.name.clone(),
                    selections: convert_selections(&field.selection_set)?,
                })
            }
            ast::Selection::FragmentSpread(_) | ast::Selection::InlineFragment(_) => Err(
                FieldSetParseError::Invalid("fragments are not supported".to_owned()),
            ),
        })
        .collect()
}

fn fingerprint_of(selections: &[FieldSelection]) -> String {
    selections
        .iter()
        .sorted_by(|a, b| a.name.as_str().cmp(b.name.as_str()))
        .map(|selection| {
            if selection.selections.is_empty() {
                selection.name.to_string()
            } else {
                format!("{}{{{}}}", selection.name, fingerprint_of(&selection.selections))
            }
        })
        .join(" ")
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The `fields` argument of a field-set directive, before parsing.
pub(crate) enum FieldsArgument<'a> {
    Missing,
    NotAString,
    Present(&'a str),
}

pub(crate) fn fields_argument(directive: &Directive) -> FieldsArgument<'_> {
    match directive.argument(&FIELDS_ARGUMENT_NAME) {
        None => FieldsArgument::Missing,
        Some(Value::String(fields)) => FieldsArgument::Present(fields),
        Some(_) => FieldsArgument::NotAString,
    }
}

/// A parsed `@key` application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDirectiveDefinition {
    pub field_set: FieldSet,
    pub fingerprint: String,
    pub resolvable: bool,
}

impl KeyDirectiveDefinition {
    /// Builds the key definition from an already validated `@key` directive.
    pub(crate) fn from_directive(directive: &Directive) -> Option<Self> {
        debug_assert!(directive.is(FederationDirective::Key));
        let FieldsArgument::Present(fields) = fields_argument(directive) else {
            return None;
        };
        let field_set = FieldSet::parse(fields).ok()?;
        let resolvable = !matches!(
            directive.argument(&RESOLVABLE_ARGUMENT_NAME),
            Some(Value::Boolean(false))
        );
        Some(Self {
            fingerprint: field_set.fingerprint(),
            field_set,
            resolvable,
        })
    }
}
