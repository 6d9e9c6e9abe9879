//! The owned type model that composition operates on.
//!
//! Definitions are plain values addressed by name. Moving a definition from a subgraph into the
//! unified graph always clones it, so no two subgraphs ever share a node.

use std::fmt;

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use itertools::Itertools;
use serde::Serialize;

mod directive;
pub(crate) mod field_set;
mod type_ref;

pub use directive::Directive;
pub use directive::DirectiveList;
pub use directive::FederationDirective;
pub use directive::Value;
pub use field_set::FieldSelection;
pub use field_set::FieldSet;
pub use field_set::KeyDirectiveDefinition;
pub use type_ref::TypeRef;

/// The location of a field: its parent type and its own name. Serialized as `Type.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldCoordinate {
    pub type_name: Name,
    pub field_name: Name,
}

impl FieldCoordinate {
    pub fn new(type_name: Name, field_name: Name) -> Self {
        Self {
            type_name,
            field_name,
        }
    }
}

impl fmt::Display for FieldCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

impl Serialize for FieldCoordinate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The root operation kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, strum_macros::IntoStaticStr,
)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [Self; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    /// The canonical name of the root type in the unified graph.
    pub fn default_type_name(self) -> Name {
        match self {
            Self::Query => apollo_compiler::name!("Query"),
            Self::Mutation => apollo_compiler::name!("Mutation"),
            Self::Subscription => apollo_compiler::name!("Subscription"),
        }
    }
}

/// An argument or input object field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputValueDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
    pub directives: DirectiveList,
}

impl InputValueDefinition {
    pub fn new(name: Name, ty: TypeRef) -> Self {
        Self {
            name,
            description: None,
            ty,
            default_value: None,
            directives: DirectiveList::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: Vec<InputValueDefinition>,
    pub directives: DirectiveList,
}

impl FieldDefinition {
    pub fn new(name: Name, ty: TypeRef) -> Self {
        Self {
            name,
            description: None,
            ty,
            arguments: Vec::new(),
            directives: DirectiveList::default(),
        }
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn with_argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn is_external(&self) -> bool {
        self.directives.has(FederationDirective::External)
    }

    pub fn is_inaccessible(&self) -> bool {
        self.directives.has(FederationDirective::Inaccessible)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueDefinition {
    pub value: Name,
    pub description: Option<String>,
    pub directives: DirectiveList,
}

/// Fields shared by object and interface types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldsContainer {
    pub implements_interfaces: IndexSet<Name>,
    pub fields: IndexMap<Name, FieldDefinition>,
}

/// The kind-specific part of a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeKind {
    Object(FieldsContainer),
    Interface(FieldsContainer),
    Enum(IndexMap<Name, EnumValueDefinition>),
    Scalar,
    Union(IndexSet<Name>),
    InputObject(IndexMap<Name, InputValueDefinition>),
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Object(_) => "Object",
            Self::Interface(_) => "Interface",
            Self::Enum(_) => "Enum",
            Self::Scalar => "Scalar",
            Self::Union(_) => "Union",
            Self::InputObject(_) => "InputObject",
        }
    }

    fn same_kind_as(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A named type contributed by one subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub directives: DirectiveList,
    /// The namespace of the subgraph that contributed this definition.
    pub namespace: String,
    /// Declared with `extend type` or with `@extends`.
    pub is_extension: bool,
    pub kind: TypeKind,
}

impl TypeDefinition {
    pub fn new(name: Name, namespace: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name,
            description: None,
            directives: DirectiveList::default(),
            namespace: namespace.into(),
            is_extension: false,
            kind,
        }
    }

    /// An object type with the given fields, in order.
    pub fn object(
        name: Name,
        namespace: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDefinition>,
    ) -> Self {
        Self::new(
            name,
            namespace,
            TypeKind::Object(FieldsContainer {
                implements_interfaces: IndexSet::new(),
                fields: fields
                    .into_iter()
                    .map(|field| (field.name.clone(), field))
                    .collect(),
            }),
        )
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        if directive.is(FederationDirective::Extends) {
            self.is_extension = true;
        }
        self.directives.push(directive);
        self
    }

    pub fn implementing(mut self, interface: Name) -> Self {
        if let TypeKind::Object(container) | TypeKind::Interface(container) = &mut self.kind {
            container.implements_interfaces.insert(interface);
        }
        self
    }

    /// Whether this type carries `@key`.
    pub fn is_entity(&self) -> bool {
        self.directives.has(FederationDirective::Key)
    }

    /// An entity declared as an extension of a base entity owned elsewhere.
    pub fn is_entity_extension(&self) -> bool {
        self.is_entity() && self.is_extension
    }

    pub fn same_kind_as(&self, other: &Self) -> bool {
        self.kind.same_kind_as(&other.kind)
    }

    /// Output fields of object and interface types.
    pub fn fields(&self) -> Option<&IndexMap<Name, FieldDefinition>> {
        match &self.kind {
            TypeKind::Object(container) | TypeKind::Interface(container) => {
                Some(&container.fields)
            }
            TypeKind::Enum(_) | TypeKind::Scalar | TypeKind::Union(_) | TypeKind::InputObject(_) => {
                None
            }
        }
    }

    pub fn fields_mut(&mut self) -> Option<&mut IndexMap<Name, FieldDefinition>> {
        match &mut self.kind {
            TypeKind::Object(container) | TypeKind::Interface(container) => {
                Some(&mut container.fields)
            }
            TypeKind::Enum(_) | TypeKind::Scalar | TypeKind::Union(_) | TypeKind::InputObject(_) => {
                None
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().and_then(|fields| fields.get(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn implements(&self, interface: &str) -> bool {
        match &self.kind {
            TypeKind::Object(container) | TypeKind::Interface(container) => {
                container.implements_interfaces.contains(interface)
            }
            _ => false,
        }
    }

    /// Every named type this definition refers to: field types, argument types, input field
    /// types, implemented interfaces and union members.
    pub fn referenced_type_names(&self) -> Vec<&Name> {
        match &self.kind {
            TypeKind::Object(container) | TypeKind::Interface(container) => container
                .implements_interfaces
                .iter()
                .chain(container.fields.values().flat_map(field_type_names))
                .collect(),
            TypeKind::Union(members) => members.iter().collect(),
            TypeKind::InputObject(fields) => fields
                .values()
                .map(|field| field.ty.inner_named_type())
                .collect(),
            TypeKind::Enum(_) | TypeKind::Scalar => Vec::new(),
        }
    }

    /// `[name:Product, kind:Object, namespace:inventory]`, used in error messages.
    pub fn describe(&self) -> String {
        format!(
            "[name:{}, kind:{}, namespace:{}]",
            self.name,
            self.kind.name(),
            self.namespace
        )
    }
}

/// The return type and all argument types of a field.
pub(crate) fn field_type_names(field: &FieldDefinition) -> impl Iterator<Item = &Name> {
    std::iter::once(field.ty.inner_named_type()).chain(
        field
            .arguments
            .iter()
            .map(|argument| argument.ty.inner_named_type()),
    )
}

/// A directive definition, carried through composition for the execution layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<String>,
}

/// Built-in scalars are never declared by subgraphs.
pub(crate) fn is_built_in_scalar(name: &str) -> bool {
    matches!(name, "Int" | "Float" | "String" | "Boolean" | "ID")
}

fn write_description(
    f: &mut fmt::Formatter<'_>,
    description: &Option<String>,
    indent: &str,
) -> fmt::Result {
    if let Some(description) = description {
        writeln!(f, "{indent}\"\"\"{description}\"\"\"")?;
    }
    Ok(())
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[InputValueDefinition]) -> fmt::Result {
    if !arguments.is_empty() {
        let arguments = arguments.iter().map(|argument| argument.to_string()).join(", ");
        write!(f, "({arguments})")?;
    }
    Ok(())
}

impl fmt::Display for InputValueDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)?;
        if let Some(default_value) = &self.default_value {
            write!(f, " = {default_value}")?;
        }
        write!(f, "{}", self.directives)
    }
}

impl fmt::Display for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        write_arguments(f, &self.arguments)?;
        write!(f, ": {}{}", self.ty, self.directives)
    }
}

impl fmt::Display for TypeDefinition {
    /// Renders the definition as SDL. Descriptions use block strings on their own line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_description(f, &self.description, "")?;
        let keyword = match &self.kind {
            TypeKind::Object(_) => "type",
            TypeKind::Interface(_) => "interface",
            TypeKind::Enum(_) => "enum",
            TypeKind::Scalar => "scalar",
            TypeKind::Union(_) => "union",
            TypeKind::InputObject(_) => "input",
        };
        if self.is_extension {
            write!(f, "extend ")?;
        }
        write!(f, "{keyword} {}", self.name)?;
        match &self.kind {
            TypeKind::Object(container) | TypeKind::Interface(container) => {
                if !container.implements_interfaces.is_empty() {
                    write!(
                        f,
                        " implements {}",
                        container.implements_interfaces.iter().join(" & ")
                    )?;
                }
                writeln!(f, "{} {{", self.directives)?;
                for field in container.fields.values() {
                    write_description(f, &field.description, "  ")?;
                    writeln!(f, "  {field}")?;
                }
                write!(f, "}}")
            }
            TypeKind::Enum(values) => {
                writeln!(f, "{} {{", self.directives)?;
                for value in values.values() {
                    write_description(f, &value.description, "  ")?;
                    writeln!(f, "  {}{}", value.value, value.directives)?;
                }
                write!(f, "}}")
            }
            TypeKind::Scalar => write!(f, "{}", self.directives),
            TypeKind::Union(members) => {
                write!(f, "{} = {}", self.directives, members.iter().join(" | "))
            }
            TypeKind::InputObject(fields) => {
                writeln!(f, "{} {{", self.directives)?;
                for field in fields.values() {
                    write_description(f, &field.description, "  ")?;
                    writeln!(f, "  {field}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
