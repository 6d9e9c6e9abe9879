use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::name;
use itertools::Itertools;
use serde::Serialize;

pub(crate) const FIELDS_ARGUMENT_NAME: Name = name!("fields");
pub(crate) const RESOLVABLE_ARGUMENT_NAME: Name = name!("resolvable");

/// Directives the composer gives a meaning to. Anything else is carried through opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum FederationDirective {
    Key,
    Extends,
    External,
    Requires,
    Provides,
    Inaccessible,
    /// Delegated resolution of a field through another part of the graph.
    Resolver,
}

impl FederationDirective {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "key" => Self::Key,
            "extends" => Self::Extends,
            "external" => Self::External,
            "requires" => Self::Requires,
            "provides" => Self::Provides,
            "inaccessible" => Self::Inaccessible,
            "resolver" => Self::Resolver,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Only federation subgraphs may use these.
    pub(crate) fn requires_federation(self) -> bool {
        matches!(
            self,
            Self::Key | Self::Extends | Self::External | Self::Requires | Self::Provides
        )
    }

    /// Stripped when an entity is rewritten into plain GraphQL.
    pub(crate) fn is_entity_only(self) -> bool {
        self.requires_federation()
    }
}

/// A GraphQL input value as it appears in a directive argument or a default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(String),
    Float(String),
    String(String),
    Enum(Name),
    Variable(Name),
    List(Vec<Value>),
    Object(Vec<(Name, Value)>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&ast::Value> for Value {
    fn from(value: &ast::Value) -> Self {
        match value {
            ast::Value::Null => Self::Null,
            ast::Value::Enum(name) => Self::Enum(name.clone()),
            ast::Value::Variable(name) => Self::Variable(name.clone()),
            ast::Value::String(value) => Self::String(value.clone()),
            ast::Value::Float(value) => Self::Float(value.as_str().to_owned()),
            ast::Value::Int(value) => Self::Int(value.as_str().to_owned()),
            ast::Value::Boolean(value) => Self::Boolean(*value),
            ast::Value::List(items) => Self::List(items.iter().map(|item| (&**item).into()).collect()),
            ast::Value::Object(fields) => Self::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), (&**value).into()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Int(value) | Self::Float(value) => f.write_str(value),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Enum(name) => write!(f, "{name}"),
            Self::Variable(name) => write!(f, "${name}"),
            Self::List(items) => write!(f, "[{}]", items.iter().join(", ")),
            Self::Object(fields) => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .join(", ")
            ),
        }
    }
}

/// An applied directive, e.g. `@key(fields: "id")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<(Name, Value)>,
    /// Resolved from the name when the directive is built.
    #[serde(skip)]
    kind: Option<FederationDirective>,
}

impl Directive {
    pub fn new(name: Name) -> Self {
        Self {
            kind: FederationDirective::from_name(&name),
            name,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, name: Name, value: Value) -> Self {
        self.arguments.push((name, value));
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(argument_name, _)| argument_name.as_str() == name)
            .map(|(_, value)| value)
    }

    /// The recognized kind of this directive, if any.
    pub fn federation_kind(&self) -> Option<FederationDirective> {
        self.kind
    }

    pub fn is(&self, kind: FederationDirective) -> bool {
        self.kind == Some(kind)
    }
}

impl From<&ast::Directive> for Directive {
    fn from(directive: &ast::Directive) -> Self {
        Self {
            name: directive.name.clone(),
            kind: FederationDirective::from_name(&directive.name),
            arguments: directive
                .arguments
                .iter()
                .map(|argument| (argument.name.clone(), (&*argument.value).into()))
                .collect(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.arguments.is_empty() {
            let arguments = self
                .arguments
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .join(", ");
            write!(f, "({arguments})")?;
        }
        Ok(())
    }
}

/// The ordered directives applied on a schema element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirectiveList(pub Vec<Directive>);

impl DirectiveList {
    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, kind: FederationDirective) -> bool {
        self.0.iter().any(|directive| directive.is(kind))
    }

    pub fn get_all(&self, kind: FederationDirective) -> impl Iterator<Item = &Directive> {
        self.0.iter().filter(move |directive| directive.is(kind))
    }

    pub fn push(&mut self, directive: Directive) {
        self.0.push(directive)
    }

    pub fn retain(&mut self, keep: impl FnMut(&Directive) -> bool) {
        self.0.retain(keep)
    }
}

impl From<&ast::DirectiveList> for DirectiveList {
    fn from(directives: &ast::DirectiveList) -> Self {
        Self(directives.iter().map(|directive| (&**directive).into()).collect())
    }
}

impl FromIterator<Directive> for DirectiveList {
    fn from_iter<T: IntoIterator<Item = Directive>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for DirectiveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in &self.0 {
            write!(f, " {directive}")?;
        }
        Ok(())
    }
}
