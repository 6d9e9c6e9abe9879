//! Subgraphs as admitted into a composition run.

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use crate::error::CompositionError;
use crate::schema::DirectiveDefinition;
use crate::schema::OperationKind;
use crate::schema::TypeDefinition;

mod metadata;
mod sdl;
pub(crate) mod validate;

pub use metadata::FederationMetadata;

/// Whether a subgraph speaks the federation dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceKind {
    Federation,
    Plain,
}

/// One independently authored schema, identified by its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subgraph {
    pub namespace: String,
    pub service_kind: ServiceKind,
    pub types: IndexMap<Name, TypeDefinition>,
    /// Root operation types declared in a `schema` definition. Root types named `Query`,
    /// `Mutation` and `Subscription` are used when nothing is declared.
    pub operations: IndexMap<OperationKind, Name>,
    pub directive_definitions: IndexMap<Name, DirectiveDefinition>,
}

impl Subgraph {
    pub fn new(namespace: impl Into<String>, service_kind: ServiceKind) -> Self {
        Self {
            namespace: namespace.into(),
            service_kind,
            types: IndexMap::new(),
            operations: IndexMap::new(),
            directive_definitions: IndexMap::new(),
        }
    }

    /// Builds a subgraph from schema definition language text.
    ///
    /// `extend type` declarations of a type defined in the same document are folded into that
    /// definition; extensions of types defined elsewhere are kept as extension definitions.
    pub fn parse(
        namespace: impl Into<String>,
        service_kind: ServiceKind,
        sdl: &str,
    ) -> Result<Self, CompositionError> {
        sdl::parse(Self::new(namespace, service_kind), sdl)
    }

    pub fn is_federation(&self) -> bool {
        self.service_kind == ServiceKind::Federation
    }

    /// Adds a type definition, stamping it with this subgraph's namespace.
    pub fn add_type(&mut self, mut definition: TypeDefinition) -> Result<(), CompositionError> {
        definition.namespace.clone_from(&self.namespace);
        match self.types.entry(definition.name.clone()) {
            Entry::Occupied(occupied) => Err(CompositionError::DuplicateTypeDefinition {
                type_name: occupied.key().clone(),
                namespace: self.namespace.clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(definition);
                Ok(())
            }
        }
    }

    pub fn with_type(mut self, definition: TypeDefinition) -> Result<Self, CompositionError> {
        self.add_type(definition)?;
        Ok(self)
    }

    pub fn with_operation(mut self, kind: OperationKind, type_name: Name) -> Self {
        self.operations.insert(kind, type_name);
        self
    }

    /// The root type of an operation kind, if the subgraph has one.
    pub fn operation_type(&self, kind: OperationKind) -> Option<&TypeDefinition> {
        match self.operations.get(&kind) {
            Some(type_name) => self.types.get(type_name),
            None => self.types.get(kind.default_type_name().as_str()),
        }
    }

    /// Whether `type_name` is one of this subgraph's root operation types.
    pub fn is_operation_type(&self, type_name: &str) -> bool {
        OperationKind::ALL.into_iter().any(|kind| {
            self.operation_type(kind)
                .is_some_and(|definition| definition.name.as_str() == type_name)
        })
    }
}
