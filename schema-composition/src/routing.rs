//! Which subgraph owns which field, and how the execution layer should fetch it.

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;
use tracing::trace;

use crate::schema::FieldCoordinate;

/// How the execution layer obtains the value of a field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::IntoStaticStr, strum_macros::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchKind {
    /// Read from the already fetched parent result.
    Static,
    /// Fetched by calling the owning subgraph.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRoutingEntry {
    pub namespace: String,
    pub fetch_kind: FetchKind,
}

impl FieldRoutingEntry {
    pub fn new(namespace: impl Into<String>, fetch_kind: FetchKind) -> Self {
        Self {
            namespace: namespace.into(),
            fetch_kind,
        }
    }

    pub fn is_static(&self) -> bool {
        self.fetch_kind == FetchKind::Static
    }
}

/// Routing entries of every output field of the unified graph, in registration order.
///
/// Entries are created once and then only updated: a field never loses its entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldRoutingRegistry {
    entries: IndexMap<FieldCoordinate, FieldRoutingEntry>,
}

impl FieldRoutingRegistry {
    pub fn get(&self, coordinate: &FieldCoordinate) -> Option<&FieldRoutingEntry> {
        self.entries.get(coordinate)
    }

    /// Looks up the entry of `type_name.field_name`.
    pub fn entry(&self, type_name: &Name, field_name: &Name) -> Option<&FieldRoutingEntry> {
        self.get(&FieldCoordinate::new(type_name.clone(), field_name.clone()))
    }

    pub fn contains(&self, coordinate: &FieldCoordinate) -> bool {
        self.entries.contains_key(coordinate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldCoordinate, &FieldRoutingEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers the entry of a field seen for the first time. A field that already has an
    /// entry keeps it.
    pub(crate) fn register(&mut self, coordinate: FieldCoordinate, entry: FieldRoutingEntry) {
        if let Entry::Vacant(vacant) = self.entries.entry(coordinate) {
            trace!(
                "registered {} -> {} ({})",
                vacant.key(),
                entry.namespace,
                entry.fetch_kind
            );
            vacant.insert(entry);
        }
    }

    /// Sets the entry of a field, replacing any previous one.
    pub(crate) fn set(&mut self, coordinate: FieldCoordinate, entry: FieldRoutingEntry) {
        self.entries.insert(coordinate, entry);
    }

    /// Turns the entry of a field into a STATIC one, keeping its namespace. Returns the entry
    /// as it was before the promotion.
    pub(crate) fn promote(&mut self, coordinate: &FieldCoordinate) -> Option<FieldRoutingEntry> {
        let entry = self.entries.get_mut(coordinate)?;
        let previous = entry.clone();
        entry.fetch_kind = FetchKind::Static;
        trace!("promoted {coordinate} to {}", FetchKind::Static);
        Some(previous)
    }

    /// Points the entry of a field at another namespace, keeping its fetch kind.
    pub(crate) fn reassign(&mut self, coordinate: &FieldCoordinate, namespace: &str) {
        let Some(entry) = self.entries.get_mut(coordinate) else {
            return;
        };
        if entry.namespace != namespace {
            trace!("reassigned {coordinate} from {} to {namespace}", entry.namespace);
            entry.namespace = namespace.to_owned();
        }
    }
}
