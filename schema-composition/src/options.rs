use serde::Deserialize;
use serde::Serialize;

/// Knobs of a composition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositionOptions {
    /// Rewrite entities into plain GraphQL once extensions are merged, dropping `@key`,
    /// `@extends`, `@external`, `@requires` and `@provides`.
    pub strip_federation_directives: bool,
    pub absent_field_policy: AbsentFieldPolicy,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            strip_federation_directives: true,
            absent_field_policy: AbsentFieldPolicy::default(),
        }
    }
}

/// What to do, in a federation comparison, with a field that only one of two same-named
/// non-entity types declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentFieldPolicy {
    /// Nullable fields are tolerated; a non-null field would break the other subgraph's
    /// responses and is rejected.
    #[default]
    RejectNonNull,
    /// Every one-sided field is tolerated.
    Allow,
}
