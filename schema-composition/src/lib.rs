//! ## Usage
//!
//! Composes independently authored GraphQL schemas ("subgraphs") into one unified schema graph
//! for a federated gateway:
//!
//! ```ignore
//! let inventory = Subgraph::parse("inventory", ServiceKind::Federation, inventory_sdl)?;
//! let reviews = Subgraph::parse("reviews", ServiceKind::Federation, reviews_sdl)?;
//! let graph = compose(&[inventory, reviews], &CompositionOptions::default())?;
//! let owner = graph.field_routing("Product", "reviews");
//! ```
//!
//! Every output field of the composed graph carries a routing entry naming the subgraph that
//! resolves it, and whether the execution layer must call that subgraph (`DYNAMIC`) or can read
//! the value from its parent's result (`STATIC`).
//!
//! Composition either succeeds with a complete graph or fails with the first
//! [`CompositionError`]; no partially composed graph is ever returned.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod error;
pub mod merge;
pub mod options;
pub mod routing;
pub mod schema;
pub mod subgraph;
pub(crate) mod utils;

use tracing::debug;
use tracing::instrument;

pub use crate::error::CompositionError;
pub use crate::merge::UnifiedSchemaGraph;
pub use crate::options::AbsentFieldPolicy;
pub use crate::options::CompositionOptions;
pub use crate::routing::FetchKind;
pub use crate::routing::FieldRoutingEntry;
pub use crate::subgraph::ServiceKind;
pub use crate::subgraph::Subgraph;

/// Validates every subgraph, folds them in order into a fresh graph, then merges entity
/// extensions into their base entities.
#[instrument(skip_all, fields(subgraphs = subgraphs.len()))]
pub fn compose(
    subgraphs: &[Subgraph],
    options: &CompositionOptions,
) -> Result<UnifiedSchemaGraph, CompositionError> {
    for subgraph in subgraphs {
        subgraph::validate::validate_subgraph(subgraph)?;
    }
    let graph = UnifiedSchemaGraph::new()
        .fold(subgraphs, options)?
        .compose_entities(options)?;
    debug!(
        "composed {} types with {} routed fields",
        graph.types().len(),
        graph.routing().len()
    );
    Ok(graph)
}
