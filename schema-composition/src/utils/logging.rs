/// Wrapper around `tracing::trace!` that attaches a serialized copy of a composition data
/// structure to the event, so a log viewer can follow how the accumulator evolves while
/// subgraphs are folded in. Compiled out unless the `snapshot_tracing` feature is enabled.
///
/// The value is serialized with serde_json and tagged with its type name:
/// ```ignore
/// snapshot!(routing, "routing after fold");
/// // trace!(snapshot = "FieldRoutingRegistry", data = "{ .. }", "routing after fold");
/// ```
macro_rules! snapshot {
    ($value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(
            snapshot = std::any::type_name_of_val(&$value),
            data = serde_json::to_string(&$value).unwrap_or_else(|error| error.to_string()),
            $msg
        );
    };
}

pub(crate) use snapshot;
