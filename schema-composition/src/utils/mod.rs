pub(crate) mod logging;

/// Merges two descriptions: an absent or blank side yields the other, an equal or already
/// contained incoming description keeps the existing one, anything else is appended after a
/// blank line.
pub(crate) fn merge_descriptions(
    existing: Option<&str>,
    incoming: Option<&str>,
) -> Option<String> {
    let existing = existing.filter(|description| !description.trim().is_empty());
    let incoming = incoming.filter(|description| !description.trim().is_empty());
    match (existing, incoming) {
        (None, None) => None,
        (Some(description), None) | (None, Some(description)) => Some(description.to_owned()),
        (Some(existing), Some(incoming)) if existing.contains(incoming) => {
            Some(existing.to_owned())
        }
        (Some(existing), Some(incoming)) => Some(format!("{existing}\n\n{incoming}")),
    }
}
