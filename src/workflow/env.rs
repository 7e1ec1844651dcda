use std::collections::BTreeMap;

/// Overlay `overlay` on top of `base`. On a key collision the overlay wins.
///
/// Pure: the caller decides what the base is (usually the current process
/// environment), which keeps the merge testable on its own.
pub fn overlay_env<K, V, B, O>(base: B, overlay: O) -> BTreeMap<K, V>
where
    K: Ord,
    B: IntoIterator<Item = (K, V)>,
    O: IntoIterator<Item = (K, V)>,
{
    let mut merged: BTreeMap<K, V> = base.into_iter().collect();
    merged.extend(overlay);
    merged
}
