use crate::apply::apply;
use crate::state::TableState;
use tablemesh_codec::Entry;

/// Global order over entries touching one table (§4.6, SPEC_FULL §4.6
/// Open Question resolution). A log entry carries no standalone
/// "consensus round" field — by the time a consensus-committed entry
/// reaches the log it is installed through the same `append_local`/
/// `install_remote` path as any other entry, with the committing node's
/// own timestamp. Ordering by `(timestamp, origin_node_id, sequence)`
/// therefore already respects: per-origin sequencing (timestamps are
/// non-decreasing per origin, §3 invariant), commit order for contested
/// entries (the leader's commit timestamp dominates), and gives a stable
/// deterministic tie-break — `(timestamp, origin_node_id)` — for any
/// remaining ambiguity between independently-originated entries.
pub fn ordering_key(entry: &Entry) -> (u64, tablemesh_identity::NodeId, u64) {
    (entry.timestamp, entry.origin_node_id, entry.sequence)
}

/// Folds every entry in `entries` concerning `table_id`, in the global
/// order above, into a single `TableState`. Entries for other tables are
/// ignored rather than filtered by the caller, so callers can simply pass
/// `LogStore::entries_for_table`'s own output (or a wider slice) without
/// pre-filtering.
///
/// An entry that fails to apply (e.g. references a seat that was never
/// joined) is skipped with a warning rather than aborting: "partial
/// replay is safe, produces a prefix state" (§4.6).
pub fn replay_prefix(table_id: u64, entries: impl IntoIterator<Item = Entry>) -> TableState {
    let mut ordered: Vec<Entry> = entries
        .into_iter()
        .filter(|e| e.table_id == table_id)
        .collect();
    ordered.sort_by_key(ordering_key);

    let mut state = TableState::new(table_id);
    for entry in &ordered {
        match apply(&state, entry) {
            Ok(next) => state = next,
            Err(err) => {
                tracing::warn!(
                    table_id,
                    sequence = entry.sequence,
                    origin = %entry.origin_node_id,
                    error = %err,
                    "skipping entry during replay"
                );
            }
        }
    }
    state
}
