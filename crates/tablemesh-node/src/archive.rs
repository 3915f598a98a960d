//! Wires completed-hand detection into the hand archive (§2 "state replay
//! re-derives table state; completed hands are serialised by the archive",
//! C8 → C9).

use crate::error::NodeError;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tablemesh_codec::{Entry, Payload};
use tablemesh_log::LogStore;
use tracing::{info, warn};

/// Registers an observer on `log_store` that, for every `HAND_RESULT` entry,
/// re-derives the table's state via `tablemesh_replay::replay_prefix` and,
/// once that confirms the hand completed, converts the table's raw entries
/// into a `HandRecord` and appends it to `archive_path`.
///
/// `LogStore::subscribe`'s observer is a plain `Fn(&Entry)` with no `Result`
/// return, so failures here are logged and swallowed rather than
/// propagated — the conversion itself still goes through `NodeError` so the
/// `Replay`/`Archive` variants are reachable from a real, fallible call
/// site, not just decorative `#[from]` plumbing.
pub fn install_archive_observer(log_store: &Arc<LogStore>, archive_path: PathBuf) {
    let log_store = log_store.clone();
    log_store.subscribe(Box::new(move |entry: &Entry| {
        let Payload::HandResult(result) = &entry.payload else {
            return;
        };
        let table_id = entry.table_id;
        let hand_number = result.hand_number;
        if let Err(err) = archive_completed_hand(&log_store, table_id, hand_number, &archive_path) {
            warn!(table_id, hand_number, %err, "failed to archive completed hand");
        }
    }));
}

fn archive_completed_hand(
    log_store: &LogStore,
    table_id: u64,
    hand_number: u64,
    archive_path: &std::path::Path,
) -> Result<(), NodeError> {
    let entries = log_store.entries_for_table(table_id);

    let state = tablemesh_replay::replay_prefix(table_id, entries.clone());
    if !state
        .completed_hands
        .iter()
        .any(|hand| hand.hand_number == hand_number)
    {
        warn!(
            table_id,
            hand_number,
            "hand result observed but replay has not yet reached a matching completed hand"
        );
        return Ok(());
    }

    let record = tablemesh_archive::hand_record_from_entries(&entries, table_id, hand_number)?;
    let text = tablemesh_archive::write_hand(&record);

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(archive_path)?;
    writeln!(file, "{text}\n")?;
    info!(table_id, hand_number, path = %archive_path.display(), "hand archived");
    Ok(())
}
