//! History reconciliation
//!
//! Decides which part of a freshly fetched batch is genuinely new relative
//! to a possibly stale persisted log. Byte-equality is useless here: the
//! source reorders and mutates no-op fields between deliveries, so the
//! append boundary is the persisted log's maximum timestamp, strictly
//! exceeded. Events at exactly the cutoff count as already seen; dropping a
//! rare tie is the accepted cost of never inserting a duplicate.

use std::collections::HashSet;

use crate::types::ChatEvent;

/// Outcome of merging a fresh batch against a persisted log.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Events to append, in their original batch order
    pub appended: Vec<ChatEvent>,
    /// True iff at least one fetched event was at or before the cutoff,
    /// proving the fetch window overlapped recorded history
    pub overlap_detected: bool,
    /// True iff the batch was nonempty and entirely newer than the log:
    /// the server's retained window started after the last recorded event,
    /// so messages may be missing in between. Must be surfaced to the
    /// user, never silently merged as if contiguous.
    pub gap_possible: bool,
}

/// Merge `fresh` against `persisted` (sorted oldest-first).
///
/// The timestamp filter alone decides `overlap_detected` and
/// `gap_possible`. On top of that, events whose id already occurs in the
/// log or earlier in the same batch are dropped, a strictly stronger
/// duplicate guard that leaves the overlap semantics untouched.
pub fn reconcile(persisted: &[ChatEvent], fresh: Vec<ChatEvent>) -> ReconcileOutcome {
    if persisted.is_empty() {
        return ReconcileOutcome {
            appended: fresh,
            overlap_detected: false,
            gap_possible: false,
        };
    }

    let cutoff = persisted
        .iter()
        .map(|event| event.timestamp_micros)
        .max()
        .unwrap_or(0);

    let fresh_len = fresh.len();
    let newer: Vec<ChatEvent> = fresh
        .into_iter()
        .filter(|event| event.timestamp_micros > cutoff)
        .collect();

    let overlap_detected = newer.len() < fresh_len;
    let gap_possible = fresh_len > 0 && !overlap_detected;

    let known_ids: HashSet<&str> = persisted.iter().map(|event| event.id.as_str()).collect();
    let mut batch_ids: HashSet<String> = HashSet::new();
    let appended = newer
        .into_iter()
        .filter(|event| {
            !known_ids.contains(event.id.as_str()) && batch_ids.insert(event.id.clone())
        })
        .collect();

    ReconcileOutcome {
        appended,
        overlap_detected,
        gap_possible,
    }
}
