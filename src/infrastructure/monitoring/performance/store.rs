//! Capacity-bounded, insertion-ordered storage for request records.
//!
//! Records live in a map keyed by request id for O(1) correlation lookups. A
//! parallel queue of `(sequence, request_id)` pairs keeps insertion order for
//! FIFO eviction. Overwrites and age pruning leave stale queue entries behind;
//! they are recognised by a sequence mismatch, skipped, and compacted away once
//! they outnumber live records.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

use super::types::MetricRecord;

/// Stale queue entries tolerated before compaction kicks in
const COMPACTION_SLACK: usize = 64;

struct Slot {
    seq: u64,
    record: MetricRecord,
}

/// Result of appending a record to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendOutcome {
    /// An existing record with the same request id was replaced
    pub replaced: bool,
    /// Number of oldest records dropped to respect the capacity
    pub evicted: usize,
}

pub struct MetricStore {
    capacity: usize,
    records: HashMap<String, Slot>,
    order: VecDeque<(u64, String)>,
    next_seq: u64,
}

impl MetricStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: HashMap::with_capacity(capacity.min(4096)),
            order: VecDeque::with_capacity(capacity.min(4096)),
            next_seq: 0,
        }
    }

    /// Inserts at the tail and evicts from the head until within capacity.
    ///
    /// A record whose request id is already stored replaces the old one and
    /// takes the newest position in eviction order.
    pub fn append(&mut self, record: MetricRecord) -> AppendOutcome {
        let seq = self.next_seq;
        self.next_seq += 1;

        let id = record.request_id.clone();
        let replaced = self
            .records
            .insert(id.clone(), Slot { seq, record })
            .is_some();
        self.order.push_back((seq, id));

        let mut evicted = 0;
        while self.records.len() > self.capacity {
            let Some((seq, id)) = self.order.pop_front() else {
                break;
            };
            if self.is_live(seq, &id) {
                self.records.remove(&id);
                evicted += 1;
            }
        }

        self.compact_if_needed();
        AppendOutcome { replaced, evicted }
    }

    pub fn find(&self, request_id: &str) -> Option<&MetricRecord> {
        self.records.get(request_id).map(|slot| &slot.record)
    }

    pub fn find_mut(&mut self, request_id: &str) -> Option<&mut MetricRecord> {
        self.records.get_mut(request_id).map(|slot| &mut slot.record)
    }

    /// Iterates live records oldest first. Each call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &MetricRecord> + '_ {
        self.order.iter().filter_map(|(seq, id)| {
            self.records
                .get(id)
                .filter(|slot| slot.seq == *seq)
                .map(|slot| &slot.record)
        })
    }

    /// Removes every record created before `older_than`, returning the count.
    pub fn prune(&mut self, older_than: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, slot| slot.record.timestamp >= older_than);
        let removed = before - self.records.len();
        if removed > 0 {
            self.compact();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_live(&self, seq: u64, id: &str) -> bool {
        self.records.get(id).is_some_and(|slot| slot.seq == seq)
    }

    fn compact_if_needed(&mut self) {
        if self.order.len() > self.records.len() * 2 + COMPACTION_SLACK {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let records = &self.records;
        self.order
            .retain(|(seq, id)| records.get(id).is_some_and(|slot| slot.seq == *seq));
    }
}
