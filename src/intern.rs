//! String interning for the five [`InternedData`](crate::packet) tables.
//!
//! Each table maps a key (a string, or a `(file, function, line)` triple for
//! source locations) to a 64-bit id assigned sequentially starting at 1.
//! `0` is reserved and never assigned. An id stays "pending" until it has
//! been drained into an `interned_data` submessage on the stream; after that
//! it is "emitted" and never reappears in an `interned_data` field again.

use std::collections::HashMap;

use crate::emit::ProtoEmitter;
use crate::packet::field;

/// One (key → iid) table plus the set of entries not yet written to the stream.
struct Table<K> {
    ids: HashMap<K, u64>,
    pending: Vec<(u64, K)>,
    next_id: u64,
}

impl<K: Eq + std::hash::Hash + Clone> Table<K> {
    fn new() -> Self {
        Table {
            ids: HashMap::new(),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Returns `(iid, is_new)`.
    fn intern(&mut self, key: K) -> (u64, bool) {
        if let Some(&iid) = self.ids.get(&key) {
            return (iid, false);
        }
        let iid = self.next_id;
        self.next_id += 1;
        self.ids.insert(key.clone(), iid);
        self.pending.push((iid, key));
        (iid, true)
    }

    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn take_pending(&mut self) -> Vec<(u64, K)> {
        std::mem::take(&mut self.pending)
    }
}

/// Key for the `source_locations` table: Perfetto's `SourceLocation` message
/// is keyed on `(file_name, function_name, line_number)`.
#[derive(Clone, PartialEq, Eq, Hash)]
struct SourceLocationKey {
    file: String,
    function: String,
    line: u32,
}

/// Per-sequence-id string interning state, scoped to one [`crate::Writer`].
///
/// Resetting (see [`Self::reset`]) is used when the writer's
/// `trusted_packet_sequence_id` changes mid-stream: interned ids are only
/// guaranteed unique within a single sequence id (§3 of the spec this crate
/// implements), so carrying a prior sequence's id assignments into a new one
/// would violate that invariant.
pub struct Interner {
    event_categories: Table<String>,
    event_names: Table<String>,
    debug_annotation_names: Table<String>,
    source_locations: Table<SourceLocationKey>,
    log_message_body: Table<String>,
}

impl Interner {
    pub fn new() -> Self {
        Interner {
            event_categories: Table::new(),
            event_names: Table::new(),
            debug_annotation_names: Table::new(),
            source_locations: Table::new(),
            log_message_body: Table::new(),
        }
    }

    /// Discards all interning state. Used when the writer's sequence id changes.
    pub fn reset(&mut self) {
        *self = Interner::new();
    }

    pub fn intern_event_category(&mut self, name: &str) -> u64 {
        self.event_categories.intern(name.to_owned()).0
    }

    pub fn intern_event_name(&mut self, name: &str) -> u64 {
        self.event_names.intern(name.to_owned()).0
    }

    pub fn intern_debug_annotation_name(&mut self, name: &str) -> u64 {
        self.debug_annotation_names.intern(name.to_owned()).0
    }

    pub fn intern_log_message(&mut self, body: &str) -> u64 {
        self.log_message_body.intern(body.to_owned()).0
    }

    pub fn intern_source_location(&mut self, file: &str, function: &str, line: u32) -> u64 {
        self.source_locations
            .intern(SourceLocationKey {
                file: file.to_owned(),
                function: function.to_owned(),
                line,
            })
            .0
    }

    pub fn has_pending(&self) -> bool {
        self.event_categories.has_pending()
            || self.event_names.has_pending()
            || self.debug_annotation_names.has_pending()
            || self.source_locations.has_pending()
            || self.log_message_body.has_pending()
    }

    /// Writes every pending entry, across all five tables, into a freshly
    /// opened `interned_data` (field 12) scope and marks them emitted.
    ///
    /// Called at most once per packet, after every field that might have
    /// triggered interning has been set, and before the packet's own scope
    /// closes.
    pub fn drain_pending(&mut self, out: &mut ProtoEmitter) {
        if !self.has_pending() {
            return;
        }
        out.nested(field::TRACE_PACKET_INTERNED_DATA, |out| {
            for (iid, name) in self.event_categories.take_pending() {
                out.nested(field::INTERNED_DATA_EVENT_CATEGORIES, |out| {
                    out.write_u64(field::INTERNED_ENTRY_IID, iid);
                    out.write_string(field::INTERNED_ENTRY_NAME, &name);
                });
            }
            for (iid, name) in self.event_names.take_pending() {
                out.nested(field::INTERNED_DATA_EVENT_NAMES, |out| {
                    out.write_u64(field::INTERNED_ENTRY_IID, iid);
                    out.write_string(field::INTERNED_ENTRY_NAME, &name);
                });
            }
            for (iid, name) in self.debug_annotation_names.take_pending() {
                out.nested(field::INTERNED_DATA_DEBUG_ANNOTATION_NAMES, |out| {
                    out.write_u64(field::INTERNED_ENTRY_IID, iid);
                    out.write_string(field::INTERNED_ENTRY_NAME, &name);
                });
            }
            for (iid, key) in self.source_locations.take_pending() {
                out.nested(field::INTERNED_DATA_SOURCE_LOCATIONS, |out| {
                    out.write_u64(field::SOURCE_LOCATION_IID, iid);
                    out.write_string(field::SOURCE_LOCATION_FILE_NAME, &key.file);
                    out.write_string(field::SOURCE_LOCATION_FUNCTION_NAME, &key.function);
                    out.write_u64(field::SOURCE_LOCATION_LINE_NUMBER, key.line as u64);
                });
            }
            for (iid, body) in self.log_message_body.take_pending() {
                out.nested(field::INTERNED_DATA_LOG_MESSAGE_BODY, |out| {
                    out.write_u64(field::INTERNED_ENTRY_IID, iid);
                    out.write_string(field::INTERNED_ENTRY_NAME, &body);
                });
            }
        });
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_name_returns_same_iid_once_pending() {
        let mut interner = Interner::new();
        let a = interner.intern_event_name("DrawFrame");
        let b = interner.intern_event_name("DrawFrame");
        assert_eq!(a, b);
        assert_eq!(interner.event_names.pending.len(), 1);
    }

    #[test]
    fn iids_start_at_one_and_increase_without_gaps() {
        let mut interner = Interner::new();
        let a = interner.intern_event_name("a");
        let b = interner.intern_event_name("b");
        let c = interner.intern_event_name("c");
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[test]
    fn categories_and_names_have_independent_id_spaces() {
        let mut interner = Interner::new();
        let name_iid = interner.intern_event_name("x");
        let cat_iid = interner.intern_event_category("x");
        assert_eq!(name_iid, 1);
        assert_eq!(cat_iid, 1);
    }

    #[test]
    fn drain_pending_clears_pending_but_keeps_id_mapping() {
        let mut interner = Interner::new();
        interner.intern_event_name("DrawFrame");
        let mut out = ProtoEmitter::new();
        interner.drain_pending(&mut out);
        assert!(!out.is_empty());
        assert!(!interner.has_pending());

        // Re-interning returns the same iid without creating new pending work.
        let iid = interner.intern_event_name("DrawFrame");
        assert_eq!(iid, 1);
        assert!(!interner.has_pending());
    }

    #[test]
    fn drain_pending_is_a_no_op_when_nothing_pending() {
        let mut interner = Interner::new();
        let mut out = ProtoEmitter::new();
        interner.drain_pending(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn source_location_keys_on_full_triple() {
        let mut interner = Interner::new();
        let a = interner.intern_source_location("f.c", "main", 10);
        let b = interner.intern_source_location("f.c", "main", 11);
        let c = interner.intern_source_location("f.c", "other", 10);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn reset_restarts_numbering_from_one() {
        let mut interner = Interner::new();
        interner.intern_event_name("a");
        interner.intern_event_name("b");
        interner.reset();
        let iid = interner.intern_event_name("a");
        assert_eq!(iid, 1);
    }
}
