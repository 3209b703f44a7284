//! The packet / track-event state machine.
//!
//! `IDLE → PACKET_OPEN → EVENT_OPEN` is enforced statically rather than with
//! a runtime state flag: [`Writer::begin_packet`] takes `&mut Writer`, so the
//! borrow checker refuses a second `begin_packet` call while a
//! [`PacketHandle`] is still alive. Field setters on [`PacketHandle`] and
//! [`TrackEventHandle`] consume `self` and return an owned `Self` — the same
//! shape as `http::request::Builder` — so a call chain threads one owned
//! value through every step with no intermediate borrow; transitions
//! ([`PacketHandle::begin_track_event`], [`TrackEventHandle::end`]) also
//! consume `self`, so at most one packet and one track event can exist at a
//! time, and a half-built handle can't be reused once it's moved past. The
//! one thing the type system can't catch — ending a packet while its track
//! event is still open — is caught at runtime by
//! [`crate::emit::ProtoEmitter::end_nested`]'s LIFO assertion.

use crate::emit::ScopeHandle;
use crate::packet::{field, DebugValue, EventType};
use crate::writer::Writer;

/// A packet opened with [`Writer::begin_packet`], not yet closed.
pub struct PacketHandle<'w> {
    writer: &'w mut Writer,
    scope: ScopeHandle,
}

impl<'w> PacketHandle<'w> {
    pub(crate) fn new(writer: &'w mut Writer, scope: ScopeHandle) -> Self {
        PacketHandle { writer, scope }
    }

    /// `TracePacket.timestamp` (field 8), nanoseconds.
    pub fn set_timestamp(self, timestamp_ns: u64) -> Self {
        self.writer
            .encoder
            .write_u64(field::TRACE_PACKET_TIMESTAMP, timestamp_ns);
        self
    }

    /// `TracePacket.trusted_packet_sequence_id` (field 10).
    ///
    /// Changing the sequence id mid-stream resets the writer's interner:
    /// interned ids are only unique within one sequence id, so carrying a
    /// prior sequence's assignments into a new one would violate that.
    pub fn set_trusted_packet_sequence_id(self, sequence_id: u32) -> Self {
        self.writer.rebind_sequence_id(sequence_id);
        self.writer
            .encoder
            .write_u64(field::TRACE_PACKET_SEQUENCE_ID, sequence_id as u64);
        self
    }

    /// Opens this packet's `track_event` (field 11) submessage.
    pub fn begin_track_event(self) -> TrackEventHandle<'w> {
        let event_scope = self.writer.encoder.begin_nested(field::TRACE_PACKET_TRACK_EVENT);
        TrackEventHandle {
            writer: self.writer,
            packet_scope: self.scope,
            event_scope,
        }
    }

    /// `TracePacket.track_descriptor` (field 60) → `process` (field 3).
    pub fn write_process_track_descriptor(&mut self, uuid: u64, pid: i32, name: &str) {
        self.writer.encoder.nested(field::TRACE_PACKET_TRACK_DESCRIPTOR, |out| {
            out.write_u64(field::TRACK_DESCRIPTOR_UUID, uuid);
            out.nested(field::TRACK_DESCRIPTOR_PROCESS, |out| {
                crate::packet::emit_process_descriptor(out, pid, name);
            });
        });
    }

    /// `TracePacket.track_descriptor` (field 60) → `thread` (field 4).
    pub fn write_thread_track_descriptor(
        &mut self,
        uuid: u64,
        parent_uuid: u64,
        pid: i32,
        tid: i32,
        name: &str,
    ) {
        self.writer.encoder.nested(field::TRACE_PACKET_TRACK_DESCRIPTOR, |out| {
            out.write_u64(field::TRACK_DESCRIPTOR_UUID, uuid);
            out.write_u64(field::TRACK_DESCRIPTOR_PARENT_UUID, parent_uuid);
            out.nested(field::TRACK_DESCRIPTOR_THREAD, |out| {
                crate::packet::emit_thread_descriptor(out, pid, tid, name);
            });
        });
    }

    /// `TracePacket.clock_snapshot` (field 6), a single `BUILTIN_CLOCK_BOOTTIME` entry.
    pub fn write_clock_snapshot(&mut self, boottime_ns: u64) {
        self.writer.encoder.nested(field::TRACE_PACKET_CLOCK_SNAPSHOT, |out| {
            out.nested(field::CLOCK_SNAPSHOT_CLOCKS, |out| {
                out.write_u64(field::CLOCK_ID, field::CLOCK_BOOTTIME);
                out.write_u64(field::CLOCK_TIMESTAMP, boottime_ns);
            });
        });
    }

    /// Closes the packet: drains any interned entries the packet's fields
    /// triggered into its own `interned_data`, then closes the packet's
    /// outer scope and flushes the writer's buffer if it has grown past the
    /// threshold.
    pub fn end(self) {
        self.writer.drain_interned_if_pending();
        self.writer.encoder.end_nested(self.scope);
        self.writer.flush_if_needed();
    }
}

/// A track event opened with [`PacketHandle::begin_track_event`], not yet closed.
pub struct TrackEventHandle<'w> {
    writer: &'w mut Writer,
    packet_scope: ScopeHandle,
    event_scope: ScopeHandle,
}

impl<'w> TrackEventHandle<'w> {
    /// `TrackEvent.type` (field 9).
    pub fn set_type(self, event_type: EventType) -> Self {
        self.writer
            .encoder
            .write_u64(field::TRACK_EVENT_TYPE, event_type.wire_value());
        self
    }

    /// `TrackEvent.track_uuid` (field 11).
    pub fn set_track_uuid(self, track_uuid: u64) -> Self {
        self.writer
            .encoder
            .write_u64(field::TRACK_EVENT_TRACK_UUID, track_uuid);
        self
    }

    /// `TrackEvent.name_iid` (field 10), interning `name` in `event_names`.
    pub fn set_name(self, name: &str) -> Self {
        let iid = self.writer.interner.intern_event_name(name);
        self.writer.encoder.write_u64(field::TRACK_EVENT_NAME_IID, iid);
        self
    }

    /// Appends one entry to `TrackEvent.category_iids` (field 3), interning
    /// `category` in `event_categories`. Emitted non-packed: one `(tag,
    /// varint)` pair per call, which Perfetto readers accept for scalar
    /// repeated fields.
    pub fn add_category(self, category: &str) -> Self {
        let iid = self.writer.interner.intern_event_category(category);
        self.writer
            .encoder
            .write_u64(field::TRACK_EVENT_CATEGORY_IIDS, iid);
        self
    }

    /// Appends one `fixed64` entry to `TrackEvent.flow_ids` (field 47).
    pub fn add_flow_id(self, flow_id: u64) -> Self {
        self.writer
            .encoder
            .write_fixed64(field::TRACK_EVENT_FLOW_IDS, flow_id);
        self
    }

    /// Appends one `fixed64` entry to `TrackEvent.terminating_flow_ids` (field 42).
    pub fn add_terminating_flow_id(self, flow_id: u64) -> Self {
        self.writer
            .encoder
            .write_fixed64(field::TRACK_EVENT_TERMINATING_FLOW_IDS, flow_id);
        self
    }

    /// `TrackEvent.counter_value` (field 30).
    pub fn set_counter_value(self, value: i64) -> Self {
        self.writer
            .encoder
            .write_i64(field::TRACK_EVENT_COUNTER_VALUE, value);
        self
    }

    /// `TrackEvent.log_message` (field 21) → `body_iid` (field 1), interning
    /// `body` in `log_message_body`.
    pub fn set_log_message(self, body: &str) -> Self {
        let iid = self.writer.interner.intern_log_message(body);
        self.writer.encoder.nested(field::TRACK_EVENT_LOG_MESSAGE, |out| {
            out.write_u64(field::LOG_MESSAGE_BODY_IID, iid);
        });
        self
    }

    /// `TrackEvent.task_execution` (field 5) → `source_location_iid` (field
    /// 1), interning `(file, function, line)` in `source_locations`.
    pub fn set_task_execution(self, file: &str, function: &str, line: u32) -> Self {
        let iid = self.writer.interner.intern_source_location(file, function, line);
        self.writer
            .encoder
            .nested(field::TRACK_EVENT_TASK_EXECUTION, |out| {
                out.write_u64(field::TASK_EXECUTION_SOURCE_LOCATION_IID, iid);
            });
        self
    }

    fn add_debug_annotation(self, key: &str, value: DebugValue) -> Self {
        let iid = self.writer.interner.intern_debug_annotation_name(key);
        self.writer
            .encoder
            .nested(field::TRACK_EVENT_DEBUG_ANNOTATIONS, |out| {
                out.write_u64(field::DEBUG_ANNOTATION_NAME_IID, iid);
                value.emit(out);
            });
        self
    }

    pub fn add_arg_string(self, key: &str, value: &str) -> Self {
        self.add_debug_annotation(key, DebugValue::String(value.to_owned()))
    }

    pub fn add_arg_int(self, key: &str, value: i64) -> Self {
        self.add_debug_annotation(key, DebugValue::Int(value))
    }

    pub fn add_arg_uint(self, key: &str, value: u64) -> Self {
        self.add_debug_annotation(key, DebugValue::Uint(value))
    }

    pub fn add_arg_double(self, key: &str, value: f64) -> Self {
        self.add_debug_annotation(key, DebugValue::Double(value))
    }

    pub fn add_arg_bool(self, key: &str, value: bool) -> Self {
        self.add_debug_annotation(key, DebugValue::Bool(value))
    }

    pub fn add_arg_ptr(self, key: &str, value: u64) -> Self {
        self.add_debug_annotation(key, DebugValue::Pointer(value))
    }

    /// Closes the track event and returns the enclosing packet handle so the
    /// caller can set further packet-level fields or call
    /// [`PacketHandle::end`].
    pub fn end(self) -> PacketHandle<'w> {
        self.writer.encoder.end_nested(self.event_scope);
        PacketHandle::new(self.writer, self.packet_scope)
    }
}
