//! Message shapes and field-number tables for the subset of the Perfetto wire
//! format this crate emits.
//!
//! Shapes that require interning side effects (`TrackEvent`'s name,
//! categories, debug annotation keys, source location, log message) are
//! built incrementally by [`crate::builder`] instead of being represented as
//! a single struct here, since interning must happen before the enclosing
//! packet's `interned_data` is drained. What's left here are the field
//! number table and the handful of shapes — descriptors, debug values, the
//! event-type enum — that don't need that staging.

use crate::emit::ProtoEmitter;

/// Field numbers from the normative subset of the Perfetto schema this crate
/// targets. Kept as one flat module so call sites read as `field::NAME`
/// rather than scattering magic numbers through the builder.
pub mod field {
    pub const TRACE_PACKET: u32 = 1;

    pub const TRACE_PACKET_CLOCK_SNAPSHOT: u32 = 6;
    pub const TRACE_PACKET_TIMESTAMP: u32 = 8;
    pub const TRACE_PACKET_SEQUENCE_ID: u32 = 10;
    pub const TRACE_PACKET_TRACK_EVENT: u32 = 11;
    pub const TRACE_PACKET_INTERNED_DATA: u32 = 12;
    pub const TRACE_PACKET_TRACK_DESCRIPTOR: u32 = 60;

    pub const TRACK_EVENT_CATEGORY_IIDS: u32 = 3;
    pub const TRACK_EVENT_DEBUG_ANNOTATIONS: u32 = 4;
    pub const TRACK_EVENT_TASK_EXECUTION: u32 = 5;
    pub const TRACK_EVENT_TYPE: u32 = 9;
    pub const TRACK_EVENT_NAME_IID: u32 = 10;
    pub const TRACK_EVENT_NAME: u32 = 23;
    pub const TRACK_EVENT_TRACK_UUID: u32 = 11;
    pub const TRACK_EVENT_LOG_MESSAGE: u32 = 21;
    pub const TRACK_EVENT_COUNTER_VALUE: u32 = 30;
    pub const TRACK_EVENT_TERMINATING_FLOW_IDS: u32 = 42;
    pub const TRACK_EVENT_FLOW_IDS: u32 = 47;

    pub const TRACK_DESCRIPTOR_UUID: u32 = 1;
    pub const TRACK_DESCRIPTOR_PROCESS: u32 = 3;
    pub const TRACK_DESCRIPTOR_THREAD: u32 = 4;
    pub const TRACK_DESCRIPTOR_PARENT_UUID: u32 = 5;

    pub const PROCESS_DESCRIPTOR_PID: u32 = 1;
    pub const PROCESS_DESCRIPTOR_NAME: u32 = 6;

    pub const THREAD_DESCRIPTOR_PID: u32 = 1;
    pub const THREAD_DESCRIPTOR_TID: u32 = 2;
    pub const THREAD_DESCRIPTOR_NAME: u32 = 5;

    pub const CLOCK_SNAPSHOT_CLOCKS: u32 = 1;
    pub const CLOCK_ID: u32 = 1;
    pub const CLOCK_TIMESTAMP: u32 = 2;

    pub const INTERNED_DATA_EVENT_CATEGORIES: u32 = 1;
    pub const INTERNED_DATA_EVENT_NAMES: u32 = 2;
    pub const INTERNED_DATA_DEBUG_ANNOTATION_NAMES: u32 = 3;
    pub const INTERNED_DATA_SOURCE_LOCATIONS: u32 = 4;
    pub const INTERNED_DATA_LOG_MESSAGE_BODY: u32 = 20;

    pub const INTERNED_ENTRY_IID: u32 = 1;
    pub const INTERNED_ENTRY_NAME: u32 = 2;

    pub const SOURCE_LOCATION_IID: u32 = 1;
    pub const SOURCE_LOCATION_FILE_NAME: u32 = 2;
    pub const SOURCE_LOCATION_FUNCTION_NAME: u32 = 3;
    pub const SOURCE_LOCATION_LINE_NUMBER: u32 = 4;

    pub const LOG_MESSAGE_BODY_IID: u32 = 1;
    pub const TASK_EXECUTION_SOURCE_LOCATION_IID: u32 = 1;

    pub const DEBUG_ANNOTATION_NAME_IID: u32 = 1;
    pub const DEBUG_ANNOTATION_BOOL_VALUE: u32 = 2;
    pub const DEBUG_ANNOTATION_UINT_VALUE: u32 = 3;
    pub const DEBUG_ANNOTATION_INT_VALUE: u32 = 4;
    pub const DEBUG_ANNOTATION_DOUBLE_VALUE: u32 = 5;
    pub const DEBUG_ANNOTATION_STRING_VALUE: u32 = 6;
    pub const DEBUG_ANNOTATION_POINTER_VALUE: u32 = 7;

    /// Perfetto's `BuiltinClock::BUILTIN_CLOCK_BOOTTIME`.
    pub const CLOCK_BOOTTIME: u64 = 6;
}

/// `TrackEvent.type`: what kind of timeline mark this event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Unspecified,
    SliceBegin,
    SliceEnd,
    Instant,
    Counter,
}

impl EventType {
    pub(crate) fn wire_value(self) -> u64 {
        match self {
            EventType::Unspecified => 0,
            EventType::SliceBegin => 1,
            EventType::SliceEnd => 2,
            EventType::Instant => 3,
            EventType::Counter => 4,
        }
    }
}

/// A single `DebugAnnotation` value. The annotation's name is always
/// interned by the builder before this is written; see
/// [`crate::builder::TrackEventHandle::add_arg_string`] and siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugValue {
    Bool(bool),
    Uint(u64),
    Int(i64),
    Double(f64),
    String(String),
    Pointer(u64),
}

impl DebugValue {
    pub(crate) fn emit(&self, out: &mut ProtoEmitter) {
        match self {
            DebugValue::Bool(b) => out.write_bool(field::DEBUG_ANNOTATION_BOOL_VALUE, *b),
            DebugValue::Uint(v) => out.write_u64(field::DEBUG_ANNOTATION_UINT_VALUE, *v),
            DebugValue::Int(v) => out.write_i64(field::DEBUG_ANNOTATION_INT_VALUE, *v),
            DebugValue::Double(v) => out.write_double(field::DEBUG_ANNOTATION_DOUBLE_VALUE, *v),
            DebugValue::String(s) => out.write_string(field::DEBUG_ANNOTATION_STRING_VALUE, s),
            DebugValue::Pointer(v) => out.write_u64(field::DEBUG_ANNOTATION_POINTER_VALUE, *v),
        }
    }
}

/// `ProcessDescriptor`, nested inside a `TrackDescriptor`.
pub(crate) fn emit_process_descriptor(out: &mut ProtoEmitter, pid: i32, name: &str) {
    out.write_i64(field::PROCESS_DESCRIPTOR_PID, pid as i64);
    out.write_string(field::PROCESS_DESCRIPTOR_NAME, name);
}

/// `ThreadDescriptor`, nested inside a `TrackDescriptor`.
pub(crate) fn emit_thread_descriptor(out: &mut ProtoEmitter, pid: i32, tid: i32, name: &str) {
    out.write_i64(field::THREAD_DESCRIPTOR_PID, pid as i64);
    out.write_i64(field::THREAD_DESCRIPTOR_TID, tid as i64);
    out.write_string(field::THREAD_DESCRIPTOR_NAME, name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_wire_values_match_perfetto_schema() {
        assert_eq!(EventType::Unspecified.wire_value(), 0);
        assert_eq!(EventType::SliceBegin.wire_value(), 1);
        assert_eq!(EventType::SliceEnd.wire_value(), 2);
        assert_eq!(EventType::Instant.wire_value(), 3);
        assert_eq!(EventType::Counter.wire_value(), 4);
    }
}
