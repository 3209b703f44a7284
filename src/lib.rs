//! Writer for the Perfetto trace wire format.
//!
//! A program instruments itself by creating a [`Writer`] bound to an output
//! file, then emits a stream of trace packets: process/thread/clock
//! metadata, and track events marking slice begin/end, instants, counters,
//! and flow relationships.
//!
//! ```no_run
//! use pftrace::{EventType, Writer};
//!
//! let mut writer = Writer::create("trace.perfetto-trace").unwrap();
//! writer.write_process_track_descriptor(100, 5000, "Renderer");
//! writer.write_thread_track_descriptor(101, 100, 5000, 5001, "MainThread");
//!
//! writer
//!     .begin_packet()
//!     .set_timestamp(10_000)
//!     .begin_track_event()
//!     .set_type(EventType::SliceBegin)
//!     .set_track_uuid(101)
//!     .set_name("DrawFrame")
//!     .end()
//!     .end();
//!
//! writer.finish().unwrap();
//! ```
//!
//! Repeated names, categories, argument keys, and source locations are
//! deduplicated through a string-interning table scoped to the writer's
//! current `trusted_packet_sequence_id` (see [`mod@intern`]); callers never
//! interact with it directly, it's driven by the field setters on
//! [`builder::TrackEventHandle`].
//!
//! This crate is write-only: it has no reader/parser for the format, no
//! background writer thread, and no concurrent-writer support. A `Writer`
//! is owned by exactly one producer and used synchronously.

pub mod builder;
pub mod emit;
pub mod error;
pub mod intern;
pub mod packet;
pub mod writer;

pub use builder::{PacketHandle, TrackEventHandle};
pub use error::PftraceError;
pub use packet::{DebugValue, EventType};
pub use writer::Writer;
