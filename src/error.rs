//! The sticky error type latched by [`crate::Writer`].

use thiserror::Error;

/// Errors a [`crate::Writer`] can latch.
///
/// Field setters on [`crate::builder::PacketHandle`]/[`crate::builder::TrackEventHandle`]
/// never return a `Result` — once a write fails the writer keeps accepting
/// calls (they become no-ops) and surfaces the first error through
/// [`crate::Writer::last_error`] or [`crate::Writer::finish`]. Builder misuse
/// (closing a packet that isn't open, an event out of order) and an
/// oversized nested submessage body are not represented here; both panic
/// instead, matching the rest of the crate's treatment of programmer errors
/// as fatal rather than recoverable (see [`crate::emit::ProtoEmitter::end_nested`]).
#[derive(Debug, Error)]
pub enum PftraceError {
    #[error("writing trace data failed: {0}")]
    Io(#[from] std::io::Error),
}
