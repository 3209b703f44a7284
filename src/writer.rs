//! The file-backed sink: owns the encoder buffer, the interner, and the
//! open file handle, and exposes the packet-builder entry point.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::builder::PacketHandle;
use crate::emit::ProtoEmitter;
use crate::error::PftraceError;
use crate::intern::Interner;
use crate::packet::field;

/// Flush the encoder's accumulated bytes once it grows past this size.
const FLUSH_THRESHOLD: usize = 64 * 1024;

/// Used for a writer's first packet, before any explicit
/// `set_trusted_packet_sequence_id` call.
const DEFAULT_SEQUENCE_ID: u32 = 1;

/// A writer bound to one output file and one logical producer.
///
/// Not `Send`/`Sync`-friendly by design: [`crate::builder::PacketHandle`]
/// and [`crate::builder::TrackEventHandle`] borrow a writer mutably, so only
/// one packet (and within it, one track event) can be open at a time, and
/// only from the thread that owns the writer.
pub struct Writer {
    sink: BufWriter<File>,
    pub(crate) encoder: ProtoEmitter,
    pub(crate) interner: Interner,
    sequence_id: Option<u32>,
    last_error: Option<PftraceError>,
}

impl Writer {
    /// Opens `path` for writing, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Writer {
            sink: BufWriter::with_capacity(FLUSH_THRESHOLD, file),
            encoder: ProtoEmitter::new(),
            interner: Interner::new(),
            sequence_id: None,
            last_error: None,
        })
    }

    /// Opens a new packet. Only one packet may be open at a time; the borrow
    /// checker enforces this since the returned handle holds `&mut self`.
    ///
    /// The writer's `trusted_packet_sequence_id` defaults to
    /// `DEFAULT_SEQUENCE_ID` the first time a packet is opened, binding which
    /// interner table the packet draws from — but that default is never
    /// written to the wire on its own. `TracePacket.trusted_packet_sequence_id`
    /// (field 10) only appears in the stream when the caller explicitly calls
    /// [`PacketHandle::set_trusted_packet_sequence_id`].
    pub fn begin_packet(&mut self) -> PacketHandle<'_> {
        let scope = self.encoder.begin_nested(field::TRACE_PACKET);
        if self.sequence_id.is_none() {
            self.sequence_id = Some(DEFAULT_SEQUENCE_ID);
        }
        PacketHandle::new(self, scope)
    }

    /// A self-contained packet with a `track_descriptor.process` payload and no track event.
    pub fn write_process_track_descriptor(&mut self, uuid: u64, pid: i32, name: &str) {
        let mut packet = self.begin_packet();
        packet.write_process_track_descriptor(uuid, pid, name);
        packet.end();
    }

    /// A self-contained packet with a `track_descriptor.thread` payload and no track event.
    pub fn write_thread_track_descriptor(
        &mut self,
        uuid: u64,
        parent_uuid: u64,
        pid: i32,
        tid: i32,
        name: &str,
    ) {
        let mut packet = self.begin_packet();
        packet.write_thread_track_descriptor(uuid, parent_uuid, pid, tid, name);
        packet.end();
    }

    /// A self-contained packet with a single `clock_snapshot` entry for `BUILTIN_CLOCK_BOOTTIME`.
    pub fn write_clock_snapshot(&mut self, boottime_ns: u64) {
        let mut packet = self.begin_packet();
        packet.write_clock_snapshot(boottime_ns);
        packet.end();
    }

    /// The first error latched by this writer, if any. Once set it never
    /// clears; later I/O failures are folded into the same slot.
    pub fn last_error(&self) -> Option<&PftraceError> {
        self.last_error.as_ref()
    }

    /// Writes the encoder's accumulated bytes to the file and clears the
    /// buffer. A no-op once an error has been latched.
    pub fn flush(&mut self) -> Result<(), PftraceError> {
        if self.last_error.is_some() {
            return Ok(());
        }
        if let Err(err) = self.sink.write_all(self.encoder.as_bytes()) {
            self.latch_error(err.into());
            return Ok(());
        }
        self.encoder.clear();
        if let Err(err) = self.sink.flush() {
            self.latch_error(err.into());
        }
        Ok(())
    }

    /// Flushes and consumes the writer, surfacing the first latched error if
    /// one occurred. Prefer this over letting the writer drop when the
    /// caller wants I/O failures surfaced rather than silently swallowed.
    pub fn finish(mut self) -> Result<(), PftraceError> {
        debug_assert_eq!(
            self.encoder.scope_depth(),
            0,
            "finish called with an open packet/event scope"
        );
        self.flush()?;
        match self.last_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn rebind_sequence_id(&mut self, sequence_id: u32) {
        match self.sequence_id {
            Some(current) if current != sequence_id => {
                tracing::debug!(from = current, to = sequence_id, "resetting interner for new sequence id");
                self.interner.reset();
            }
            _ => {}
        }
        self.sequence_id = Some(sequence_id);
    }

    pub(crate) fn drain_interned_if_pending(&mut self) {
        if self.interner.has_pending() {
            self.interner.drain_pending(&mut self.encoder);
        }
    }

    pub(crate) fn flush_if_needed(&mut self) {
        tracing::trace!(buffered = self.encoder.len(), "packet closed");
        if self.encoder.len() >= FLUSH_THRESHOLD {
            let _ = self.flush();
        }
    }

    fn latch_error(&mut self, err: PftraceError) {
        if self.last_error.is_none() {
            tracing::warn!(error = %err, "writer latching first error");
            self.last_error = Some(err);
        }
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
