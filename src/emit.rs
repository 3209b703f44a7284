//! A very simple API to write Protobuf messages (Protobuf v2, as that's what
//! the Perfetto spec uses)
//!
//! # Example
//!
//! If the proto file defines a field as:
//!
//! ```text
//! optional uint32 counter_id = 1;
//! optional string description = 3;
//! ```
//!
//! then you can encode this to bytes via:
//!
//! ```
//! use pftrace::emit::ProtoEmitter;
//! let mut out = ProtoEmitter::new();
//! out.write_u64(1, 42); // counter_id has field id 1
//! out.write_string(3, "example"); // description has field id 3
//! assert_eq!(out.as_bytes(), &[
//!     8, // field 1, type varint
//!     42, // 42 encoded as varint
//!     26, // field 3, type string
//!     7,  // length of string (in bytes)
//!     101, 120, 97, 109, 112, 108, 101 // string
//! ]);
//! ```
//!
//! For more info see the [official docs on Protobuf
//! encoding](https://developers.google.com/protocol-buffers/docs/encoding).

/// Number of bytes reserved for a nested submessage's length prefix.
///
/// A forced-width 5-byte varint can represent any value up to 2^35, well
/// beyond any practical trace packet. Reserving a fixed window up front lets
/// `end_nested` patch the length in place without shifting the bytes that
/// follow it — the same trick the 3-byte/2-byte windows below used, just
/// wide enough that truncation never becomes a real concern.
const LENGTH_PREFIX_WIDTH: usize = 5;
const MAX_NESTED_LEN: u64 = (1 << 35) - 1;

/// A handle to a currently-open nested submessage scope, returned by
/// [`ProtoEmitter::begin_nested`] and consumed by [`ProtoEmitter::end_nested`].
///
/// Scopes nest LIFO. Ending a handle that isn't the innermost open scope is a
/// programmer error, not a recoverable one, and panics.
#[derive(Debug)]
pub struct ScopeHandle {
    body_start: usize,
    depth: usize,
}

pub struct ProtoEmitter {
    data: Vec<u8>,
    open_scopes: usize,
}

impl ProtoEmitter {
    pub fn new() -> Self {
        ProtoEmitter {
            data: Vec::new(),
            open_scopes: 0,
        }
    }

    /// Emit a field as a varint.
    ///
    /// Use for protobuf types: int32, uint32, uint64, bool, enum.
    pub fn write_u64(&mut self, field_id: u32, data: u64) {
        Self::check_valid_field_id(field_id);
        self.push_varint(((field_id << 3) | WIRE_VARINT) as u64);
        self.push_varint(data);
    }

    /// Emit a signed 64-bit field as a plain (non-zigzag) varint.
    ///
    /// Perfetto declares these fields `int64`/`int32`; the wire format encodes
    /// them by sign-extending to 64 bits and varint-encoding the bit pattern,
    /// not via the `sint64` zigzag mapping.
    pub fn write_i64(&mut self, field_id: u32, data: i64) {
        self.write_u64(field_id, data as u64)
    }

    pub fn write_bool(&mut self, field_id: u32, data: bool) {
        self.write_u64(field_id, data as u64)
    }

    pub fn write_string(&mut self, field_id: u32, data: &str) {
        self.write_bytes(field_id, data.as_bytes())
    }

    pub fn write_bytes(&mut self, field_id: u32, data: &[u8]) {
        Self::check_valid_field_id(field_id);
        self.push_varint(((field_id << 3) | LENGTH_DELIMITED) as u64);
        self.push_varint(data.len() as u64);
        self.data.extend(data);
    }

    pub fn write_double(&mut self, field_id: u32, data: f64) {
        Self::check_valid_field_id(field_id);
        self.push_varint(((field_id << 3) | FIXED_LENGTH_8) as u64);
        let bytes: [u8; 8] = data.to_le_bytes();
        self.data.extend(bytes);
    }

    /// Emit a fixed64 field. Perfetto declares flow ids `fixed64` rather than
    /// `uint64`, so they always take 8 bytes on the wire regardless of value.
    pub fn write_fixed64(&mut self, field_id: u32, data: u64) {
        Self::check_valid_field_id(field_id);
        self.push_varint(((field_id << 3) | FIXED_LENGTH_8) as u64);
        self.data.extend(data.to_le_bytes());
    }

    pub fn clear(&mut self) {
        debug_assert_eq!(self.open_scopes, 0, "clearing emitter with open scopes");
        self.data.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Depth of the open nested-scope stack. 0 between packets.
    pub fn scope_depth(&self) -> usize {
        self.open_scopes
    }

    #[inline]
    fn check_valid_field_id(field_id: u32) {
        debug_assert!(field_id < 1u32 << 29);
    }

    fn push_varint(&mut self, mut val: u64) {
        loop {
            let byte = (val & 0x7f) as u8;
            val >>= 7;
            if val > 0 {
                self.data.push(byte | 0x80);
            } else {
                self.data.push(byte);
                return;
            }
        }
    }

    /// Write a varint-encoded `size` using exactly [`LENGTH_PREFIX_WIDTH`]
    /// bytes at `offset`, padding unused high-order bytes with continuation
    /// bits (non-minimal encoding, which the wire format permits).
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds what that many bytes can represent.
    fn write_size_fixed(&mut self, offset: usize, size: u64) {
        assert!(
            size <= MAX_NESTED_LEN,
            "nested submessage body of {size} bytes exceeds the {MAX_NESTED_LEN}-byte \
             limit a {LENGTH_PREFIX_WIDTH}-byte varint prefix can encode"
        );
        let mut v = size;
        for i in 0..LENGTH_PREFIX_WIDTH {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            let continuation = if i + 1 < LENGTH_PREFIX_WIDTH { 0x80 } else { 0x00 };
            self.data[offset + i] = byte | continuation;
        }
    }

    /// Begin a nested (length-delimited) submessage. The returned handle must
    /// be passed to [`Self::end_nested`] before any enclosing scope closes, in
    /// strict LIFO order.
    pub fn begin_nested(&mut self, field_id: u32) -> ScopeHandle {
        Self::check_valid_field_id(field_id);
        self.push_varint(((field_id << 3) | LENGTH_DELIMITED) as u64);
        // Reserve the length prefix; the real size gets back-patched in `end_nested`.
        for _ in 0..LENGTH_PREFIX_WIDTH {
            self.data.push(0);
        }
        let body_start = self.data.len();
        let depth = self.open_scopes;
        self.open_scopes += 1;
        ScopeHandle { body_start, depth }
    }

    /// Close a nested submessage previously opened with [`Self::begin_nested`],
    /// back-patching its length.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not the innermost open scope — mismatched
    /// open/close order is a programmer bug, not a recoverable error.
    pub fn end_nested(&mut self, handle: ScopeHandle) {
        assert_eq!(
            handle.depth + 1,
            self.open_scopes,
            "end_nested called out of LIFO order: scope stack discipline violated"
        );
        let body_len = (self.data.len() - handle.body_start) as u64;
        self.write_size_fixed(handle.body_start - LENGTH_PREFIX_WIDTH, body_len);
        self.open_scopes -= 1;
    }

    /// Convenience wrapper around [`Self::begin_nested`]/[`Self::end_nested`]
    /// for the common case of writing a nested message inline.
    pub fn nested<F>(&mut self, field_id: u32, build: F)
    where
        F: FnOnce(&mut ProtoEmitter),
    {
        let handle = self.begin_nested(field_id);
        build(self);
        self.end_nested(handle);
    }
}

impl Default for ProtoEmitter {
    fn default() -> Self {
        Self::new()
    }
}

const LENGTH_DELIMITED: u32 = 2;
const FIXED_LENGTH_8: u32 = 1;
const WIRE_VARINT: u32 = 0;
