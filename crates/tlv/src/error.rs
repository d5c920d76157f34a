//! Error types for TLV construction, parsing, and typed access.

use thiserror::Error;

/// Errors raised while building or serializing a [`crate::Tlv`](crate::Tlv).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TlvError {
    /// `full_size` would overflow `u32` (construction, `add_child`, or parse).
    #[error("TLV size overflow: adding {added} bytes to {current} would exceed u32::MAX")]
    SizeOverflow { current: u32, added: u32 },

    /// `add_child` called on a leaf node.
    #[error("cannot add a child to a leaf TLV (type {tlv_type})")]
    NotAParent { tlv_type: u8 },

    /// A type code did not fit in the 7-bit type space.
    #[error("TLV type {0} does not fit in 7 bits (0..=127)")]
    TypeOutOfRange(u8),
}

/// Errors raised while parsing a TLV from a byte buffer.
///
/// `execunit-transport` drops a frame and keeps the channel open on any of
/// these rather than propagating them — this type exists so that policy can
/// be implemented via an explicit match, while `Tlv::load` still collapses
/// it to a plain `Option` for callers who only care whether parsing
/// succeeded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("buffer too short: need at least {need} bytes at offset {offset}, have {have}")]
    BufferTooShort {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("declared value length {declared} exceeds remaining buffer ({remaining} bytes) at offset {offset}")]
    LengthExceedsBuffer {
        offset: usize,
        declared: u32,
        remaining: usize,
    },

    #[error("child TLV full_size {child_size} exceeds remaining parent bytes ({remaining})")]
    ChildExceedsParent { child_size: u32, remaining: u32 },

    #[error(transparent)]
    SizeOverflow(#[from] TlvError),
}

/// Errors raised by the typed leaf accessors (`as_i32`, `as_string`, ...).
///
/// These are fatal-to-the-caller for general misuse — callers are expected
/// to propagate via `?` or handle explicitly. The sequence-number decode on
/// the pump thread uses the `Option`-returning `as_i32_opt` instead, which
/// never constructs this type, so a malformed response can't panic that
/// thread.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("accessor requires a leaf TLV, but type {tlv_type} is a parent")]
    NotALeaf { tlv_type: u8 },

    #[error("accessor expects {expected} bytes, leaf payload has {actual} (type {tlv_type})")]
    WrongLength {
        tlv_type: u8,
        expected: usize,
        actual: usize,
    },
}
