//! # execunit-tlv — recursive TLV codec
//!
//! A self-describing, tree-structured binary value: a [`Tlv`] is either a
//! *leaf* (opaque bytes) or a *parent* (children grouped by child type,
//! insertion-ordered within each group). This crate owns construction,
//! parsing, serialization, and the typed leaf accessors. It does no I/O —
//! `execunit-transport` is what reads/writes frames on a stream and hands
//! this crate raw bytes to parse.
//!
//! ## Wire format
//!
//! ```text
//! byte 0        : (is_parent << 7) | (type & 0x7F)
//! bytes 1..4    : value_length : u32 little-endian
//! bytes 5..5+L  : value bytes
//! ```
//!
//! `full_size` accounting, bounds enforcement on parse, and child grouping
//! are the three invariants every node upholds (see `node.rs`/`codec.rs`).

mod accessors;
mod codec;
pub mod error;
mod node;

pub use error::{AccessError, ParseError, TlvError};
pub use node::Tlv;
