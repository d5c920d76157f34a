//! Errors surfaced at the transport boundary. Most runtime failures here are
//! not propagated to callers — the public API returns `Option`/`bool` and
//! this crate's job is to log and tear the instance down, not to hand the
//! caller a `Result` to match on. `TransportError` exists for the one place
//! a `Result` genuinely helps: reporting *why* `connect` failed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake frame was not a valid TLV")]
    BadHandshake,
}
