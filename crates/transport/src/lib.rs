//! # execunit-transport — framed transport over a duplex local IPC stream
//!
//! Wraps a duplex byte stream (see [`Duplex`]) with length-prefixed
//! framing, a dedicated receive pump thread, and a send-mutex-serialized
//! send path. This crate knows nothing about the Listener/Command protocol
//! roles — it dispatches each parsed top-level TLV to a generic
//! [`InboundHandler`], which `execunit-listener` and `execunit-command`
//! each implement once.

mod duplex;
mod error;
mod framed;
mod inbound;

pub use duplex::Duplex;
#[cfg(unix)]
pub use duplex::connect_unix;
pub use error::TransportError;
pub use framed::FramedTransport;
pub use inbound::InboundHandler;
