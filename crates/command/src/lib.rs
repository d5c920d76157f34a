//! # execunit-command — fire-and-forget result/error/config plus push sinks
//!
//! Exposes one-way outbound message kinds (result, error, success/failed
//! return, config) and dispatches two inbound kinds ("new data", "stop") to
//! user-supplied sinks. Unlike the Listener role, Command allocates no
//! sequence numbers and blocks on nothing.

mod handler;
mod protocol;

use std::sync::Arc;

use execunit_config::ChannelConfig;
use execunit_tlv::Tlv;
use execunit_transport::{Duplex, FramedTransport, TransportError};

use handler::CommandHandler;
use protocol::{
    CHILD_ONGOING, CHILD_STOP_WAIT, TYPE_CONFIG, TYPE_ERROR, TYPE_RESULT, TYPE_RETURN_FAILED,
    TYPE_RETURN_SUCCESS,
};

/// A Command-role handle over a duplex stream `D`. Cheap to clone (shares
/// the underlying transport and sink registrations with every other clone).
pub struct Command<D: Duplex> {
    transport: FramedTransport<D, CommandHandler>,
    handler: Arc<CommandHandler>,
}

impl<D: Duplex> Clone for Command<D> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<D: Duplex> Command<D> {
    /// Perform the handshake and start the receive pump over `stream`.
    /// Returns the handle and the handshake frame's raw payload.
    pub fn connect(stream: D, config: &ChannelConfig) -> Result<(Self, Vec<u8>), TransportError> {
        let handler = Arc::new(CommandHandler::new());
        let (transport, handshake_payload) =
            FramedTransport::connect(stream, config, handler.clone())?;
        Ok((
            Self {
                transport,
                handler,
            },
            handshake_payload,
        ))
    }

    pub fn is_active(&self) -> bool {
        self.transport.is_active()
    }

    /// Atomically replace the sink invoked on an inbound `0x3F` stop TLV.
    pub fn set_stop_sink<F>(&self, sink: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.handler.stop_sink.write() = Some(Box::new(sink));
    }

    /// Atomically replace the sink invoked on an inbound `0x39` new-data TLV,
    /// with that TLV's leaf payload.
    pub fn set_new_data_sink<F>(&self, sink: F)
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        *self.handler.new_data_sink.write() = Some(Box::new(sink));
    }

    /// `type = 0x30`, payload is `bytes` verbatim.
    pub fn send_result(&self, bytes: Vec<u8>) -> bool {
        self.send_leaf(TYPE_RESULT, bytes)
    }

    /// `type = 0x32`, payload is `bytes` verbatim.
    pub fn send_error(&self, bytes: Vec<u8>) -> bool {
        self.send_leaf(TYPE_ERROR, bytes)
    }

    /// `type = 0x33`, empty payload.
    pub fn send_return_success(&self) -> bool {
        self.send_leaf(TYPE_RETURN_SUCCESS, Vec::new())
    }

    /// `type = 0x34`, empty payload.
    pub fn send_return_failed(&self) -> bool {
        self.send_leaf(TYPE_RETURN_FAILED, Vec::new())
    }

    /// `type = 0x31` parent with one child `0x01 = [0x01]`.
    pub fn send_conf_ongoing_result(&self) -> bool {
        self.transport.put_data(&build_conf_ongoing())
    }

    /// `type = 0x31` parent with one child `0x03 = ms` (4-byte LE).
    pub fn send_conf_stop_wait(&self, ms: i32) -> bool {
        self.transport.put_data(&build_conf_stop_wait(ms))
    }

    pub fn close(&self) {
        self.transport.close();
    }

    fn send_leaf(&self, msg_type: u8, data: Vec<u8>) -> bool {
        match Tlv::new_leaf(msg_type, data) {
            Ok(tlv) => self.transport.put_data(&tlv.full_buffer()),
            Err(e) => {
                tracing::warn!(error = %e, tlv_type = msg_type, "command: payload too large to frame");
                false
            }
        }
    }
}

/// Construction here cannot fail: `TYPE_CONFIG`/`CHILD_ONGOING` are fixed,
/// in-range type bytes and the child is a single fixed-size byte.
fn build_conf_ongoing() -> Vec<u8> {
    let mut config = Tlv::new_parent(TYPE_CONFIG).expect("command config type is in-range");
    config
        .add_child(Tlv::new_leaf(CHILD_ONGOING, vec![0x01]).expect("1-byte leaf always fits"))
        .expect("single small child never overflows u32");
    config.full_buffer()
}

fn build_conf_stop_wait(ms: i32) -> Vec<u8> {
    let mut config = Tlv::new_parent(TYPE_CONFIG).expect("command config type is in-range");
    config
        .add_child(
            Tlv::new_leaf(CHILD_STOP_WAIT, ms.to_le_bytes().to_vec())
                .expect("4-byte leaf always fits"),
        )
        .expect("single small child never overflows u32");
    config.full_buffer()
}
