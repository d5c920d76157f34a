//! # execunit-listener — correlated request/response atop a framed transport
//!
//! Issues request TLVs carrying a monotonically increasing sequence number,
//! blocks the caller until the matching response arrives, and dispatches
//! unsolicited callback TLVs to a user-supplied sink. Sequence allocation
//! happens inside [`execunit_transport::FramedTransport::send_locked`] so it
//! is bundled atomically with the frame's position on the wire.

mod correlation;
mod handler;
mod protocol;

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use execunit_config::ChannelConfig;
use execunit_tlv::Tlv;
use execunit_transport::{Duplex, FramedTransport, TransportError};

use handler::ListenerHandler;
use protocol::{
    CHILD_COMMAND_SELECTOR, CHILD_SEQUENCE, COMMAND_SELECTOR, TYPE_GET_DATA_TO_SEND,
    TYPE_GET_METADATA, TYPE_NEW_DATA_FROM_C2,
};

/// A Listener-role handle over a duplex stream `D`. Cheap to clone (shares
/// the underlying transport, dispatch state, and sequence counter with every
/// other clone).
pub struct Listener<D: Duplex> {
    transport: FramedTransport<D, ListenerHandler>,
    handler: Arc<ListenerHandler>,
    next_seq: Arc<AtomicI32>,
    default_response_timeout: Duration,
}

impl<D: Duplex> Clone for Listener<D> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            handler: self.handler.clone(),
            next_seq: self.next_seq.clone(),
            default_response_timeout: self.default_response_timeout,
        }
    }
}

impl<D: Duplex> Listener<D> {
    /// Perform the handshake and start the receive pump over `stream`.
    /// Returns the handle and the handshake frame's raw payload. `config`'s
    /// `default_response_timeout_ms` becomes the fallback a general-purpose
    /// [`Listener::wait_for_response`] call uses when given `None`.
    pub fn connect(stream: D, config: &ChannelConfig) -> Result<(Self, Vec<u8>), TransportError> {
        let handler = Arc::new(ListenerHandler::new());
        let (transport, handshake_payload) =
            FramedTransport::connect(stream, config, handler.clone())?;
        Ok((
            Self {
                transport,
                handler,
                next_seq: Arc::new(AtomicI32::new(1)),
                default_response_timeout: config.default_response_timeout(),
            },
            handshake_payload,
        ))
    }

    pub fn is_active(&self) -> bool {
        self.transport.is_active()
    }

    /// Atomically replace the sink invoked for unsolicited `0x20` callback
    /// TLVs. `None` (the default) means callbacks are silently dropped.
    pub fn set_callback<F>(&self, sink: F)
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        *self.handler.callback.write() = Some(Box::new(sink));
    }

    /// Sends a `type = 0x21` request and blocks until the matching response
    /// arrives. `None` if the transport is inactive or the connection is
    /// torn down while waiting.
    pub fn get_metadata(&self) -> Option<Vec<u8>> {
        self.request(TYPE_GET_METADATA)
    }

    /// Sends a `type = 0x22` request and blocks until the matching response
    /// arrives.
    pub fn get_data_to_send(&self) -> Option<Vec<u8>> {
        self.request(TYPE_GET_DATA_TO_SEND)
    }

    /// Fire-and-forget `type = 0x23` leaf carrying `data`. `true` on
    /// successful transmission.
    pub fn new_data_from_c2(&self, data: Vec<u8>) -> bool {
        match Tlv::new_leaf(TYPE_NEW_DATA_FROM_C2, data) {
            Ok(tlv) => self.transport.put_data(&tlv.full_buffer()),
            Err(e) => {
                tracing::warn!(error = %e, "listener: new_data_from_c2 payload too large to frame");
                false
            }
        }
    }

    /// General-purpose wait for the response to sequence `id`. `timeout`
    /// overrides the connect-time `default_response_timeout_ms`; `None`
    /// falls back to that default rather than waiting forever — callers
    /// who genuinely want an unbounded wait should pass
    /// `Some(Duration::MAX)`. `get_metadata`/`get_data_to_send` do not call
    /// this; they always wait forever via their own request path.
    pub fn wait_for_response(&self, id: i32, timeout: Option<Duration>) -> Option<Vec<u8>> {
        let timeout = timeout.unwrap_or(self.default_response_timeout);
        self.handler.correlation.wait(id, Some(timeout))
    }

    /// Tears down the transport, then destroys all remaining wakers and
    /// clears both correlation tables.
    pub fn close(&self) {
        self.transport.close();
        self.handler.correlation.dispose();
    }

    fn request(&self, msg_type: u8) -> Option<Vec<u8>> {
        let next_seq = &self.next_seq;
        let seq = self.transport.send_locked(|| {
            let seq = next_seq.fetch_add(1, Ordering::SeqCst);
            (build_request(msg_type, seq), seq)
        })?;
        self.handler.correlation.wait(seq, None)
    }
}

/// Builds the `type ∈ {0x21, 0x22}` request frame: a parent with child
/// `0x01 = [0x01]` (command selector) and child `0x02 = seq` (4-byte LE).
/// Every part here is a fixed, in-range type byte and a fixed-size child, so
/// construction cannot fail.
fn build_request(msg_type: u8, seq: i32) -> Vec<u8> {
    let mut request = Tlv::new_parent(msg_type).expect("listener request type is in-range");
    request
        .add_child(
            Tlv::new_leaf(CHILD_COMMAND_SELECTOR, vec![COMMAND_SELECTOR])
                .expect("1-byte leaf always fits"),
        )
        .expect("two fixed-size children never overflow u32");
    request
        .add_child(
            Tlv::new_leaf(CHILD_SEQUENCE, seq.to_le_bytes().to_vec())
                .expect("4-byte leaf always fits"),
        )
        .expect("two fixed-size children never overflow u32");
    request.full_buffer()
}
