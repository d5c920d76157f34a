//! The Listener role's [`InboundHandler`] implementation: dispatches
//! callback TLVs to a user sink and response TLVs into the correlation
//! tables.

use parking_lot::RwLock;

use execunit_tlv::Tlv;
use execunit_transport::InboundHandler;

use crate::correlation::Correlation;
use crate::protocol::{CHILD_DATA, CHILD_SEQUENCE, TYPE_CALLBACK, TYPE_GET_DATA_TO_SEND, TYPE_GET_METADATA};

pub(crate) type CallbackSink = dyn Fn(Vec<u8>) + Send + Sync;

pub(crate) struct ListenerHandler {
    pub(crate) callback: RwLock<Option<Box<CallbackSink>>>,
    pub(crate) correlation: Correlation,
}

impl ListenerHandler {
    pub(crate) fn new() -> Self {
        Self {
            callback: RwLock::new(None),
            correlation: Correlation::new(),
        }
    }
}

impl InboundHandler for ListenerHandler {
    fn handle_incoming(&self, tlv: Tlv) -> bool {
        match tlv.tlv_type() {
            TYPE_CALLBACK => {
                if let Some(data) = tlv.get_child(CHILD_DATA, 0).and_then(|c| c.as_bytes().ok()) {
                    if let Some(sink) = self.callback.read().as_ref() {
                        sink(data);
                    }
                }
                true
            }
            TYPE_GET_METADATA | TYPE_GET_DATA_TO_SEND => {
                match tlv.get_child(CHILD_SEQUENCE, 0).and_then(|c| c.as_i32_opt()) {
                    Some(id) => self.correlation.deliver(id, tlv),
                    None => tracing::warn!(
                        tlv_type = tlv.tlv_type(),
                        "listener: response missing or malformed sequence child, dropped"
                    ),
                }
                true
            }
            other => {
                tracing::debug!(tlv_type = other, "listener: unrecognized top-level TLV");
                false
            }
        }
    }
}
