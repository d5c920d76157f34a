//! The Command role's [`InboundHandler`] implementation: dispatches the two
//! inbound push kinds to user-supplied sinks.

use parking_lot::RwLock;

use execunit_tlv::Tlv;
use execunit_transport::InboundHandler;

use crate::protocol::{TYPE_NEW_DATA, TYPE_STOP};

pub(crate) type StopSink = dyn Fn() + Send + Sync;
pub(crate) type NewDataSink = dyn Fn(Vec<u8>) + Send + Sync;

pub(crate) struct CommandHandler {
    pub(crate) stop_sink: RwLock<Option<Box<StopSink>>>,
    pub(crate) new_data_sink: RwLock<Option<Box<NewDataSink>>>,
}

impl CommandHandler {
    pub(crate) fn new() -> Self {
        Self {
            stop_sink: RwLock::new(None),
            new_data_sink: RwLock::new(None),
        }
    }
}

impl InboundHandler for CommandHandler {
    fn handle_incoming(&self, tlv: Tlv) -> bool {
        match tlv.tlv_type() {
            TYPE_STOP => {
                if let Some(sink) = self.stop_sink.read().as_ref() {
                    sink();
                }
                true
            }
            TYPE_NEW_DATA => {
                match tlv.as_bytes() {
                    Ok(data) => {
                        if let Some(sink) = self.new_data_sink.read().as_ref() {
                            sink(data);
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "command: new-data TLV is not a leaf, dropped"),
                }
                true
            }
            other => {
                tracing::debug!(tlv_type = other, "command: unrecognized top-level TLV");
                false
            }
        }
    }
}
