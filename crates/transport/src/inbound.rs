//! The pluggable inbound dispatcher. `execunit-listener` and
//! `execunit-command` each implement this trait once; `FramedTransport` is
//! generic over it and knows nothing about sequence numbers, callbacks, or
//! stop/new-data sinks — role polymorphism through composition rather than
//! a shared base class.

use execunit_tlv::Tlv;

/// Handles one parsed, top-level inbound TLV.
///
/// The `bool` return is for diagnostics only — `true` means the handler
/// recognized the top-level type, `false` means it is logged and dropped.
pub trait InboundHandler: Send + Sync + 'static {
    fn handle_incoming(&self, tlv: Tlv) -> bool;
}
