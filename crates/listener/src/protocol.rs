//! Wire constants for the Listener role. Kept in one place so the request
//! builders and the inbound dispatcher can't drift apart on a type byte.

pub const TYPE_CALLBACK: u8 = 0x20;
pub const TYPE_GET_METADATA: u8 = 0x21;
pub const TYPE_GET_DATA_TO_SEND: u8 = 0x22;
pub const TYPE_NEW_DATA_FROM_C2: u8 = 0x23;

pub const CHILD_COMMAND_SELECTOR: u8 = 0x01;
pub const CHILD_SEQUENCE: u8 = 0x02;
pub const CHILD_DATA: u8 = 0x04;

/// The single command-selector byte both request APIs send in child `0x01`.
pub const COMMAND_SELECTOR: u8 = 0x01;
