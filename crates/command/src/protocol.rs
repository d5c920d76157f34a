//! Wire constants for the Command role.

pub const TYPE_RESULT: u8 = 0x30;
pub const TYPE_CONFIG: u8 = 0x31;
pub const TYPE_ERROR: u8 = 0x32;
pub const TYPE_RETURN_SUCCESS: u8 = 0x33;
pub const TYPE_RETURN_FAILED: u8 = 0x34;

pub const TYPE_NEW_DATA: u8 = 0x39;
pub const TYPE_STOP: u8 = 0x3F;

pub const CHILD_ONGOING: u8 = 0x01;
pub const CHILD_STOP_WAIT: u8 = 0x03;
