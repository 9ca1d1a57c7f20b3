//! Capability registry and remote invocation wire format bounds.

/// Maximum number of capabilities registered in one process.
pub const MAX_CAPABILITIES: u32 = 64;

/// Maximum byte length of any length-prefixed string in the wire format.
pub const MAX_WIRE_STRING_LEN: usize = u16::MAX as usize;

/// Maximum number of parameters in a remote invocation request.
pub const MAX_WIRE_PARAMS: usize = u16::MAX as usize;
