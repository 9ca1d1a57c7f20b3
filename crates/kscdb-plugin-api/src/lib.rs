//! Remote invocation types for kscdb.
//!
//! A [`RemoteInvocationRequest`] names a capability, one of its functions and
//! a list of string parameters. It travels in a compact little-endian binary
//! layout (see [`codec`]) and is dispatched through a [`CapabilityRegistry`]
//! populated at process start. There is no dynamic code loading: every
//! capability is a Rust value registered up front.

pub mod codec;
mod error;
pub mod registry;

pub use codec::RemoteInvocationRequest;
pub use error::CodecError;
pub use error::PluginError;
pub use registry::Capability;
pub use registry::CapabilityRegistry;
pub use registry::FnCapability;
