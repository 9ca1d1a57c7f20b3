//! Error types for the codec and the capability registry.

use snafu::Snafu;

/// Errors encoding or decoding a remote invocation request.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum CodecError {
    /// A string or the parameter list does not fit its `u16` length prefix.
    #[snafu(display("{field} length {len} exceeds wire maximum of {max}"))]
    FieldTooLong {
        /// Field that overflowed.
        field: String,
        /// Actual length.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },

    /// Input bytes do not form a valid request.
    #[snafu(display("malformed request at {field}: {reason}"))]
    MalformedInput {
        /// Field being decoded when the problem was found.
        field: String,
        /// What went wrong.
        reason: String,
    },
}

/// Errors from the capability registry.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PluginError {
    /// No capability with this name, or the capability lacks the function.
    #[snafu(display("capability '{capability}' has no function '{function}'"))]
    CapabilityNotFound {
        /// Requested capability.
        capability: String,
        /// Requested function.
        function: String,
    },

    /// A capability with this name is already registered.
    #[snafu(display("capability '{name}' is already registered"))]
    DuplicateCapability {
        /// Capability name.
        name: String,
    },

    /// The registry is full.
    #[snafu(display("capability registry is full ({max} capabilities)"))]
    TooManyCapabilities {
        /// Registry capacity.
        max: u32,
    },

    /// The capability ran and reported a failure.
    #[snafu(display("{capability}.{function} failed: {reason}"))]
    InvocationFailed {
        /// Capability name.
        capability: String,
        /// Function name.
        function: String,
        /// Failure description from the capability.
        reason: String,
    },

    /// The request could not be decoded.
    #[snafu(display("invalid request: {source}"))]
    Codec {
        /// The underlying error.
        source: CodecError,
    },
}

impl PluginError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PluginError::CapabilityNotFound { .. })
    }
}

impl From<CodecError> for PluginError {
    fn from(source: CodecError) -> Self {
        PluginError::Codec { source }
    }
}
