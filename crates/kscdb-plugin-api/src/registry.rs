//! Static capability registry.
//!
//! Capabilities are registered once at process start and looked up by name
//! when a [`RemoteInvocationRequest`] arrives. Dispatch fails with
//! [`PluginError::CapabilityNotFound`] when either the capability or the
//! requested function is unknown.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use kscdb_constants::plugin::MAX_CAPABILITIES;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::codec::RemoteInvocationRequest;
use crate::error::PluginError;

/// A named set of functions callable through a [`RemoteInvocationRequest`].
#[async_trait]
pub trait Capability: Send + Sync {
    /// Name used for lookup. Must be stable for the lifetime of the registry.
    fn name(&self) -> &str;

    /// Returns true if `function` can be invoked. Must not perform I/O.
    fn has_function(&self, function: &str) -> bool;

    /// Run `function` with `params` and return the raw response bytes.
    async fn invoke(&self, function: &str, params: &[String]) -> Result<Vec<u8>, PluginError>;
}

type Handler = Arc<dyn Fn(Vec<String>) -> BoxFuture<'static, Result<Vec<u8>, PluginError>> + Send + Sync>;

/// A [`Capability`] assembled from named async closures.
///
/// ```ignore
/// let echo = FnCapability::new("echo").with_function("join", |params| async move {
///     Ok(params.join(",").into_bytes())
/// });
/// ```
#[derive(Clone)]
pub struct FnCapability {
    name: String,
    functions: HashMap<String, Handler>,
}

impl FnCapability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: HashMap::new(),
        }
    }

    /// Add or replace a function.
    pub fn with_function<F, Fut>(mut self, function: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>, PluginError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |params| Box::pin(handler(params)));
        self.functions.insert(function.into(), handler);
        self
    }

    /// Function names in sorted order.
    pub fn functions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FnCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCapability").field("name", &self.name).field("functions", &self.functions()).finish()
    }
}

#[async_trait]
impl Capability for FnCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_function(&self, function: &str) -> bool {
        self.functions.contains_key(function)
    }

    async fn invoke(&self, function: &str, params: &[String]) -> Result<Vec<u8>, PluginError> {
        match self.functions.get(function) {
            Some(handler) => handler(params.to_vec()).await,
            None => Err(PluginError::CapabilityNotFound {
                capability: self.name.clone(),
                function: function.to_string(),
            }),
        }
    }
}

/// Registry of capabilities keyed by name.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability.
    ///
    /// # Errors
    ///
    /// - [`PluginError::DuplicateCapability`] if the name is taken.
    /// - [`PluginError::TooManyCapabilities`] once the registry holds
    ///   `MAX_CAPABILITIES` entries.
    pub fn register<C: Capability + 'static>(&mut self, capability: C) -> Result<(), PluginError> {
        self.register_arc(Arc::new(capability))
    }

    pub fn register_arc(&mut self, capability: Arc<dyn Capability>) -> Result<(), PluginError> {
        let name = capability.name().to_string();
        if self.capabilities.contains_key(&name) {
            return Err(PluginError::DuplicateCapability { name });
        }
        if self.capabilities.len() >= MAX_CAPABILITIES as usize {
            return Err(PluginError::TooManyCapabilities { max: MAX_CAPABILITIES });
        }
        info!(capability = %name, "registered capability");
        self.capabilities.insert(name, capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.capabilities.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Dispatch a decoded request.
    pub async fn invoke(&self, request: &RemoteInvocationRequest) -> Result<Vec<u8>, PluginError> {
        let not_found = || PluginError::CapabilityNotFound {
            capability: request.capability.clone(),
            function: request.function.clone(),
        };

        let capability = self.capabilities.get(&request.capability).ok_or_else(not_found)?;
        if !capability.has_function(&request.function) {
            return Err(not_found());
        }

        debug!(
            id = request.id,
            capability = %request.capability,
            function = %request.function,
            params = request.params.len(),
            "dispatching invocation"
        );
        let result = capability.invoke(&request.function, &request.params).await;
        if let Err(ref error) = result {
            warn!(
                id = request.id,
                capability = %request.capability,
                function = %request.function,
                error = %error,
                "invocation failed"
            );
        }
        result
    }

    /// Decode `payload` and dispatch it.
    pub async fn invoke_encoded(&self, payload: &[u8]) -> Result<Vec<u8>, PluginError> {
        let request = RemoteInvocationRequest::decode(payload)?;
        self.invoke(&request).await
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry").field("capabilities", &self.names()).finish()
    }
}
