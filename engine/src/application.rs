//! Per-application configuration shared by all sessions.

use std::fmt;
use std::sync::Arc;

use schema::{types_hash, TypeRegistry};

use crate::adapter::{AdapterRegistry, WidgetAdapter};
use crate::encode::{MapResolver, ResourceResolver};
use crate::error::SyncResult;
use crate::limits::EngineConfig;
use crate::ui::Ui;

/// Builds the initial widget tree of a new session.
pub type EntryPoint = Arc<dyn Fn(&mut Ui<'_>) -> SyncResult<()> + Send + Sync>;

/// Types, adapters, resource resolution and entry point of an application.
///
/// Immutable once built and shared between sessions behind an `Arc`.
pub struct Application {
    types: TypeRegistry,
    types_hash: u64,
    adapters: AdapterRegistry,
    resolver: Box<dyn ResourceResolver>,
    entry_point: Option<EntryPoint>,
    config: EngineConfig,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("types", &self.types.len())
            .field("types_hash", &format_args!("{:016x}", self.types_hash))
            .field("adapters", &self.adapters)
            .field("entry_point", &self.entry_point.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Creates an application with a generic adapter for every type.
    #[must_use]
    pub fn new(types: TypeRegistry) -> Self {
        let adapters = AdapterRegistry::from_types(&types);
        let types_hash = types_hash(&types);
        Self {
            types,
            types_hash,
            adapters,
            resolver: Box::new(MapResolver::new()),
            entry_point: None,
            config: EngineConfig::default(),
        }
    }

    /// Replaces the adapter for the adapter's type tag.
    #[must_use]
    pub fn with_adapter(mut self, adapter: impl WidgetAdapter + 'static) -> Self {
        self.adapters.register(Box::new(adapter));
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl ResourceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Sets the function that builds the widget tree on a session's first
    /// request.
    #[must_use]
    pub fn with_entry_point<F>(mut self, entry_point: F) -> Self
    where
        F: Fn(&mut Ui<'_>) -> SyncResult<()> + Send + Sync + 'static,
    {
        self.entry_point = Some(Arc::new(entry_point));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Fingerprint of the type registry, sent with a session's first
    /// response.
    #[must_use]
    pub const fn types_hash(&self) -> u64 {
        self.types_hash
    }

    #[must_use]
    pub const fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    #[must_use]
    pub fn resolver(&self) -> &dyn ResourceResolver {
        self.resolver.as_ref()
    }

    #[must_use]
    pub fn entry_point(&self) -> Option<&EntryPoint> {
        self.entry_point.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}
