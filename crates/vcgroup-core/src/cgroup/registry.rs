//! Backend registration and once-per-process selection.

use std::sync::OnceLock;

use vcgroup_common::config::CgroupConfig;

use super::backend::{BackendType, CgroupBackend};
use super::v1::V1Backend;

/// Set of backends keyed by hierarchy version, in preference order.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Box<dyn CgroupBackend>>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in backend.
    #[must_use]
    pub fn with_builtin(config: &CgroupConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(V1Backend::with_config(config.clone())));
        registry
    }

    /// Adds `backend`, replacing any earlier one of the same type.
    pub fn register(&mut self, backend: Box<dyn CgroupBackend>) {
        let kind = backend.backend_type();
        self.backends.retain(|b| b.backend_type() != kind);
        tracing::debug!(backend = %kind, "registered cgroup backend");
        self.backends.push(backend);
    }

    /// Backend registered for `kind`.
    #[must_use]
    pub fn get(&self, kind: BackendType) -> Option<&dyn CgroupBackend> {
        self.backends
            .iter()
            .find(|b| b.backend_type() == kind)
            .map(AsRef::as_ref)
    }

    /// First registered backend whose availability probe succeeds.
    #[must_use]
    pub fn select_available(&self) -> Option<&dyn CgroupBackend> {
        let selected = self.backends.iter().find(|b| b.available()).map(AsRef::as_ref);
        match selected {
            Some(b) => tracing::info!(backend = %b.backend_type(), "selected cgroup backend"),
            None => tracing::warn!("no cgroup backend available"),
        }
        selected
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.backends.iter().map(|b| b.backend_type()))
            .finish()
    }
}

static REGISTRY: OnceLock<(CgroupConfig, BackendRegistry)> = OnceLock::new();
static SELECTED: OnceLock<Option<BackendType>> = OnceLock::new();

/// Installs the process-wide registry of the built-in backends over `config`.
///
/// The first call wins; later calls return the registry built then and
/// ignore their `config`.
pub fn init(config: &CgroupConfig) -> &'static BackendRegistry {
    let (installed, registry) =
        REGISTRY.get_or_init(|| (config.clone(), BackendRegistry::with_builtin(config)));
    if installed != config {
        tracing::warn!(
            installed = ?installed,
            requested = ?config,
            "cgroup registry already initialised, keeping first configuration"
        );
    }
    registry
}

/// Process-wide registry, over the live `/proc` unless [`init`] ran first.
pub fn registry() -> &'static BackendRegistry {
    match REGISTRY.get() {
        Some((_, registry)) => registry,
        None => init(&CgroupConfig::default()),
    }
}

/// Backend selected for this process.
///
/// The availability probe runs on the first call only; the choice then
/// stays fixed for the process lifetime.
pub fn backend() -> Option<&'static dyn CgroupBackend> {
    let registry = registry();
    let kind = SELECTED.get_or_init(|| registry.select_available().map(|b| b.backend_type()));
    kind.and_then(|k| registry.get(k))
}
