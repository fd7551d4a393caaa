use palaver_model::ModelProvider;

use super::{Orchestrator, StateChange, StateChangeFn};
use crate::config::OrchestratorConfig;
use crate::model_client::ModelClient;
use crate::store::{KeyValueStore, MemoryStore};

/// [`Orchestrator`] builder.
pub struct OrchestratorBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) config: OrchestratorConfig,
    pub(crate) store: Box<dyn KeyValueStore>,
    pub(crate) on_state_change: Option<StateChangeFn>,
    pub(crate) on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            config: OrchestratorConfig::default(),
            store: Box::new(MemoryStore::default()),
            on_state_change: None,
            on_idle: None,
        }
    }

    /// Replaces the default configuration.
    #[inline]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the store holding the visit markers. Defaults to an in-memory
    /// store, which makes every session a first visit.
    ///
    /// The store is read and written synchronously inside [`Self::build`],
    /// on the calling thread.
    #[inline]
    pub fn with_store(mut self, store: impl KeyValueStore) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Attaches a callback to be invoked on every state change.
    ///
    /// The callback runs on the orchestrator task and should return
    /// quickly.
    #[inline]
    pub fn on_state_change(
        mut self,
        on_state_change: impl Fn(&StateChange) + Send + Sync + 'static,
    ) -> Self {
        self.on_state_change = Some(Box::new(on_state_change));
        self
    }

    /// Attaches a callback to be invoked whenever a request finishes and
    /// the orchestrator becomes idle.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the orchestrator, seeding the greeting.
    ///
    /// Must be called from within a tokio runtime.
    #[inline]
    pub fn build(self) -> Orchestrator {
        Orchestrator::spawn_from_builder(self)
    }
}
