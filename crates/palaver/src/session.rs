use palaver_core::conversation::ConversationSnapshot;
use palaver_core::store::KeyValueStore;
use palaver_core::{
    ActorDeadError, Orchestrator, OrchestratorBuilder, OrchestratorConfig,
    StateChange,
};
use palaver_model::{ImageAttachment, ModelProvider};

use crate::QuickAction;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    orchestrator_builder: OrchestratorBuilder,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let orchestrator_builder =
            OrchestratorBuilder::with_model_provider(provider);
        Self {
            orchestrator_builder,
        }
    }

    /// Replaces the default orchestrator configuration.
    #[inline]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.orchestrator_builder =
            self.orchestrator_builder.with_config(config);
        self
    }

    /// Sets the store used to remember visits.
    #[inline]
    pub fn with_store(mut self, store: impl KeyValueStore) -> Self {
        self.orchestrator_builder = self.orchestrator_builder.with_store(store);
        self
    }

    /// Attaches a callback to be invoked when the session becomes idle.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.orchestrator_builder = self.orchestrator_builder.on_idle(on_idle);
        self
    }

    /// Attaches a callback to be invoked on every state change.
    #[inline]
    pub fn on_state_change(
        mut self,
        on_state_change: impl Fn(&StateChange) + Send + Sync + 'static,
    ) -> Self {
        self.orchestrator_builder =
            self.orchestrator_builder.on_state_change(on_state_change);
        self
    }

    /// Builds a new session. Must be called within a tokio runtime.
    pub fn build(self) -> Session {
        Session {
            orchestrator: self.orchestrator_builder.build(),
        }
    }
}

/// A chat session, like a window that displays messages and has an input
/// box, a row of quick actions and an image picker.
///
/// It is basically a wrapper around [`Orchestrator`].
#[derive(Clone)]
pub struct Session {
    orchestrator: Orchestrator,
}

impl Session {
    /// Sends a message to the session.
    #[inline]
    pub fn send_message(&self, message: &str) {
        self.orchestrator.submit_text(message);
    }

    /// Runs a quick action.
    #[inline]
    pub fn quick_action(&self, action: &QuickAction) {
        self.orchestrator
            .submit_quick_action(action.label, action.prompt);
    }

    /// Picks an image for the next [`Self::send_image`].
    #[inline]
    pub fn attach_image(&self, image: ImageAttachment) {
        self.orchestrator.stage_image(image);
    }

    /// Drops the picked image.
    #[inline]
    pub fn discard_image(&self) {
        self.orchestrator.clear_staged_image();
    }

    /// Sends the picked image, with an optional caption.
    #[inline]
    pub fn send_image(&self, caption: Option<String>) {
        self.orchestrator.submit_image(caption);
    }

    /// Returns what the window currently shows.
    #[inline]
    pub async fn snapshot(
        &self,
    ) -> Result<ConversationSnapshot, ActorDeadError> {
        self.orchestrator.snapshot().await
    }
}
