mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use palaver_model::ImageAttachment;
use tokio::sync::oneshot;

use crate::actor::{Actor, ActorDeadError};
use crate::config::OrchestratorConfig;
use crate::conversation::{Conversation, ConversationSnapshot, Message};
use crate::debounce::Debouncer;
use crate::model_client::ModelClient;
pub use builder::OrchestratorBuilder;
use state::{
    ClearStagedImage, GetSnapshot, StageImage, SubmitImage, SubmitQuickAction,
    SubmitText,
};

type StateChangeFn = Box<dyn Fn(&StateChange) + Send + Sync>;

/// A change in the orchestrator state, for whatever renders it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateChange {
    /// A message was appended to the conversation.
    MessageAppended(Message),
    /// A request started (`true`) or finished (`false`).
    BusyChanged(bool),
    /// An image is now waiting to be sent.
    ImageStaged,
    /// The staged image was sent or discarded.
    ImageCleared,
}

/// The conversation orchestrator.
///
/// It owns the message log and turns user intents into request/response
/// exchanges with the provider, one at a time. All operations return
/// immediately; their effects are reported through the
/// [`OrchestratorBuilder::on_state_change`] callback and can be observed
/// with [`Orchestrator::snapshot`].
///
/// The submit operations are debounced: a burst of calls within the
/// configured window counts as its last call. A submission arriving while
/// a request is in flight is dropped.
#[derive(Clone)]
pub struct Orchestrator {
    handle: Actor<OrchestratorState>,
}

pub(crate) struct OrchestratorState {
    model_client: ModelClient,
    config: Arc<OrchestratorConfig>,
    conversation: Conversation,
    busy: bool,
    staged_image: Option<ImageAttachment>,
    text_gate: Debouncer<String>,
    quick_action_gate: Debouncer<(String, String)>,
    image_gate: Debouncer<Option<String>>,

    on_state_change: Option<StateChangeFn>,
    on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl Orchestrator {
    /// Sends `text` as a user message. Blank text is ignored.
    pub fn submit_text<S: Into<String>>(&self, text: S) {
        self.post(SubmitText(text.into()));
    }

    /// Records `label` as the user message but sends `prompt` to the
    /// provider.
    pub fn submit_quick_action<L, P>(&self, label: L, prompt: P)
    where
        L: Into<String>,
        P: Into<String>,
    {
        self.post(SubmitQuickAction {
            label: label.into(),
            prompt: prompt.into(),
        });
    }

    /// Stages an image for the next [`Self::submit_image`], replacing any
    /// image staged before.
    pub fn stage_image(&self, image: ImageAttachment) {
        self.post(StageImage(image));
    }

    /// Discards the staged image, if any.
    pub fn clear_staged_image(&self) {
        self.post(ClearStagedImage);
    }

    /// Sends the staged image for analysis, with an optional caption.
    ///
    /// Ignored when no image is staged. The staged image is cleared
    /// whatever the outcome.
    pub fn submit_image(&self, caption: Option<String>) {
        self.post(SubmitImage(caption));
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(
        &self,
    ) -> Result<ConversationSnapshot, ActorDeadError> {
        let (tx, rx) = oneshot::channel();
        self.handle.send(GetSnapshot(tx))?;
        rx.await.map_err(|_| ActorDeadError)
    }

    fn post<M: crate::actor::Message<OrchestratorState>>(&self, msg: M) {
        if self.handle.send(msg).is_err() {
            warn!("orchestrator has died, dropping the request");
        }
    }
}

impl Orchestrator {
    fn spawn_from_builder(builder: OrchestratorBuilder) -> Self {
        let OrchestratorBuilder {
            model_client,
            config,
            store,
            on_state_change,
            on_idle,
        } = builder;

        let greeting = crate::greeting::greet(
            store.as_ref(),
            &config,
            std::time::SystemTime::now(),
        );
        let mut conversation = Conversation::default();
        conversation.push(Message::assistant(greeting.to_owned()));

        let state = OrchestratorState {
            model_client,
            config: Arc::new(config),
            conversation,
            busy: false,
            staged_image: None,
            text_gate: Debouncer::new(),
            quick_action_gate: Debouncer::new(),
            image_gate: Debouncer::new(),
            on_state_change,
            on_idle,
        };
        let handle = Actor::spawn(state, "orchestrator");
        Self { handle }
    }
}
