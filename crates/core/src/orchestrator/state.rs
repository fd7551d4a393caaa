use std::fmt::{self, Debug};

use palaver_model::ImageAttachment;
use tokio::sync::oneshot;

use super::{OrchestratorState, StateChange};
use crate::actor::{Actor, Message};
use crate::conversation::{ConversationSnapshot, Message as ConversationItem};
use crate::model_client::Generation;
use crate::prompt::build_request;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Gate {
    Text,
    QuickAction,
    Image,
}

impl OrchestratorState {
    fn notify(&self, change: StateChange) {
        if let Some(on_state_change) = &self.on_state_change {
            on_state_change(&change);
        }
    }

    fn append(&mut self, msg: ConversationItem) {
        self.conversation.push(msg.clone());
        self.notify(StateChange::MessageAppended(msg));
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.notify(StateChange::BusyChanged(busy));
    }

    fn arm(&self, gate: Gate, ticket: u64, handle: &Actor<Self>) {
        handle.send_after(
            self.config.debounce_window,
            DebounceElapsed { gate, ticket },
        );
    }

    fn fire(&mut self, gate: Gate, ticket: u64, handle: &Actor<Self>) {
        match gate {
            Gate::Text => {
                if let Some(text) = self.text_gate.fire(ticket) {
                    self.process_text(text, handle);
                }
            }
            Gate::QuickAction => {
                if let Some((label, prompt)) =
                    self.quick_action_gate.fire(ticket)
                {
                    self.process_quick_action(label, prompt, handle);
                }
            }
            Gate::Image => {
                if let Some(caption) = self.image_gate.fire(ticket) {
                    self.process_image(caption, handle);
                }
            }
        }
    }

    fn process_text(&mut self, text: String, handle: &Actor<Self>) {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank input");
            return;
        }
        if self.busy {
            debug!("busy, ignoring input");
            return;
        }
        let text = text.to_owned();
        self.start_exchange(
            ConversationItem::user(text.clone(), None),
            text,
            None,
            handle,
        );
    }

    fn process_quick_action(
        &mut self,
        label: String,
        prompt: String,
        handle: &Actor<Self>,
    ) {
        let (label, prompt) = (label.trim(), prompt.trim());
        if label.is_empty() || prompt.is_empty() {
            debug!("ignoring blank quick action");
            return;
        }
        if self.busy {
            debug!("busy, ignoring quick action");
            return;
        }
        self.start_exchange(
            ConversationItem::user(label.to_owned(), None),
            prompt.to_owned(),
            None,
            handle,
        );
    }

    fn process_image(&mut self, caption: Option<String>, handle: &Actor<Self>) {
        if self.busy {
            debug!("busy, ignoring image submission");
            return;
        }
        let Some(image) = self.staged_image.take() else {
            debug!("no staged image, ignoring image submission");
            return;
        };
        self.notify(StateChange::ImageCleared);

        let caption = caption
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());
        let prompt = self.config.image_prompt(caption.as_deref());
        let text = caption
            .unwrap_or_else(|| self.config.default_image_caption.clone());
        self.start_exchange(
            ConversationItem::user(text, Some(image.clone())),
            prompt,
            Some(image),
            handle,
        );
    }

    /// Appends the user message and spawns the request, assuming the
    /// orchestrator is idle.
    fn start_exchange(
        &mut self,
        user_msg: ConversationItem,
        prompt: String,
        image: Option<ImageAttachment>,
        handle: &Actor<Self>,
    ) {
        let request = build_request(
            &self.config,
            self.conversation.messages(),
            prompt,
            image,
        );
        self.append(user_msg);
        self.set_busy(true);

        let model_client = self.model_client.clone();
        let policy = self.config.retry_policy;
        let handle = handle.clone();
        tokio::spawn(async move {
            let generation = model_client.generate(request, &policy).await;
            if handle.send(GenerationFinished(generation)).is_err() {
                warn!("orchestrator died while a request was in flight");
            }
        });
    }

    fn finish_exchange(&mut self, generation: Generation) {
        let text = match generation {
            Generation::Success(text) => text,
            Generation::Failure(kind) => {
                self.config.fallbacks.message_for(kind).to_owned()
            }
        };
        self.append(ConversationItem::assistant(text));
        self.set_busy(false);

        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }

    fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.conversation.messages().to_vec(),
            busy: self.busy,
            has_staged_image: self.staged_image.is_some(),
        }
    }
}

#[derive(Debug)]
pub struct SubmitText(pub String);

impl Message<OrchestratorState> for SubmitText {
    fn handle(
        self,
        state: &mut OrchestratorState,
        handle: &Actor<OrchestratorState>,
    ) {
        let ticket = state.text_gate.push(self.0);
        state.arm(Gate::Text, ticket, handle);
    }
}

#[derive(Debug)]
pub struct SubmitQuickAction {
    pub label: String,
    pub prompt: String,
}

impl Message<OrchestratorState> for SubmitQuickAction {
    fn handle(
        self,
        state: &mut OrchestratorState,
        handle: &Actor<OrchestratorState>,
    ) {
        let ticket = state.quick_action_gate.push((self.label, self.prompt));
        state.arm(Gate::QuickAction, ticket, handle);
    }
}

#[derive(Debug)]
pub struct SubmitImage(pub Option<String>);

impl Message<OrchestratorState> for SubmitImage {
    fn handle(
        self,
        state: &mut OrchestratorState,
        handle: &Actor<OrchestratorState>,
    ) {
        let ticket = state.image_gate.push(self.0);
        state.arm(Gate::Image, ticket, handle);
    }
}

#[derive(Debug)]
pub struct StageImage(pub ImageAttachment);

impl Message<OrchestratorState> for StageImage {
    fn handle(
        self,
        state: &mut OrchestratorState,
        _handle: &Actor<OrchestratorState>,
    ) {
        if state.busy {
            debug!("busy, ignoring staged image");
            return;
        }
        state.staged_image = Some(self.0);
        state.notify(StateChange::ImageStaged);
    }
}

#[derive(Debug)]
pub struct ClearStagedImage;

impl Message<OrchestratorState> for ClearStagedImage {
    fn handle(
        self,
        state: &mut OrchestratorState,
        _handle: &Actor<OrchestratorState>,
    ) {
        if state.staged_image.take().is_some() {
            state.notify(StateChange::ImageCleared);
        }
    }
}

#[derive(Debug)]
pub struct GetSnapshot(pub oneshot::Sender<ConversationSnapshot>);

impl Message<OrchestratorState> for GetSnapshot {
    fn handle(
        self,
        state: &mut OrchestratorState,
        _handle: &Actor<OrchestratorState>,
    ) {
        self.0.send(state.snapshot()).ok();
    }
}

#[derive(Debug)]
struct DebounceElapsed {
    gate: Gate,
    ticket: u64,
}

impl Message<OrchestratorState> for DebounceElapsed {
    fn handle(
        self,
        state: &mut OrchestratorState,
        handle: &Actor<OrchestratorState>,
    ) {
        state.fire(self.gate, self.ticket, handle);
    }
}

struct GenerationFinished(Generation);

impl Debug for GenerationFinished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match &self.0 {
            Generation::Success(text) => {
                format!("success, {} bytes", text.len())
            }
            Generation::Failure(kind) => format!("failure, {kind:?}"),
        };
        f.debug_tuple("GenerationFinished").field(&outcome).finish()
    }
}

impl Message<OrchestratorState> for GenerationFinished {
    fn handle(
        self,
        state: &mut OrchestratorState,
        _handle: &Actor<OrchestratorState>,
    ) {
        state.finish_exchange(self.0);
    }
}
