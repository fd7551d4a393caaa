//! Conversation-related types.

use palaver_model::{ImageAttachment, ModelMessage};

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person using the chat.
    User,
    /// The model, or the orchestrator speaking on its behalf.
    Assistant,
}

/// An entry in the conversation log.
///
/// Messages are never modified once they are in the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
    image: Option<ImageAttachment>,
}

impl Message {
    #[inline]
    pub(crate) fn user(text: String, image: Option<ImageAttachment>) -> Self {
        Self {
            role: Role::User,
            text,
            image,
        }
    }

    #[inline]
    pub(crate) fn assistant(text: String) -> Self {
        Self {
            role: Role::Assistant,
            text,
            image: None,
        }
    }

    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text shown for this message.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the attached image, if any.
    #[inline]
    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub(crate) fn to_model_message(&self) -> ModelMessage {
        let msg = match self.role {
            Role::User => ModelMessage::user(self.text.as_str()),
            Role::Assistant => ModelMessage::assistant(self.text.as_str()),
        };
        match &self.image {
            Some(image) => msg.with_image(image.clone()),
            None => msg,
        }
    }
}

/// Represents a conversation. Append-only.
#[derive(Clone, Default, Debug)]
pub(crate) struct Conversation {
    items: Vec<Message>,
}

impl Conversation {
    #[inline]
    pub fn push(&mut self, msg: Message) {
        self.items.push(msg);
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.items
    }
}

/// A point-in-time copy of the orchestrator state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationSnapshot {
    /// All messages, oldest first.
    pub messages: Vec<Message>,
    /// Whether a request is in flight.
    pub busy: bool,
    /// Whether an image is waiting to be sent.
    pub has_staged_image: bool,
}
