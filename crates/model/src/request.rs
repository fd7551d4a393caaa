use crate::ImageAttachment;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The turns, in the order the provider should see them.
    pub messages: Vec<ModelMessage>,
}

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelRole {
    /// The person using the chat.
    User,
    /// The model.
    Assistant,
}

/// A single turn of the request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelMessage {
    /// The author of this turn.
    pub role: ModelRole,
    /// The content of this turn, in order.
    pub parts: Vec<ModelPart>,
}

impl ModelMessage {
    /// Creates a user turn with a single text part.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: ModelRole::User,
            parts: vec![ModelPart::Text(text.into())],
        }
    }

    /// Creates an assistant turn with a single text part.
    #[inline]
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self {
            role: ModelRole::Assistant,
            parts: vec![ModelPart::Text(text.into())],
        }
    }

    /// Appends an image part to this turn.
    #[inline]
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.parts.push(ModelPart::Image(image));
        self
    }
}

/// A piece of content in a turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelPart {
    /// Plain text.
    Text(String),
    /// An inline image.
    Image(ImageAttachment),
}
