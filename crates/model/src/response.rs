/// A complete answer from the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelResponse {
    /// The generated text.
    pub text: String,
}

impl ModelResponse {
    /// Creates a response with the given text.
    #[inline]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}
