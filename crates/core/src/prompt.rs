use palaver_model::{ImageAttachment, ModelMessage, ModelRequest};

use crate::OrchestratorConfig;
use crate::conversation::Message;

/// Builds the provider request for one exchange.
///
/// Turn order: the instruction block, the acknowledgement, the prior
/// history, then the new prompt with its image.
pub(crate) fn build_request(
    config: &OrchestratorConfig,
    history: &[Message],
    prompt: String,
    image: Option<ImageAttachment>,
) -> ModelRequest {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(ModelMessage::user(config.system_instruction()));
    messages.push(ModelMessage::assistant(config.acknowledgement.as_str()));
    messages.extend(history.iter().map(Message::to_model_message));

    let mut last = ModelMessage::user(prompt);
    if let Some(image) = image {
        last = last.with_image(image);
    }
    messages.push(last);

    ModelRequest { messages }
}

#[cfg(test)]
mod tests {
    use palaver_model::{ModelPart, ModelRole};

    use super::*;

    #[test]
    fn test_turn_order() {
        let config = OrchestratorConfig {
            persona: "Be a guide.".to_owned(),
            acknowledgement: "Understood.".to_owned(),
            ..Default::default()
        };
        let history = [
            Message::assistant("Greetings!".to_owned()),
            Message::user("Tell me a proverb.".to_owned(), None),
            Message::assistant("Wisdom is like a baobab.".to_owned()),
        ];
        let image = ImageAttachment::new(mime::IMAGE_PNG, &b"png"[..]);

        let req = build_request(
            &config,
            &history,
            "What is this?".to_owned(),
            Some(image.clone()),
        );
        assert_eq!(
            req.messages,
            vec![
                ModelMessage::user("Be a guide."),
                ModelMessage::assistant("Understood."),
                ModelMessage::assistant("Greetings!"),
                ModelMessage::user("Tell me a proverb."),
                ModelMessage::assistant("Wisdom is like a baobab."),
                ModelMessage::user("What is this?").with_image(image),
            ]
        );
    }

    #[test]
    fn test_without_history() {
        let config = OrchestratorConfig::default();
        let req = build_request(&config, &[], "Hi".to_owned(), None);
        assert_eq!(req.messages.len(), 3);
        let last = req.messages.last().unwrap();
        assert_eq!(last.role, ModelRole::User);
        assert_eq!(last.parts, vec![ModelPart::Text("Hi".to_owned())]);
    }
}
