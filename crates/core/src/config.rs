use std::time::Duration;

use palaver_model::ErrorKind;

use crate::RetryPolicy;

const PERSONA: &str = "\
You are Palaver, a knowledgeable and respectful guide to the cultures of the \
African continent: history, languages, customs and rituals, clothing, food, \
spiritual beliefs, music, dance, visual arts, oral traditions, social and \
political structures, and the diaspora.

When responding:
- Highlight the variety across regions, peoples and nations, and name \
origins where you can instead of generalizing.
- Give informative answers with real depth.
- Keep a celebratory, respectful tone, and treat sensitive history with \
balanced, factual context.
- Stay in character as a specialist in African cultures.
- If you do not know a detail, say so plainly and offer related knowledge.
- Close in a way that invites further questions.";

/// User-visible texts appended in place of an answer when a request
/// fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackMessages {
    /// The provider kept throttling us after every retry.
    pub rate_limited: String,
    /// The provider refused our credentials.
    pub connection_issue: String,
    /// The provider answered with something we could not use.
    pub unexpected_response: String,
    /// The provider could not be reached.
    pub unreachable: String,
    /// No API key is configured.
    pub configuration_missing: String,
}

impl FallbackMessages {
    /// Returns the text for a failure of `kind`.
    pub fn message_for(&self, kind: ErrorKind) -> &str {
        match kind {
            ErrorKind::RateLimited => &self.rate_limited,
            ErrorKind::Unauthorized => &self.connection_issue,
            ErrorKind::MalformedResponse => &self.unexpected_response,
            ErrorKind::NetworkFailure => &self.unreachable,
            ErrorKind::ConfigurationMissing => &self.configuration_missing,
        }
    }
}

impl Default for FallbackMessages {
    fn default() -> Self {
        Self {
            rate_limited: "Many people are talking to me right now and I \
                have been asked to slow down. Please try again in a \
                little while."
                .to_owned(),
            connection_issue: "I'm having a connection issue with my \
                knowledge source. Please try again later."
                .to_owned(),
            unexpected_response: "I received an unusual response and could \
                not make sense of it. Could you rephrase your question?"
                .to_owned(),
            unreachable: "I could not reach my knowledge source. Please \
                check your connection and try again in a moment."
                .to_owned(),
            configuration_missing: "I'm not configured to answer yet: no \
                API key was provided."
                .to_owned(),
        }
    }
}

/// Configuration of an [`Orchestrator`](crate::Orchestrator).
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorConfig {
    /// Instructions describing who the assistant is.
    pub persona: String,
    /// What the assistant says when asked who made it. Empty to omit.
    pub creator_attribution: String,
    /// The assistant turn acknowledging the instructions.
    pub acknowledgement: String,
    /// Greeting seeded for first-time or long-absent users.
    pub introduction_greeting: String,
    /// Greeting seeded for users returning within `returning_window`.
    pub returning_greeting: String,
    /// Instruction sent along with a staged image.
    pub image_analysis_prompt: String,
    /// Text recorded for an image sent without a caption.
    pub default_image_caption: String,
    /// Texts used when a request fails.
    pub fallbacks: FallbackMessages,
    /// How throttled requests are retried.
    pub retry_policy: RetryPolicy,
    /// Quiescence window of the debounced entry points.
    pub debounce_window: Duration,
    /// How recent the last visit must be to count as returning.
    pub returning_window: Duration,
}

impl OrchestratorConfig {
    /// The full instruction block sent as the first turn.
    pub(crate) fn system_instruction(&self) -> String {
        if self.creator_attribution.is_empty() {
            return self.persona.clone();
        }
        format!(
            "{}\n- If asked about your creator, respond with: \"{}\"",
            self.persona, self.creator_attribution
        )
    }

    /// The analysis prompt for an image, with the user's caption if any.
    pub(crate) fn image_prompt(&self, caption: Option<&str>) -> String {
        match caption {
            Some(caption) => {
                format!("{}\n\n{caption}", self.image_analysis_prompt)
            }
            None => self.image_analysis_prompt.clone(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            persona: PERSONA.to_owned(),
            creator_attribution: String::new(),
            acknowledgement: "Understood. I am Palaver, ready to share the \
                wisdom of Africa."
                .to_owned(),
            introduction_greeting: "Greetings! I am Palaver. Ask me about the \
                history, art, music, spirituality or traditions of Africa, \
                or pick one of the quick actions to get started."
                .to_owned(),
            returning_greeting: "Welcome back! What shall we explore today?"
                .to_owned(),
            image_analysis_prompt: "Describe this image and explain any \
                African cultural elements it shows: its likely origin, \
                the people or traditions involved, and their significance."
                .to_owned(),
            default_image_caption: "Tell me about this image.".to_owned(),
            fallbacks: FallbackMessages::default(),
            retry_policy: RetryPolicy::default(),
            debounce_window: Duration::from_millis(300),
            returning_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_are_distinct() {
        let fallbacks = FallbackMessages::default();
        let kinds = [
            ErrorKind::RateLimited,
            ErrorKind::Unauthorized,
            ErrorKind::MalformedResponse,
            ErrorKind::NetworkFailure,
            ErrorKind::ConfigurationMissing,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(fallbacks.message_for(*a), fallbacks.message_for(*b));
            }
        }
    }

    #[test]
    fn test_system_instruction() {
        let mut config = OrchestratorConfig {
            persona: "Be a guide.".to_owned(),
            ..Default::default()
        };
        assert_eq!(config.system_instruction(), "Be a guide.");

        config.creator_attribution = "I was built by the Palaver group.".to_owned();
        assert_eq!(
            config.system_instruction(),
            "Be a guide.\n- If asked about your creator, respond with: \
             \"I was built by the Palaver group.\""
        );
    }

    #[test]
    fn test_image_prompt() {
        let config = OrchestratorConfig {
            image_analysis_prompt: "Describe it.".to_owned(),
            ..Default::default()
        };
        assert_eq!(config.image_prompt(None), "Describe it.");
        assert_eq!(
            config.image_prompt(Some("Is this kente?")),
            "Describe it.\n\nIs this kente?"
        );
    }
}
