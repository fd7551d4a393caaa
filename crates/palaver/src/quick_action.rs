/// A canned request: `label` is what the conversation records, `prompt`
/// is what the provider receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QuickAction {
    /// Short command name, like `insight`.
    pub name: &'static str,
    /// The text shown as the user message.
    pub label: &'static str,
    /// The instruction actually sent.
    pub prompt: &'static str,
}

/// The quick actions offered next to the input box.
pub const QUICK_ACTIONS: [QuickAction; 4] = [
    QuickAction {
        name: "insight",
        label: "Share a cultural insight",
        prompt: "Share one fascinating insight about a specific African \
            culture, tradition or historical fact. Name the people or \
            region it comes from and explain why it matters to them.",
    },
    QuickAction {
        name: "proverb",
        label: "Teach me a proverb",
        prompt: "Share a traditional African proverb. Give its origin, the \
            original wording if you know it, its literal meaning and the \
            wisdom it carries.",
    },
    QuickAction {
        name: "recipe",
        label: "Suggest a traditional dish",
        prompt: "Suggest a traditional African dish. Say where it is eaten \
            and on what occasions, then list its main ingredients and \
            outline how it is prepared.",
    },
    QuickAction {
        name: "name",
        label: "Explain an African name",
        prompt: "Pick a traditional African name and explain its meaning, \
            the language and people it comes from, and the customs \
            around giving it.",
    },
];

impl QuickAction {
    /// Looks a quick action up by its name, ignoring case.
    pub fn find(name: &str) -> Option<&'static QuickAction> {
        QUICK_ACTIONS
            .iter()
            .find(|action| action.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(QuickAction::find("Proverb").unwrap().name, "proverb");
        assert!(QuickAction::find("weather").is_none());
    }
}
