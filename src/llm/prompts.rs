// System prompts and conversation templates

pub struct SystemPrompts;

impl SystemPrompts {
    /// Plain voice assistant prompt
    pub fn witty_voice_assistant() -> &'static str {
        "You are a funny, witty assistant. \
Respond with short and concise answers. Avoid using unpronouncable punctuation or emojis."
    }

    /// Instruction for the tool agent that reads the messaging workspace
    pub fn messaging_agent() -> &'static str {
        "You are an assistant with access to a team messaging workspace through tools. \
Use the tools to look up channels, users and messages before answering. \
Never guess message contents. If a lookup fails, say what you tried."
    }

    /// Instruction for turning a raw tool-agent answer into something speakable
    pub fn speech_rewrite() -> &'static str {
        "You turn assistant output into text that will be read aloud by a speech synthesizer.

RULES:
- Reply with one to three short, natural sentences.
- Remove technical identifiers: channel IDs, user IDs, message timestamps, URLs, JSON and markdown.
- Keep who sent each message and the substance of what they said.
- Refer to people and channels by name, never by ID.
- Do not add information that is not in the input.
- Do not mention that you are rewriting anything."
    }

    /// User turn for the rewrite pass
    pub fn speech_rewrite_input(raw: &str) -> String {
        format!("Rewrite this for speech:\n\n{}", raw)
    }
}

pub struct ConversationTemplates;

impl ConversationTemplates {
    /// First thing the assistant says once a participant joins
    pub fn greeting() -> &'static str {
        "Hey there! How can I help you today?"
    }

    pub fn goodbye() -> &'static str {
        "Goodbye! Feel free to call on me anytime you need assistance."
    }

    /// Spoken when a streamed answer breaks off
    pub fn stream_interrupted() -> &'static str {
        "Sorry, I lost my train of thought. Could you ask that again?"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompts() {
        assert!(SystemPrompts::witty_voice_assistant().contains("witty assistant"));
        assert!(SystemPrompts::speech_rewrite().contains("IDs"));
    }

    #[test]
    fn test_rewrite_input_embeds_raw_text() {
        let input = SystemPrompts::speech_rewrite_input("<@U024BE7LH> said hi in C0123");
        assert!(input.starts_with("Rewrite this for speech:"));
        assert!(input.ends_with("<@U024BE7LH> said hi in C0123"));
    }
}
