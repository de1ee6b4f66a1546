use strum::AsRefStr;

/// Outcome of one adapter turn. Every variant is exactly one speakable chunk.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AdapterReply {
    /// No tool session could be created at startup
    NoSession,
    /// No user text in any recognised input field
    NotUnderstood,
    /// Cancelled while the tool agent was working
    QueryCancelled,
    /// A tool answered with an empty result
    ToolNoContent,
    /// Any other tool agent failure
    QueryFailed,
    /// The tool agent returned something other than text
    InternalError,
    /// Cancelled during the speech rewrite
    CleanupCancelled,
    /// The speech rewrite failed
    CleanupFailed,
    Success(String),
}

impl AdapterReply {
    pub const NO_SESSION: &'static str =
        "I'm sorry, I can't reach the messaging service right now. Please try again later.";
    pub const NOT_UNDERSTOOD: &'static str =
        "I'm sorry, I couldn't understand your request. Could you say that again?";
    pub const QUERY_CANCELLED: &'static str = "Processing was cancelled.";
    pub const TOOL_NO_CONTENT: &'static str =
        "I'm sorry, the messaging service didn't return anything for that request.";
    pub const QUERY_FAILED: &'static str =
        "I'm sorry, I ran into a problem while processing your request.";
    pub const INTERNAL_ERROR: &'static str =
        "I'm sorry, something went wrong on my end. Please try again.";
    pub const CLEANUP_CANCELLED: &'static str =
        "The response was cancelled while it was being prepared.";
    pub const CLEANUP_FAILED: &'static str =
        "I'm sorry, there was an error while finalizing the response.";

    /// The chunk the host should speak
    pub fn text(&self) -> &str {
        match self {
            AdapterReply::NoSession => Self::NO_SESSION,
            AdapterReply::NotUnderstood => Self::NOT_UNDERSTOOD,
            AdapterReply::QueryCancelled => Self::QUERY_CANCELLED,
            AdapterReply::ToolNoContent => Self::TOOL_NO_CONTENT,
            AdapterReply::QueryFailed => Self::QUERY_FAILED,
            AdapterReply::InternalError => Self::INTERNAL_ERROR,
            AdapterReply::CleanupCancelled => Self::CLEANUP_CANCELLED,
            AdapterReply::CleanupFailed => Self::CLEANUP_FAILED,
            AdapterReply::Success(text) => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AdapterReply::Success(_))
    }

    pub fn into_text(self) -> String {
        match self {
            AdapterReply::Success(text) => text,
            other => other.text().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_texts_are_distinct() {
        let replies = [
            AdapterReply::NoSession,
            AdapterReply::NotUnderstood,
            AdapterReply::QueryCancelled,
            AdapterReply::ToolNoContent,
            AdapterReply::QueryFailed,
            AdapterReply::InternalError,
            AdapterReply::CleanupCancelled,
            AdapterReply::CleanupFailed,
        ];
        let mut texts: Vec<&str> = replies.iter().map(AdapterReply::text).collect();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), replies.len());
    }

    #[test]
    fn test_success_text() {
        let reply = AdapterReply::Success("Alice said the deploy is done.".to_string());
        assert!(reply.is_success());
        assert_eq!(reply.text(), "Alice said the deploy is done.");
        assert_eq!(reply.as_ref(), "success");
        assert_eq!(AdapterReply::NoSession.into_text(), AdapterReply::NO_SESSION);
    }
}
