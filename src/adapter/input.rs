//! Finding the user's words in whatever shape the host sent them.

use serde_json::Value;

use crate::host::ChatRequest;

/// Named parameters older hosts used for the user's text, in lookup order
pub const USER_TEXT_PARAMS: &[&str] = &["user_input", "text", "message", "query", "prompt"];

type Extractor = fn(&ChatRequest) -> Option<String>;

/// Extraction strategies, tried in this order until one yields text:
///
/// 1. `chat_ctx`: the most recent user turn of the structured context
/// 2. `history`: the final entry of a plain history list
/// 3. each name in [`USER_TEXT_PARAMS`], as a string parameter
///
/// Blank text counts as absent.
pub const USER_TEXT_STRATEGIES: &[(&str, Extractor)] = &[
    ("chat_ctx", from_chat_ctx),
    ("history", from_history),
    ("params", from_params),
];

fn from_chat_ctx(request: &ChatRequest) -> Option<String> {
    request
        .chat_ctx
        .as_ref()
        .and_then(|ctx| ctx.last_user_text())
        .map(str::to_string)
}

fn from_history(request: &ChatRequest) -> Option<String> {
    request
        .history
        .as_ref()
        .and_then(|history| history.last())
        .map(|msg| msg.content.clone())
}

fn from_params(request: &ChatRequest) -> Option<String> {
    USER_TEXT_PARAMS.iter().find_map(|name| {
        match request.params.get(*name) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        }
    })
}

/// Resolve the user's text, returning the name of the strategy that found it
pub fn resolve_user_text(request: &ChatRequest) -> Option<(&'static str, String)> {
    USER_TEXT_STRATEGIES.iter().find_map(|(name, extract)| {
        extract(request)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .map(|text| (*name, text))
    })
}
