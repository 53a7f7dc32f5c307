//! Language-model boundary.
//!
//! The pipeline treats generation as a function from prompt to text. Any
//! provider-specific response shape is flattened by [`normalize_content`]
//! inside the adapter, so callers only ever see a `String`.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Answer text used when the model returns no content at all.
pub const NO_RESPONSE: &str = "No response generated";

/// A text generation backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier used in logs.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationFailure`](crate::RagError::GenerationFailure)
    /// when the backend is unreachable or answers with an error.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Flatten a chat `content` value into plain text.
///
/// Accepts a bare string, an array of content parts (strings or objects with
/// a `text` field, concatenated in order), or null. Anything without text
/// yields [`NO_RESPONSE`].
pub fn normalize_content(content: &Value) -> String {
    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Vec<_>>()
            .concat(),
        _ => String::new(),
    };

    if text.is_empty() { NO_RESPONSE.to_string() } else { text }
}
