//! Pulling JSON out of model replies.
//!
//! Models asked for "only JSON" still wrap it in Markdown fences or a
//! sentence of preamble often enough that every reply goes through
//! [`extract_json`] before deserialization.

use serde::de::DeserializeOwned;

use crate::error::BedrockError;

/// Return the first complete top-level JSON object in `text`.
///
/// A fenced block is preferred when present. Braces inside string literals
/// are ignored when matching.
pub fn extract_json(text: &str) -> Result<&str, BedrockError> {
    let body = fenced_block(text).unwrap_or(text);

    let start = body
        .find('{')
        .ok_or_else(|| BedrockError::ResponseParse("no JSON object in response".to_string()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in body[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Ok(&body[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(BedrockError::ResponseParse(
        "unterminated JSON object in response".to_string(),
    ))
}

/// Extract and deserialize in one step.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, BedrockError> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|e| BedrockError::SchemaViolation(e.to_string()))
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string, e.g. ```json
    let content_start = after_fence.find('\n')? + 1;
    let content = &after_fence[content_start..];
    let close = content.find("```")?;
    Some(&content[..close])
}
