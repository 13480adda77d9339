//! Parsing of chat completion replies.
//!
//! The model is asked to answer in JSON, but in practice the JSON arrives
//! wrapped in a Markdown code fence, or with a sentence of preamble, or both.
//! [`extract_json_object`] digs the object out before it is deserialized.

use crate::Identification;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Keys accepted for each field, canonical first. Models don't always stick to
/// the requested names, and sometimes add the alternatives alongside them.
const CARD_NAME_KEYS: [&str; 3] = ["card_name", "cardName", "name"];
const TCG_NAME_KEYS: [&str; 4] = ["tcg_name", "tcgName", "tcg", "game"];

/// Parses a full chat completion response body into an [`Identification`].
pub fn parse_response(body: &str) -> Result<Identification> {
    let response: ChatResponse = serde_json::from_str(body).or_raise(|| ErrorKind::MalformedReply)?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_raise(|| ErrorKind::MalformedReply)?;
    parse_content(&content)
}

/// Parses the assistant's message text into an [`Identification`].
///
/// Unrelated keys are ignored. When a field appears under several names the
/// canonical `card_name`/`tcg_name` wins, unless it is blank.
pub fn parse_content(content: &str) -> Result<Identification> {
    let json = extract_json_object(content).ok_or_raise(|| ErrorKind::MalformedReply)?;
    let reply: Map<String, Value> = serde_json::from_str(json).or_raise(|| ErrorKind::MalformedReply)?;
    Ok(Identification {
        card_name: required(&reply, "card_name", &CARD_NAME_KEYS)?,
        tcg_name: required(&reply, "tcg_name", &TCG_NAME_KEYS)?,
    })
}

fn required(reply: &Map<String, Value>, field: &'static str, keys: &[&str]) -> Result<String> {
    keys.iter()
        .filter_map(|key| reply.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_raise(|| ErrorKind::MissingField(field))
}

/// Finds the JSON object in a reply that may contain Markdown or other text.
///
/// Tried in order:
/// - a ```` ```json ```` fenced block,
/// - any other fenced block (the info string line is skipped),
/// - the span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            return Some(body[..end].trim());
        }
    }
    if let Some(start) = text.find("```") {
        let fenced = &text[start + 3..];
        let body = fenced.find('\n').map_or(fenced, |newline| &fenced[newline + 1..]);
        if let Some(end) = body.find("```") {
            let block = body[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
