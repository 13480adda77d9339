//! [`Recognizer`] backed by an OpenAI-compatible chat completion endpoint.

use crate::error::{ErrorKind, Result};
use crate::reply::parse_response;
use crate::{CardImage, Identification, Recognizer};
use exn::ResultExt;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

pub const SYSTEM_PROMPT: &str = "You are a trading card game expert that responds in JSON.";
pub const USER_PROMPT: &str = "Please identify this card. Return the card name and TCG name as a JSON object \
                               with the keys \"card_name\" and \"tcg_name\".";

/// Connection details for the recognition service.
#[derive(Clone, Debug)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Identifies cards by sending each image, inlined as base64, to a
/// vision-capable chat model.
///
/// One blocking request per image; no retries. Any failure is reported as an
/// error and the caller moves on to the next file.
pub struct OpenAiClient {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build().or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }
}

impl Recognizer for OpenAiClient {
    #[instrument(skip_all, fields(path = %image.path.display(), model = %self.settings.model))]
    fn identify(&self, image: &CardImage) -> Result<Identification> {
        let data_url = image.data_url();
        let request = ChatRequest::new(&self.settings.model, self.settings.max_tokens, &data_url);
        tracing::debug!(bytes = image.bytes.len(), media_type = image.media_type, "Sending recognition request");

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .or_raise(|| ErrorKind::Request)?;
        let status = response.status();
        let body = response.text().or_raise(|| ErrorKind::Request)?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Recognition request failed");
            tracing::debug!(body = %body, "Recognition failure response content");
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        tracing::debug!(body = %body, "Received recognition response");
        parse_response(&body)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, max_tokens: u32, data_url: &'a str) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: Content::Text(SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: Content::Parts(vec![
                        Part::Text { text: USER_PROMPT },
                        Part::ImageUrl {
                            image_url: ImageUrl { url: data_url },
                        },
                    ]),
                },
            ],
            max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Content<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Content<'a> {
    Text(&'static str),
    Parts(Vec<Part<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part<'a> {
    Text { text: &'static str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}
