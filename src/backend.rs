//! HTTP transport to the architecture backend.
//!
//! The two exchanges from the wire contract live here, along with all
//! response-shape normalization: the artifact may arrive as a plain string
//! or a structured JSON value, and every optional field of the chat
//! response is resolved into a concrete `ChatReply` before the state
//! machine ever sees it.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{ChatReply, EMPTY_ARTIFACT};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    current_proposal: &'a [String],
}

#[derive(Deserialize)]
struct RawChatResponse {
    reply: Option<String>,
    json_output: Option<Value>,
    proposal: Option<Vec<String>>,
    is_proposal: Option<bool>,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    strict_replies: bool,
}

impl BackendClient {
    pub fn new(base_url: &str, strict_replies: bool) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            strict_replies,
        }
    }

    /// Read-only fetch of the current artifact, normalized to display text.
    pub async fn fetch_artifact(&self) -> Result<String> {
        let url = format!("{}/api/architecture", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "artifact request failed with status: {}",
                response.status()
            ));
        }

        let value: Value = response.json().await?;
        Ok(render_artifact(&value))
    }

    /// Submit one chat turn. The full current ledger rides along so the
    /// backend stays stateless with respect to proposal tracking.
    pub async fn send_turn(&self, message: &str, current_proposal: &[String]) -> Result<ChatReply> {
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest { message, current_proposal };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let raw: RawChatResponse = response.json().await?;
        normalize(raw, self.strict_replies)
    }
}

/// Resolve a raw response into a `ChatReply`.
///
/// A missing `reply` field is ambiguous in the contract; the policy knob
/// decides between treating it as a transport failure (strict) and
/// rendering an empty turn (lenient).
fn normalize(raw: RawChatResponse, strict_replies: bool) -> Result<ChatReply> {
    let reply = match raw.reply {
        Some(reply) => reply,
        None if strict_replies => return Err(anyhow!("backend response missing reply field")),
        None => String::new(),
    };

    let artifact = raw
        .json_output
        .map(|value| render_artifact(&value))
        .filter(|text| !is_trivial_artifact(text));

    Ok(ChatReply {
        reply,
        artifact,
        proposal: raw.proposal.unwrap_or_default(),
        is_proposal: raw.is_proposal.unwrap_or(false),
    })
}

/// Render an artifact value to display text. Plain strings pass through;
/// structured values are pretty-printed. Key order is whatever the backend
/// sent; only the formatting is deterministic.
fn render_artifact(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

/// The empty-document sentinel must not overwrite a rendered artifact.
fn is_trivial_artifact(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == EMPTY_ARTIFACT
}
