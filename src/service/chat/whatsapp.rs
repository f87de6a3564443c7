//! WhatsApp Cloud API client.

use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{ChatClient, GenericChatClient, normalize_msisdn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Extra methods on `ChatClient` applied by the whatsapp implementation.

impl ChatClient {
    /// Creates a new WhatsApp chat client.
    pub fn whatsapp(config: &Config) -> Res<Self> {
        let client = WhatsAppChatClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// Sender credentials for the Cloud API.
#[derive(Clone)]
struct Sender {
    api_token: String,
    phone_number_id: String,
}

/// WhatsApp client implementation.
#[derive(Clone)]
pub struct WhatsAppChatClient {
    http: reqwest::Client,
    base_url: String,
    sender: Option<Sender>,
}

/// Error envelope returned by the Graph API.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<Value>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl WhatsAppChatClient {
    #[instrument(name = "WhatsAppChatClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let sender = match (config.whatsapp_api_token.as_deref(), config.whatsapp_phone_number_id.as_deref()) {
            (Some(api_token), Some(phone_number_id)) if !api_token.is_empty() && !phone_number_id.is_empty() => Some(Sender {
                api_token: api_token.to_string(),
                phone_number_id: phone_number_id.to_string(),
            }),
            _ => {
                error!("WhatsApp API credentials not configured (WHATSAPP_API_TOKEN or WHATSAPP_PHONE_NUMBER_ID)");
                None
            }
        };

        Ok(Self {
            http,
            base_url: config.whatsapp_api_base_url.trim_end_matches('/').to_string(),
            sender,
        })
    }
}

/// Build the Cloud API payload for a plain text message.
pub fn build_text_payload(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": {
            "preview_url": false,
            "body": body
        }
    })
}

/// Describe a non-200 Graph API reply.
fn describe_graph_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GraphErrorEnvelope>(body) {
        Ok(GraphErrorEnvelope { error }) => {
            let code = error.code.map(|c| c.to_string()).unwrap_or_else(|| "Unknown".to_string());
            format!(
                "WhatsApp API error {status}: {} ({code}) - {}",
                error.kind.as_deref().unwrap_or("Unknown"),
                error.message.as_deref().unwrap_or("Unknown error")
            )
        }
        Err(_) => format!("WhatsApp API error {status}: {body}"),
    }
}

#[async_trait]
impl GenericChatClient for WhatsAppChatClient {
    #[instrument(skip(self, text))]
    async fn send_message(&self, phone_number: &str, text: &str) -> Void {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("WhatsApp API credentials not configured (WHATSAPP_API_TOKEN or WHATSAPP_PHONE_NUMBER_ID)"))?;

        let url = format!("{}/{}/messages", self.base_url, sender.phone_number_id);
        let to = normalize_msisdn(phone_number);
        let payload = build_text_payload(&to, text);

        debug!("WhatsApp API request: {url}");
        debug!("WhatsApp API payload: {payload}");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&sender.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send WhatsApp message (network error): {e}"))?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            let description = describe_graph_error(status, &body);
            error!("{description}");
            return Err(anyhow!(description));
        }

        let result: Value = serde_json::from_str(&body)?;
        let message_id = result.get("messages").and_then(|m| m.get(0)).map(|m| m.get("id").and_then(Value::as_str).unwrap_or("unknown"));

        match message_id {
            Some(message_id) => {
                info!("WhatsApp message sent successfully to {to} (Message ID: {message_id})");
                Ok(())
            }
            None => Err(anyhow!("WhatsApp API unexpected response: {result}")),
        }
    }
}

// Tests.
