//! Inbound webhook payloads from the WhatsApp Cloud API.

use serde::Deserialize;
use serde_json::Value;

/// Root webhook payload from Meta.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppWebhook {
    pub object: String,
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub id: String,
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    pub value: ChangeValue,
    pub field: String,
}

/// The changed object: messages, status updates, and their metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeValue {
    pub messaging_product: String,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub contacts: Option<Vec<Contact>>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub profile: Option<Value>,
    #[serde(default)]
    pub wa_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<String>,
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextMessage {
    pub body: String,
}

impl WhatsAppWebhook {
    /// The first WhatsApp text message in the delivery, as `(sender, body)`.
    ///
    /// Messages without a sender cannot be answered and are skipped.
    pub fn first_text_message(&self) -> Option<(&str, &str)> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .map(|change| &change.value)
            .filter(|value| value.messaging_product == "whatsapp")
            .flat_map(|value| value.messages.iter().flatten())
            .filter(|message| message.kind == "text")
            .find_map(|message| Some((message.from.as_deref()?, message.text.as_ref()?.body.as_str())))
    }
}

// Tests.
