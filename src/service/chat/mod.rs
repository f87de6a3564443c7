//! Chat service integration for phil-elect.
//!
//! Outbound messages to customers go through the `GenericChatClient` trait,
//! with a default implementation for the WhatsApp Cloud API.

pub mod whatsapp;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Void;

// Traits.

/// Generic "chat" trait that clients must implement.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Send a text message to a customer.
    ///
    /// `phone_number` may be local (`0712…`), international (`254712…`) or
    /// prefixed with `+`.
    async fn send_message(&self, phone_number: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}

/// Normalize a Kenyan phone number to international format without `+`.
///
/// A leading `0` becomes `254`; any other number without the `254` country
/// code gets it prepended.
pub fn normalize_msisdn(phone_number: &str) -> String {
    let phone = phone_number.trim();
    let phone = phone.strip_prefix('+').unwrap_or(phone);

    if phone.starts_with("254") {
        phone.to_string()
    } else if let Some(local) = phone.strip_prefix('0') {
        format!("254{local}")
    } else {
        format!("254{phone}")
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_msisdn() {
        assert_eq!(normalize_msisdn("254712345678"), "254712345678");
        assert_eq!(normalize_msisdn("+254712345678"), "254712345678");
        assert_eq!(normalize_msisdn(" 0712345678 "), "254712345678");
        assert_eq!(normalize_msisdn("712345678"), "254712345678");
    }
}
