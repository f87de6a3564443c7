use serde::{Deserialize, Deserializer, Serialize};

use crate::base::prompts::GREETING_MESSAGE;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// The intent the LLM extracted from a customer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Order,
    Reject,
    Greeting,
    Search,
    Error,
    #[default]
    #[serde(other)]
    Unclear,
}

/// A product the customer asked for, as the LLM understood it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default = "default_qty")]
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_qty() -> u32 {
    1
}

/// Structured result of analyzing one customer message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub intent: Intent,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<RequestedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// Models sometimes send `null` where a field is expected.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Analysis {
    /// An `error` analysis carrying a customer-facing fallback message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            intent: Intent::Error,
            items: Vec::new(),
            search_term: None,
            message: message.into(),
        }
    }

    /// Fill in whatever the model left out.
    pub fn normalize(mut self) -> Self {
        if self.message.is_empty() && self.intent == Intent::Greeting {
            self.message = GREETING_MESSAGE.to_string();
        }

        if self.intent == Intent::Search && self.search_term.is_none() {
            self.search_term = Some(String::new());
        }

        self
    }
}

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    /// Unit price in KES.
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    pub fn has_stock(&self, qty: u32) -> bool {
        self.stock >= i64::from(qty)
    }
}

/// A requested item that was found in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedItem {
    pub requested: RequestedItem,
    pub catalog_match: Product,
    pub qty: u32,
}

impl MatchedItem {
    pub fn line_total(&self) -> i64 {
        self.catalog_match.price * i64::from(self.qty)
    }
}

/// How the customer wants to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mpesa,
    Card,
}

/// Largest amount, in KES, a payment command may ask for.
pub const MAX_PAYMENT_AMOUNT: u64 = 100_000_000;

/// An explicit `Pay <amount>` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentCommand {
    /// Amount in KES.
    pub amount: u64,
    pub method: PaymentMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_intent_is_unclear() {
        let analysis: Analysis = serde_json::from_str(r#"{"intent": "warranty", "message": "1 year"}"#).unwrap();

        assert_eq!(analysis.intent, Intent::Unclear);
        assert_eq!(analysis.message, "1 year");
    }

    #[test]
    fn test_requested_item_defaults_to_one() {
        let item: RequestedItem = serde_json::from_str(r#"{"sku": "VP-32-SMART"}"#).unwrap();

        assert_eq!(item.qty, 1);
        assert_eq!(item.name, None);
    }

    #[test]
    fn test_greeting_without_message_gets_welcome() {
        let analysis: Analysis = serde_json::from_str(r#"{"intent": "greeting"}"#).unwrap();
        let analysis = analysis.normalize();

        assert_eq!(analysis.message, GREETING_MESSAGE);
        assert!(analysis.items.is_empty());
    }

    #[test]
    fn test_null_message_is_empty() {
        let analysis: Analysis = serde_json::from_str(r#"{"intent": "search", "search_term": "TV", "items": [], "message": null}"#).unwrap();

        assert_eq!(analysis.message, "");
        assert_eq!(analysis.search_term.as_deref(), Some("TV"));
    }

    #[test]
    fn test_search_without_term_gets_empty_term() {
        let analysis: Analysis = serde_json::from_str(r#"{"intent": "search", "items": []}"#).unwrap();

        assert_eq!(analysis.normalize().search_term.as_deref(), Some(""));
    }

    #[test]
    fn test_error_analysis_serializes_lowercase() {
        let value = serde_json::to_value(Analysis::error("System busy. Please try again.")).unwrap();

        assert_eq!(value["intent"], "error");
        assert_eq!(value["items"], serde_json::json!([]));
        assert!(value.get("search_term").is_none());
    }
}
