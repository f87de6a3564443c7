//! Payment collection.
//!
//! Two ways to pay are supported: an M-Pesa STK Push (the customer gets a PIN
//! prompt on their phone) and a hosted checkout link for card payers.

pub mod paystack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::base::types::Res;

// Errors.

/// Payment failures.  The display text is safe to show to the customer.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("PAYSTACK_SECRET_KEY environment variable is required")]
    NotConfigured,
    #[error("Paystack API error: {0}")]
    Api(String),
    #[error("Payment failed: {0}")]
    Failed(String),
    #[error("Invalid payment amount: KES {0}")]
    InvalidAmount(u64),
    #[error("Invalid response from Paystack: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

// Traits.

/// Generic payment client trait that providers must implement.
#[async_trait]
pub trait GenericPaymentClient: Send + Sync + 'static {
    /// Push an M-Pesa PIN prompt to the customer's phone.
    ///
    /// Returns the provider's transaction reference.
    async fn trigger_mpesa_payment(&self, phone_number: &str, amount: u64, order_id: &str) -> Res<String>;

    /// Create a hosted checkout link for card payments.
    ///
    /// Returns the URL to send to the customer.
    async fn generate_card_link(&self, phone_number: &str, amount: u64, order_id: &str) -> Res<String>;
}

// Structs.

/// Payment client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<dyn GenericPaymentClient>,
}

impl Deref for PaymentClient {
    type Target = dyn GenericPaymentClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl PaymentClient {
    pub fn new(inner: Arc<dyn GenericPaymentClient>) -> Self {
        Self { inner }
    }
}

/// Transaction reference derived from an order ID: `ORD-` and its first eight characters.
pub fn order_reference(order_id: &str) -> String {
    let prefix: String = order_id.chars().take(8).collect();
    format!("ORD-{prefix}")
}

// Tests.
