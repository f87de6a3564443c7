//! Paystack implementation: M-Pesa STK Push via direct charge, and card checkout links.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{MAX_PAYMENT_AMOUNT, Res},
    },
    service::chat::normalize_msisdn,
};

use super::{GenericPaymentClient, PaymentClient, PaymentError, order_reference};

const CHARGE_TIMEOUT: Duration = Duration::from_secs(20);
const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(15);

/// Phone numbers Paystack accepts for M-Pesa in test mode.
pub const PAYSTACK_TEST_PHONES: [&str; 4] = ["+254710000000", "+254700000000", "+254711111111", "+254722222222"];

// Extra methods on `PaymentClient` applied by the paystack implementation.

impl PaymentClient {
    /// Creates a new Paystack payment client.
    pub fn paystack(config: &Config) -> Res<Self> {
        let client = PaystackPaymentClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

/// Paystack client implementation.
#[derive(Clone)]
pub struct PaystackPaymentClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

impl PaystackPaymentClient {
    #[instrument(name = "PaystackPaymentClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let client = Self {
            http: reqwest::Client::new(),
            base_url: config.paystack_base_url.trim_end_matches('/').to_string(),
            secret_key: config.paystack_secret_key.clone().filter(|key| !key.is_empty()),
        };

        if client.secret_key.is_none() {
            error!("PAYSTACK_SECRET_KEY is not set; payment commands will fail.");
        } else if client.is_test_mode() {
            warn!("RUNNING IN PAYSTACK TEST MODE - No real money will be deducted.");

            if config.is_production() {
                warn!("MPESA_ENVIRONMENT is `production` but the Paystack key is a test key.");
            }
        }

        Ok(client)
    }

    fn is_test_mode(&self) -> bool {
        self.secret_key.as_deref().is_some_and(|key| key.starts_with("sk_test_"))
    }

    fn secret_key(&self) -> Result<&str, PaymentError> {
        self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)
    }
}

/// Resolve the phone number to charge, as `254…` digits.
///
/// In test mode, numbers outside [`PAYSTACK_TEST_PHONES`] are swapped for the first test number.
pub fn charge_msisdn(phone_number: &str, test_mode: bool) -> String {
    let msisdn = normalize_msisdn(phone_number);

    if test_mode && !PAYSTACK_TEST_PHONES.iter().any(|test| test[1..] == msisdn) {
        let test_phone = &PAYSTACK_TEST_PHONES[0][1..];
        info!("Test Mode: Using test phone +{test_phone} instead of +{msisdn}");
        return test_phone.to_string();
    }

    msisdn
}

/// Convert a KES amount to the cents Paystack expects.
fn to_cents(amount: u64) -> Result<u64, PaymentError> {
    if amount == 0 || amount > MAX_PAYMENT_AMOUNT {
        return Err(PaymentError::InvalidAmount(amount));
    }

    amount.checked_mul(100).ok_or(PaymentError::InvalidAmount(amount))
}

/// Build the `/charge` payload for an M-Pesa STK Push.
pub fn build_charge_payload(msisdn: &str, amount: u64, reference: &str) -> Result<Value, PaymentError> {
    Ok(json!({
        "amount": to_cents(amount)?,
        "email": format!("{msisdn}@philelect.bot"),
        "currency": "KES",
        "mobile_money": {
            "phone": format!("+{msisdn}"),
            "provider": "mpesa"
        },
        "reference": reference
    }))
}

/// Build the `/transaction/initialize` payload for a card checkout link.
pub fn build_initialize_payload(msisdn: &str, amount: u64, reference: &str) -> Result<Value, PaymentError> {
    Ok(json!({
        "amount": to_cents(amount)?,
        "email": format!("{msisdn}@philelect.bot"),
        "currency": "KES",
        "reference": reference,
        "channels": ["card", "mobile_money"]
    }))
}

/// Pick the most specific error message: `data.message` wins over the top-level `message`.
fn extract_error_message(data: &Value, default: &str) -> String {
    data.get("data")
        .and_then(|d| d.get("message"))
        .and_then(Value::as_str)
        .or_else(|| data.get("message").and_then(Value::as_str))
        .unwrap_or(default)
        .to_string()
}

/// Interpret a `/charge` reply, returning the transaction reference.
pub fn interpret_charge_response(status: u16, body: &str, test_mode: bool) -> Result<String, PaymentError> {
    let data: Value = serde_json::from_str(body).map_err(|_| {
        error!("Paystack response is not valid JSON: {body}");
        PaymentError::InvalidResponse(format!("HTTP {status}"))
    })?;

    if status != 200 && status != 201 {
        let message = extract_error_message(&data, "Unknown error");
        error!("Paystack STK Push failed (HTTP {status}): {message}");
        return Err(PaymentError::Api(message));
    }

    if !data.get("status").and_then(Value::as_bool).unwrap_or(false) {
        let message = extract_error_message(&data, "Paystack request failed");
        error!("Paystack STK Push failed: {message}");
        return Err(PaymentError::Api(message));
    }

    let transaction = data.get("data").cloned().unwrap_or(Value::Null);

    if transaction.get("status").and_then(Value::as_str) == Some("failed") {
        let mut message = transaction.get("message").and_then(Value::as_str).unwrap_or("Transaction failed").to_string();
        error!("Paystack transaction failed: {message}");

        if test_mode && message.to_lowercase().contains("test") {
            message.push_str(&format!(" Test mode requires test phone numbers: {}", PAYSTACK_TEST_PHONES.join(", ")));
        }

        return Err(PaymentError::Failed(message));
    }

    transaction
        .get("reference")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PaymentError::InvalidResponse("missing reference".to_string()))
}

/// Interpret a `/transaction/initialize` reply, returning the checkout URL.
pub fn interpret_initialize_response(status: u16, body: &str) -> Result<String, PaymentError> {
    let data: Value = serde_json::from_str(body).map_err(|_| PaymentError::InvalidResponse(format!("HTTP {status}")))?;

    if !(200..300).contains(&status) {
        let message = extract_error_message(&data, "Unknown error");
        error!("Paystack link generation failed (HTTP {status}): {message}");
        return Err(PaymentError::Api(message));
    }

    if !data.get("status").and_then(Value::as_bool).unwrap_or(false) {
        let message = data.get("message").and_then(Value::as_str).unwrap_or("Paystack request failed").to_string();
        error!("Paystack link generation failed: {message}");
        return Err(PaymentError::Api(message));
    }

    data.get("data")
        .and_then(|d| d.get("authorization_url"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PaymentError::InvalidResponse("missing authorization_url".to_string()))
}

#[async_trait]
impl GenericPaymentClient for PaystackPaymentClient {
    #[instrument(skip(self))]
    async fn trigger_mpesa_payment(&self, phone_number: &str, amount: u64, order_id: &str) -> Res<String> {
        let secret_key = self.secret_key()?;
        let test_mode = self.is_test_mode();

        let msisdn = charge_msisdn(phone_number, test_mode);
        let payload = build_charge_payload(&msisdn, amount, &order_reference(order_id))?;

        info!("Initiating Paystack STK Push to +{msisdn} (original: {phone_number}) for KES {amount}");
        debug!("Full Paystack payload: {payload}");

        let response = self
            .http
            .post(format!("{}/charge", self.base_url))
            .bearer_auth(secret_key)
            .timeout(CHARGE_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(PaymentError::from)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(PaymentError::from)?;

        info!("Paystack Response: {status} - {body}");

        let reference = interpret_charge_response(status, &body, test_mode)?;

        info!("Paystack STK Push initiated successfully. Reference: {reference}");

        Ok(reference)
    }

    #[instrument(skip(self))]
    async fn generate_card_link(&self, phone_number: &str, amount: u64, order_id: &str) -> Res<String> {
        let secret_key = self.secret_key()?;

        let msisdn = normalize_msisdn(phone_number);
        let reference = format!("{}-CARD", order_reference(order_id));
        let payload = build_initialize_payload(&msisdn, amount, &reference)?;

        info!("Generating Paystack Link for {msisdn}, Amount: {amount} KES, Order: {order_id}");

        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(secret_key)
            .timeout(INITIALIZE_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(PaymentError::from)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(PaymentError::from)?;

        info!("Paystack Response: {status} - {body}");

        let url = interpret_initialize_response(status, &body)?;

        info!("Paystack card checkout link generated successfully. URL: {url}");

        Ok(url)
    }
}

// Tests.
