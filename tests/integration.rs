#![cfg(test)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use mockall::mock;
use phil_elect::{
    base::{
        config::{Config, ConfigInner},
        prompts::GREETING_MESSAGE,
        types::{Analysis, Intent, RequestedItem, Res, Void},
    },
    runtime::Runtime,
    server::build_router,
    service::{
        catalog::CatalogClient,
        chat::{ChatClient, GenericChatClient},
        llm::{GenericLlmClient, LlmClient},
        payment::{GenericPaymentClient, PaymentClient, PaymentError},
    },
};
use serde_json::{Value, json};
use tower::ServiceExt;

// Mocks.

mock! {
    pub Llm {}

    #[async_trait]
    impl GenericLlmClient for Llm {
        async fn analyze_message(&self, text: &str) -> Res<Analysis>;
    }
}

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        async fn send_message(&self, phone_number: &str, text: &str) -> Void;
    }
}

mock! {
    pub Payment {}

    #[async_trait]
    impl GenericPaymentClient for Payment {
        async fn trigger_mpesa_payment(&self, phone_number: &str, amount: u64, order_id: &str) -> Res<String>;
        async fn generate_card_link(&self, phone_number: &str, amount: u64, order_id: &str) -> Res<String>;
    }
}

const SENDER: &str = "254712345678";
const VERIFY_TOKEN: &str = "phil-elect-verify";

type Outbox = Arc<Mutex<Vec<(String, String)>>>;

/// A chat mock that records every reply.
fn recording_chat() -> (MockChat, Outbox) {
    let outbox = Outbox::default();
    let sink = outbox.clone();

    let mut chat = MockChat::new();
    chat.expect_send_message().returning(move |to, text| {
        sink.lock().unwrap().push((to.to_string(), text.to_string()));
        Ok(())
    });

    (chat, outbox)
}

fn llm_returning(analysis: Analysis) -> MockLlm {
    let mut llm = MockLlm::new();
    llm.expect_analyze_message().returning(move |_| Ok(analysis.clone()));
    llm
}

fn test_config(verify_token: Option<&str>) -> Config {
    Config {
        inner: Arc::new(ConfigInner {
            whatsapp_verify_token: verify_token.map(str::to_string),
            ..Default::default()
        }),
    }
}

/// Helper function to setup the test environment.
async fn setup(llm: MockLlm, chat: MockChat, payment: MockPayment) -> Router {
    let config = test_config(Some(VERIFY_TOKEN));
    let catalog = CatalogClient::memory().await.expect("Failed to create in-memory catalog");

    let runtime = Runtime {
        config,
        catalog,
        llm: LlmClient::new(Arc::new(llm)),
        chat: ChatClient::new(Arc::new(chat)),
        payment: PaymentClient::new(Arc::new(payment)),
    };

    build_router(runtime)
}

fn text_webhook(body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"display_phone_number": "254700000001", "phone_number_id": "1098765"},
                    "contacts": [{"profile": {"name": "Wanjiru"}, "wa_id": SENDER}],
                    "messages": [{
                        "from": SENDER,
                        "id": "wamid.HBgM",
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": body}
                    }]
                }
            }]
        }]
    })
}

async fn post_webhook(app: Router, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn replies(outbox: &Outbox) -> Vec<(String, String)> {
    outbox.lock().unwrap().clone()
}

// Tests.

#[tokio::test]
async fn test_health_check() {
    let app = setup(MockLlm::new(), MockChat::new(), MockPayment::new()).await;

    let (status, body) = get(app, "/").await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "Bot is running", "service": "WhatsApp Bot API"}));
}

#[tokio::test]
async fn test_verify_echoes_challenge() {
    let app = setup(MockLlm::new(), MockChat::new(), MockPayment::new()).await;

    let uri = format!("/api/webhook?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=1158201444");
    let (status, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1158201444");
}

#[tokio::test]
async fn test_verify_rejects_wrong_token() {
    let app = setup(MockLlm::new(), MockChat::new(), MockPayment::new()).await;

    let (status, body) = get(app, "/api/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Verification failed"));
}

#[tokio::test]
async fn test_verify_rejects_wrong_mode() {
    let app = setup(MockLlm::new(), MockChat::new(), MockPayment::new()).await;

    let uri = format!("/api/webhook?hub.mode=unsubscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=1");
    let (status, _) = get(app, &uri).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_verify_without_configured_token() {
    let runtime = Runtime {
        config: test_config(None),
        catalog: CatalogClient::memory().await.unwrap(),
        llm: LlmClient::new(Arc::new(MockLlm::new())),
        chat: ChatClient::new(Arc::new(MockChat::new())),
        payment: PaymentClient::new(Arc::new(MockPayment::new())),
    };

    let (status, body) = get(build_router(runtime), "/api/webhook?hub.mode=subscribe&hub.verify_token=x&hub.challenge=1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Verify token not configured"));
}

#[tokio::test]
async fn test_greeting_replies_with_welcome() {
    let (chat, outbox) = recording_chat();
    let llm = llm_returning(Analysis {
        intent: Intent::Greeting,
        items: vec![],
        search_term: None,
        message: GREETING_MESSAGE.to_string(),
    });

    let app = setup(llm, chat, MockPayment::new()).await;
    let (status, body) = post_webhook(app, text_webhook("Hi")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");
    assert_eq!(body["sender"], SENDER);
    assert_eq!(body["analysis"]["intent"], "greeting");
    assert_eq!(body["matched_items_count"], 0);
    assert_eq!(body["partial_matches_count"], 0);

    let sent = replies(&outbox);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, SENDER);
    assert_eq!(sent[0].1, GREETING_MESSAGE);
}

#[tokio::test]
async fn test_order_counts_matched_and_missing_items() {
    let (chat, outbox) = recording_chat();
    let llm = llm_returning(Analysis {
        intent: Intent::Order,
        items: vec![
            RequestedItem {
                sku: Some("VP-32-SMART".to_string()),
                qty: 1,
                name: None,
            },
            RequestedItem {
                sku: None,
                qty: 2,
                name: Some("Unicorn Blender".to_string()),
            },
        ],
        search_term: None,
        message: "Vision Plus TV and a blender".to_string(),
    });

    let app = setup(llm, chat, MockPayment::new()).await;
    let (status, body) = post_webhook(app, text_webhook("I want the Vision Plus TV and 2 unicorn blenders")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["intent"], "order");
    assert_eq!(body["matched_items_count"], 1);
    assert_eq!(body["partial_matches_count"], 1);

    let sent = replies(&outbox);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Total: KES 14,000"));
    assert!(sent[0].1.contains("Not found: Unicorn Blender"));
    assert!(sent[0].1.contains("Reply 'Pay 14000'"));
}

#[tokio::test]
async fn test_order_matches_by_name() {
    let (chat, outbox) = recording_chat();
    let llm = llm_returning(Analysis {
        intent: Intent::Order,
        items: vec![RequestedItem {
            sku: None,
            qty: 1,
            name: Some("microwave".to_string()),
        }],
        search_term: None,
        message: String::new(),
    });

    let app = setup(llm, chat, MockPayment::new()).await;
    let (status, body) = post_webhook(app, text_webhook("Nataka microwave")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched_items_count"], 1);
    assert_eq!(body["partial_matches_count"], 0);
    assert!(replies(&outbox)[0].1.contains("Mika Microwave (20L)"));
}

#[tokio::test]
async fn test_search_lists_products() {
    let (chat, outbox) = recording_chat();
    let llm = llm_returning(Analysis {
        intent: Intent::Search,
        items: vec![],
        search_term: Some("TV".to_string()),
        message: String::new(),
    });

    let app = setup(llm, chat, MockPayment::new()).await;
    let (status, body) = post_webhook(app, text_webhook("Show me TVs")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["intent"], "search");
    assert_eq!(body["analysis"]["search_term"], "TV");

    let sent = replies(&outbox);
    assert!(sent[0].1.contains("Vision Plus 32\" Smart TV - KES 14,000"));
    assert!(!sent[0].1.contains("Fridge"));
}

#[tokio::test]
async fn test_analysis_failure_becomes_error_intent() {
    let (chat, outbox) = recording_chat();
    let mut llm = MockLlm::new();
    llm.expect_analyze_message().returning(|_| Err(anyhow::anyhow!("connection reset")));

    let app = setup(llm, chat, MockPayment::new()).await;
    let (status, body) = post_webhook(app, text_webhook("Hello?")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["intent"], "error");
    assert_eq!(body["analysis"]["message"], "System busy. Please try again.");
    assert_eq!(replies(&outbox)[0].1, "System busy. Please try again.");
}

#[tokio::test]
async fn test_pay_command_starts_mpesa_payment() {
    let (chat, outbox) = recording_chat();

    let mut llm = MockLlm::new();
    llm.expect_analyze_message().never();

    let mut payment = MockPayment::new();
    payment
        .expect_trigger_mpesa_payment()
        .withf(|phone, amount, _| phone == SENDER && *amount == 14000)
        .times(1)
        .returning(|_, _, _| Ok("ORD-1a2b3c4d".to_string()));

    let app = setup(llm, chat, payment).await;
    let (status, body) = post_webhook(app, text_webhook("Pay 14,000")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment"]["amount"], 14000);
    assert_eq!(body["payment"]["method"], "mpesa");
    assert_eq!(body["payment"]["reference"], "ORD-1a2b3c4d");
    assert!(body.get("analysis").is_none());
    assert!(replies(&outbox)[0].1.contains("KES 14,000"));
}

#[tokio::test]
async fn test_pay_command_by_card_returns_link() {
    let (chat, outbox) = recording_chat();

    let mut payment = MockPayment::new();
    payment
        .expect_generate_card_link()
        .withf(|phone, amount, _| phone == SENDER && *amount == 3500)
        .times(1)
        .returning(|_, _, _| Ok("https://checkout.paystack.com/abc123".to_string()));

    let app = setup(MockLlm::new(), chat, payment).await;
    let (status, body) = post_webhook(app, text_webhook("pay 3500 by card")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment"]["method"], "card");
    assert_eq!(body["payment"]["checkout_url"], "https://checkout.paystack.com/abc123");
    assert!(replies(&outbox)[0].1.contains("https://checkout.paystack.com/abc123"));
}

#[tokio::test]
async fn test_pay_command_failure_is_reported() {
    let (chat, outbox) = recording_chat();

    let mut payment = MockPayment::new();
    payment
        .expect_trigger_mpesa_payment()
        .returning(|_, _, _| Err(PaymentError::Failed("Insufficient balance".to_string()).into()));

    let app = setup(MockLlm::new(), chat, payment).await;
    let (status, body) = post_webhook(app, text_webhook("Pay 500")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["payment"]["error"].is_string());
    assert!(replies(&outbox)[0].1.contains("Insufficient balance"));
}

#[tokio::test]
async fn test_oversized_pay_amount_is_not_a_payment() {
    let (chat, outbox) = recording_chat();
    let llm = llm_returning(Analysis {
        intent: Intent::Unclear,
        items: vec![],
        search_term: None,
        message: String::new(),
    });

    let mut payment = MockPayment::new();
    payment.expect_trigger_mpesa_payment().never();
    payment.expect_generate_card_link().never();

    let app = setup(llm, chat, payment).await;
    let (status, body) = post_webhook(app, text_webhook("Pay 999999999999999999")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("payment").is_none());
    assert_eq!(body["analysis"]["intent"], "unclear");
    assert_eq!(replies(&outbox).len(), 1);
}

#[tokio::test]
async fn test_catalog_outage_is_acknowledged() {
    let (chat, outbox) = recording_chat();
    let llm = llm_returning(Analysis {
        intent: Intent::Order,
        items: vec![RequestedItem {
            sku: Some("RMT-2DR-SLV".to_string()),
            qty: 1,
            name: None,
        }],
        search_term: None,
        message: String::new(),
    });

    let config = test_config(Some(VERIFY_TOKEN));
    let runtime = Runtime {
        catalog: CatalogClient::supabase(&config).unwrap(),
        config,
        llm: LlmClient::new(Arc::new(llm)),
        chat: ChatClient::new(Arc::new(chat)),
        payment: PaymentClient::new(Arc::new(MockPayment::new())),
    };

    let (status, body) = post_webhook(build_router(runtime), text_webhook("One fridge")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");
    assert_eq!(body["sender"], SENDER);
    assert_eq!(body["error"], "System maintenance: Database not configured");
    assert!(body.get("analysis").is_none());
    assert_eq!(replies(&outbox)[0].1, "System maintenance: Database not configured");
}

#[tokio::test]
async fn test_webhook_without_text_messages() {
    let payload = json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "statuses": [{"id": "wamid.HBgM", "status": "delivered", "recipient_id": SENDER}]
                }
            }]
        }]
    });

    let mut chat = MockChat::new();
    chat.expect_send_message().never();

    let app = setup(MockLlm::new(), chat, MockPayment::new()).await;
    let (status, body) = post_webhook(app, payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "received", "message": "No text messages found"}));
}

#[tokio::test]
async fn test_malformed_webhook_is_rejected() {
    let app = setup(MockLlm::new(), MockChat::new(), MockPayment::new()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"object": "whatsapp_business_account"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}
