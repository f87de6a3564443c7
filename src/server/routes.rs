//! Route handlers for the webhook API.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::{
    interaction::chat_event::{self, EventOutcome},
    runtime::Runtime,
    server::{error::AppError, payload::WhatsAppWebhook},
};

/// Query parameters Meta sends when verifying the webhook.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET / -- liveness probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "Bot is running",
        "service": "WhatsApp Bot API",
    }))
}

/// GET /api/webhook -- echo the challenge back when the verify token matches.
#[instrument(skip_all)]
pub async fn verify_webhook(State(runtime): State<Runtime>, Query(params): Query<VerifyParams>) -> Result<Response, AppError> {
    let Some(expected) = runtime.config.whatsapp_verify_token.as_deref().filter(|token| !token.is_empty()) else {
        warn!("Webhook verification attempted without a configured verify token");
        return Err(AppError::internal("Verify token not configured"));
    };

    match (params.mode.as_deref(), params.verify_token.as_deref()) {
        (Some("subscribe"), Some(token)) if token == expected => {
            info!("Webhook verified");
            Ok(params.challenge.unwrap_or_default().into_response())
        }
        _ => {
            warn!("Webhook verification failed");
            Err(AppError::forbidden("Verification failed"))
        }
    }
}

/// POST /api/webhook -- handle the first text message in a delivery.
#[instrument(skip_all)]
pub async fn handle_webhook(State(runtime): State<Runtime>, Json(webhook): Json<WhatsAppWebhook>) -> Result<Json<Value>, AppError> {
    let Some((sender, body)) = webhook.first_text_message() else {
        info!("Webhook received without text messages");
        return Ok(Json(json!({
            "status": "received",
            "message": "No text messages found",
        })));
    };

    let response = match chat_event::handle_text_message(&runtime, sender, body).await? {
        EventOutcome::Analyzed { analysis, order } => json!({
            "status": "received",
            "sender": sender,
            "analysis": analysis,
            "matched_items_count": order.matched.len(),
            "partial_matches_count": order.partial.len(),
        }),
        EventOutcome::Payment(payment) => json!({
            "status": "received",
            "sender": sender,
            "payment": payment,
        }),
        EventOutcome::CatalogUnavailable { message } => json!({
            "status": "received",
            "sender": sender,
            "error": message,
        }),
    };

    Ok(Json(response))
}
