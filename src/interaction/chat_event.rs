use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    base::types::{Analysis, Intent, PaymentCommand, PaymentMethod, Res},
    interaction::{
        order::{OrderMatch, match_items},
        payment_command, replies,
    },
    runtime::Runtime,
    service::{
        catalog::{CatalogClient, CatalogError},
        chat::ChatClient,
        payment::PaymentError,
    },
};

/// What happened to one inbound text message.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// The message went through intent extraction.
    Analyzed { analysis: Analysis, order: OrderMatch },
    /// The message was a `Pay <amount>` command.
    Payment(PaymentOutcome),
    /// The catalog could not be read; the customer was sent `message`.
    CatalogUnavailable { message: String },
}

/// Result of a payment command.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub amount: u64,
    pub method: PaymentMethod,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle one text message from a customer and reply to them.
///
/// Payment commands skip the LLM.  Reply delivery failures are logged only.
/// Catalog failures are reported to the customer and end in
/// [`EventOutcome::CatalogUnavailable`], so the delivery is still acknowledged.
#[instrument(skip(runtime, text))]
pub async fn handle_text_message(runtime: &Runtime, sender: &str, text: &str) -> Res<EventOutcome> {
    info!("Raw user message from {sender}: {text}");

    if let Some(command) = payment_command::parse(text) {
        let (outcome, reply) = handle_payment_command(runtime, sender, command).await;
        send_reply(&runtime.chat, sender, &reply).await;

        return Ok(EventOutcome::Payment(outcome));
    }

    let analysis = runtime.llm.analyze_or_fallback(text).await;

    info!("Analysis result: {analysis:?}");

    match respond_to_analysis(&runtime.catalog, &analysis).await {
        Ok((order, reply)) => {
            info!(
                "Order summary: sender={sender}, intent={:?}, matched_items={}, partial_matches={}",
                analysis.intent,
                order.matched.len(),
                order.partial.len()
            );

            send_reply(&runtime.chat, sender, &reply).await;

            Ok(EventOutcome::Analyzed { analysis, order })
        }
        Err(err) => {
            let Some(message) = err.downcast_ref::<CatalogError>().map(ToString::to_string) else {
                return Err(err);
            };

            error!("Catalog unavailable while handling message from {sender}: {err:#}");

            send_reply(&runtime.chat, sender, &message).await;

            Ok(EventOutcome::CatalogUnavailable { message })
        }
    }
}

/// Work out the catalog matches and the reply text for an analysis.
async fn respond_to_analysis(catalog: &CatalogClient, analysis: &Analysis) -> Res<(OrderMatch, String)> {
    let reply = match analysis.intent {
        Intent::Greeting => replies::greeting(analysis),
        Intent::Search => {
            let term = analysis.search_term.as_deref().unwrap_or_default();

            let products = if term.is_empty() { catalog.get_all_items().await? } else { catalog.search_items(term).await? };
            let label = if term.is_empty() { "product" } else { term };

            replies::search_results(label, &products)
        }
        Intent::Order => {
            let order = match_items(catalog, analysis).await?;

            let reply = if order.matched.is_empty() {
                replies::nothing_matched()
            } else {
                replies::order_confirmation(&order.matched, &order.partial)
            };

            return Ok((order, reply));
        }
        Intent::Reject | Intent::Unclear | Intent::Error => replies::model_message_or_fallback(analysis),
    };

    Ok((OrderMatch::default(), reply))
}

/// Start the payment and build the reply.  Never fails: failures become part of the outcome.
async fn handle_payment_command(runtime: &Runtime, sender: &str, command: PaymentCommand) -> (PaymentOutcome, String) {
    let order_id = Uuid::new_v4().to_string();

    let mut outcome = PaymentOutcome {
        amount: command.amount,
        method: command.method,
        order_id: order_id.clone(),
        reference: None,
        checkout_url: None,
        error: None,
    };

    let result = match command.method {
        PaymentMethod::Mpesa => runtime.payment.trigger_mpesa_payment(sender, command.amount, &order_id).await,
        PaymentMethod::Card => runtime.payment.generate_card_link(sender, command.amount, &order_id).await,
    };

    let reply = match result {
        Ok(value) => match command.method {
            PaymentMethod::Mpesa => {
                let reply = replies::payment_started(command.amount, &value);
                outcome.reference = Some(value);
                reply
            }
            PaymentMethod::Card => {
                let reply = replies::card_link(command.amount, &value);
                outcome.checkout_url = Some(value);
                reply
            }
        },
        Err(err) => {
            error!("Payment for order {order_id} failed: {err:#}");

            let reason = match err.downcast_ref::<PaymentError>() {
                Some(PaymentError::Api(message) | PaymentError::Failed(message)) => message.clone(),
                Some(invalid @ PaymentError::InvalidAmount(_)) => invalid.to_string(),
                _ => "payment service unavailable".to_string(),
            };

            outcome.error = Some(err.to_string());
            replies::payment_failed(&reason)
        }
    };

    (outcome, reply)
}

/// Send a reply, logging rather than propagating failures.
async fn send_reply(chat: &ChatClient, recipient: &str, text: &str) {
    if let Err(err) = chat.send_message(recipient, text).await {
        error!("Failed to reply to {recipient}: {err:#}");
    }
}
