//! Library root for `phil-elect`.
//!
//! Phil-Elect is a WhatsApp sales assistant for an electronics shop designed to:
//! - Greet customers and answer catalog questions
//! - Turn free-text orders into priced line items
//! - Start M-PESA or card payments on request
//!
//! The bot integrates with the WhatsApp Cloud API for chat, Supabase (or an
//! in-memory SurrealDB) for the catalog, OpenAI for intent extraction, and
//! Paystack for payments. Each integration sits behind a trait so that
//! implementations can be swapped or mocked.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod server;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Creates the runtime context with catalog, LLM, chat, and payment
/// clients, then serves the webhook until shutdown.
pub async fn start(config: Config) -> Void {
    info!("Starting phil-elect ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
