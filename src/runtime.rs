//! Runtime services and shared state for phil-elect.

use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::{CatalogBackend, Config},
        types::{Res, Void},
    },
    server,
    service::{catalog::CatalogClient, chat::ChatClient, llm::LlmClient, payment::PaymentClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the service clients and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The product catalog.
    pub catalog: CatalogClient,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The WhatsApp client instance.
    pub chat: ChatClient,
    /// The payment client instance.
    pub payment: PaymentClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the catalog.
        let catalog = match config.catalog_backend {
            CatalogBackend::Supabase => CatalogClient::supabase(&config)?,
            CatalogBackend::Memory => CatalogClient::memory().await?,
        };

        info!("Catalog backend: {:?}", config.catalog_backend);

        // Initialize the LLM client.
        let llm = LlmClient::openai(&config);

        // Initialize the WhatsApp client.
        let chat = ChatClient::whatsapp(&config)?;

        // Initialize the payment client.
        let payment = PaymentClient::paystack(&config)?;

        if config.mpesa_consumer_key.is_some() && config.mpesa_consumer_secret.is_some() && config.paystack_secret_key.is_none() {
            warn!("MPESA_CONSUMER_KEY/SECRET are set, but STK Push goes through Paystack: set PAYSTACK_SECRET_KEY.");
        }

        if config.whatsapp_verify_token.is_none() {
            warn!("WHATSAPP_VERIFY_TOKEN is not set; webhook verification will fail.");
        }

        Ok(Self {
            config,
            catalog,
            llm,
            chat,
            payment,
        })
    }

    /// Serve the webhook until Ctrl-C.
    pub async fn start(&self) -> Void {
        server::serve(self.clone()).await
    }
}
