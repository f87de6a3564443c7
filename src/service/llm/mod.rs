//! Intent extraction with Large Language Model services.
//!
//! The module defines the `GenericLlmClient` trait that can be implemented
//! for different LLM providers, with a default implementation for OpenAI.

pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::base::types::{Analysis, Res};

// Errors.

/// Failures while turning a customer message into an [`Analysis`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("OpenAI API key not configured")]
    NotConfigured,
    #[error("Failed to parse AI response")]
    Parse(#[from] serde_json::Error),
    #[error("LLM returned an empty response")]
    Empty,
}

/// The customer-facing message for an analysis failure.
pub fn fallback_message(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::NotConfigured) => "OpenAI API key not configured",
        Some(AnalysisError::Parse(_)) => "Failed to parse AI response",
        _ => "System busy. Please try again.",
    }
}

// Traits.

/// Generic LLM client trait that clients must implement.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Classify a customer message into an intent and the items it mentions.
    async fn analyze_message(&self, text: &str) -> Res<Analysis>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }

    /// Analyze a message, never failing: errors become an `error` analysis.
    pub async fn analyze_or_fallback(&self, text: &str) -> Analysis {
        match self.analyze_message(text).await {
            Ok(analysis) => analysis,
            Err(err) => {
                tracing::error!("Message analysis failed: {err:#}");
                Analysis::error(fallback_message(&err))
            }
        }
    }
}

// Tests.
