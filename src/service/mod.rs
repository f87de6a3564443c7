//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by phil-elect:
//! - Catalog services (e.g., Supabase, in-memory SurrealDB)
//! - Chat services (e.g., WhatsApp)
//! - LLM services (e.g., OpenAI)
//! - Payment services (e.g., Paystack)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod catalog;
pub mod chat;
pub mod llm;
pub mod payment;
