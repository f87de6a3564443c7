//! Message handling and customer interactions for phil-elect.
//!
//! This module provides functionality for handling inbound customer messages:
//! - Recognising payment commands
//! - Matching ordered items against the catalog
//! - Composing and sending replies

pub mod chat_event;
pub mod order;
pub mod payment_command;
pub mod replies;
