//! Core components, types, and utilities for phil-elect.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - System prompts and fixed customer-facing copy.
//! - Common types and result handling.

pub mod config;
pub mod prompts;
pub mod types;
