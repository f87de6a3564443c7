//! Recognition of the `Pay <amount>` command.

use std::sync::OnceLock;

use regex::Regex;

use crate::base::types::{MAX_PAYMENT_AMOUNT, PaymentCommand, PaymentMethod};

static PAY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn pay_pattern() -> &'static Regex {
    PAY_PATTERN.get_or_init(|| Regex::new(r"(?i)^\s*pay\s+(?:(?:kes|ksh|kshs)\.?\s*)?([0-9][0-9,]*)(?:\.00)?(?:\s+(?:(?:via|by|with)\s+)?(card|mpesa|m-pesa))?\s*[.!]?\s*$").unwrap())
}

/// Parse a payment command such as `Pay 14500`, `pay KSh 14,500` or `Pay 3500 card`.
///
/// Returns `None` for anything else, including a zero amount or one above [`MAX_PAYMENT_AMOUNT`].
pub fn parse(text: &str) -> Option<PaymentCommand> {
    let captures = pay_pattern().captures(text)?;

    let amount: u64 = captures.get(1)?.as_str().replace(',', "").parse().ok()?;

    if amount == 0 || amount > MAX_PAYMENT_AMOUNT {
        return None;
    }

    let method = match captures.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(method) if method == "card" => PaymentMethod::Card,
        _ => PaymentMethod::Mpesa,
    };

    Some(PaymentCommand { amount, method })
}

// Tests.
