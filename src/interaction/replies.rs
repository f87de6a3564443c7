//! Customer-facing reply text.

use crate::base::{
    prompts::GREETING_MESSAGE,
    types::{Analysis, MatchedItem, Product, RequestedItem},
};

const FALLBACK_MESSAGE: &str = "Sorry, I didn't quite get that. You can ask for a product (e.g. \"Vision Plus TV\"), a category (e.g. \"Fridges\"), or say \"Menu\".";
const NOTHING_MATCHED_MESSAGE: &str = "Sorry, we couldn't find that product. We stock TVs, Fridges, Microwaves, Hotplates and Soundbars. What would you like?";

/// Format a KES amount with thousands separators, e.g. `KES 14,500`.
pub fn format_kes(amount: impl Into<i128>) -> String {
    let amount = amount.into();
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("KES {sign}{grouped}")
}

/// Reply to a greeting.
pub fn greeting(analysis: &Analysis) -> String {
    if analysis.message.is_empty() {
        GREETING_MESSAGE.to_string()
    } else {
        analysis.message.clone()
    }
}

/// Reply to a category search.
pub fn search_results(term: &str, products: &[Product]) -> String {
    if products.is_empty() {
        let term = if term.is_empty() { "that" } else { term };
        return format!("Sorry, we don't have any {term} in stock right now. We stock TVs, Fridges, Microwaves, Hotplates and Soundbars.");
    }

    let lines = products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let availability = if p.stock > 0 { "" } else { " (out of stock)" };
            format!("{}. {} - {}{availability}", i + 1, p.name, format_kes(p.price))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Here are our {term} options:\n\n{lines}\n\nReply with the product name to order.")
}

/// Total of the matched items that can actually be supplied.
pub fn payable_total(matched: &[MatchedItem]) -> i64 {
    matched.iter().filter(|m| m.catalog_match.has_stock(m.qty)).map(MatchedItem::line_total).sum()
}

/// Reply to an order, listing what was found and how to pay.
pub fn order_confirmation(matched: &[MatchedItem], partial: &[RequestedItem]) -> String {
    let mut lines = vec!["Order summary:".to_string(), String::new()];

    for item in matched {
        let product = &item.catalog_match;

        if product.has_stock(item.qty) {
            lines.push(format!("- {} x {} @ {} = {}", item.qty, product.name, format_kes(product.price), format_kes(item.line_total())));
        } else {
            lines.push(format!("- {}: sorry, only {} left in stock.", product.name, product.stock.max(0)));
        }
    }

    if !partial.is_empty() {
        let missing = partial.iter().map(requested_label).collect::<Vec<_>>().join(", ");
        lines.push(format!("- Not found: {missing}"));
    }

    let total = payable_total(matched);

    if total > 0 {
        lines.push(String::new());
        lines.push(format!("Total: {}", format_kes(total)));
        lines.push(String::new());
        lines.push(format!("Reply 'Pay {total}' to pay with M-Pesa, or 'Pay {total} card' for a card payment link."));
    }

    lines.join("\n")
}

fn requested_label(item: &RequestedItem) -> String {
    item.name.clone().or_else(|| item.sku.clone()).unwrap_or_else(|| "an item".to_string())
}

/// Reply when an order matched nothing in the catalog.
pub fn nothing_matched() -> String {
    NOTHING_MATCHED_MESSAGE.to_string()
}

/// Reply carrying the model's own message, e.g. a credit decline or warranty answer.
pub fn model_message_or_fallback(analysis: &Analysis) -> String {
    if analysis.message.trim().is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        analysis.message.clone()
    }
}

/// Reply after an STK Push was accepted.
pub fn payment_started(amount: u64, reference: &str) -> String {
    format!(
        "We've sent an M-Pesa prompt for {} to your phone. Enter your M-Pesa PIN to complete the payment.\n\nReference: {reference}",
        format_kes(amount)
    )
}

/// Reply with a card checkout link.
pub fn card_link(amount: u64, url: &str) -> String {
    format!("Pay {} by card here: {url}", format_kes(amount))
}

/// Reply when a payment could not be started.
pub fn payment_failed(reason: &str) -> String {
    format!("Sorry, we couldn't start the payment ({reason}). Please try again.")
}

// Tests.
