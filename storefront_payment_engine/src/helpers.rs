//! Payment-reference helpers.
//!
//! A payment reference is the string a payer must include in their bank transfer memo so that the gateway can
//! reconcile the incoming transfer with an order. References are derived from the order number by stripping
//! everything that banks tend to mangle (punctuation, whitespace) and comparisons are always case-insensitive.

use crate::db_types::OrderNumber;

/// Derive the payment reference for an order number: uppercase, alphanumerics only.
/// `ORD-000123` becomes `ORD000123`.
pub fn payment_reference_for(order_number: &OrderNumber) -> String {
    order_number.as_str().chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_ascii_uppercase()
}

/// Scan a free-text transfer memo for something that looks like a payment reference.
///
/// Banks concatenate the payer's memo with their own boilerplate, so the reference can appear anywhere in the
/// string. The first `ORD`-plus-digits run wins; requiring digits keeps ordinary words like "order" from
/// matching.
pub fn extract_reference_from_memo(memo: &str) -> Option<String> {
    let reference = regex::Regex::new(r"(?i)(ORD\d+)").unwrap();
    reference.captures(memo).and_then(|c| c.get(1).map(|m| m.as_str().to_ascii_uppercase()))
}
