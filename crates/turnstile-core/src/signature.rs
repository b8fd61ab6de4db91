//! Gateway signature profiles
//!
//! Every message exchanged with the payment gateway carries an MD5 hex
//! digest over a colon-joined list of fields. Which fields, which shared
//! secret, and which hex case depend on the direction:
//!
//! - payment-link profile: `merchant:amount:invoice:password1:<custom>`
//!   where `<custom>` is the `key=value` custom fields joined by `:` in
//!   sorted key order, uppercase hex;
//! - callback profile: `amount:invoice:password:<custom>`, password #2 for
//!   the server-to-server result callback, password #1 for the browser
//!   success redirect;
//! - recurring-request profile: `merchant:amount:invoice:recurring:password1`,
//!   lowercase hex.
//!
//! Verification recomputes the digest and compares case-insensitively in
//! constant time. A mismatch is a hard rejection.

/// Length of an MD5 hex digest
pub const SIGNATURE_LEN: usize = 32;

fn md5_hex(parts: &[&str]) -> String {
    format!("{:x}", md5::compute(parts.join(":").as_bytes()))
}

/// Render custom fields as `key=value`, sorted by key.
fn custom_fields(custom: &[(&str, &str)]) -> Vec<String> {
    let mut rendered: Vec<String> = custom.iter().map(|(k, v)| format!("{k}={v}")).collect();
    rendered.sort();
    rendered
}

/// Sign an outbound hosted-payment-page URL.
pub fn sign_payment_link(
    merchant_login: &str,
    out_sum: &str,
    invoice_id: &str,
    password: &str,
    custom: &[(&str, &str)],
) -> String {
    let rendered = custom_fields(custom);
    let mut parts = vec![merchant_login, out_sum, invoice_id, password];
    parts.extend(rendered.iter().map(String::as_str));
    md5_hex(&parts).to_ascii_uppercase()
}

/// Sign (or recompute for verification) an inbound callback.
pub fn sign_callback(
    out_sum: &str,
    invoice_id: &str,
    password: &str,
    custom: &[(&str, &str)],
) -> String {
    let rendered = custom_fields(custom);
    let mut parts = vec![out_sum, invoice_id, password];
    parts.extend(rendered.iter().map(String::as_str));
    md5_hex(&parts).to_ascii_uppercase()
}

/// Sign an outbound recurring-charge request.
///
/// The recurring API expects lowercase hex, unlike the link and callback
/// profiles.
pub fn sign_recurring_request(
    merchant_login: &str,
    out_sum: &str,
    invoice_id: &str,
    recurring_id: &str,
    password: &str,
) -> String {
    md5_hex(&[merchant_login, out_sum, invoice_id, recurring_id, password])
}

/// Compare a computed digest against a received one.
///
/// Case-insensitive: both sides are ASCII-uppercased before the comparison,
/// which is the single canonical normalization for every callback kind.
pub fn signatures_match(computed: &str, received: &str) -> bool {
    constant_time_eq(
        computed.to_ascii_uppercase().as_bytes(),
        received.to_ascii_uppercase().as_bytes(),
    )
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
