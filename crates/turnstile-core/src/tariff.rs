//! Tariff table and invoice id derivation

/// Fixed tariff table: subscription duration in months to price.
pub const TARIFF_PRICES: [(u32, u32); 4] = [(1, 1290), (3, 3490), (6, 6490), (9, 8990)];

/// Tariff durations offered to users, in months
pub const SUPPORTED_DURATIONS: [u32; 4] = [1, 3, 6, 9];

/// Price for a duration; unrecognized durations fall back to the 1-month
/// price so a renewal charge is always attempted with a sane amount.
pub fn price_for(months: i32) -> u32 {
    TARIFF_PRICES
        .iter()
        .find(|(m, _)| *m as i32 == months)
        .map(|(_, price)| *price)
        .unwrap_or(TARIFF_PRICES[0].1)
}

/// Price for a duration a user may actually buy
pub fn supported_price(months: u32) -> Option<u32> {
    TARIFF_PRICES
        .iter()
        .find(|(m, _)| *m == months)
        .map(|(_, price)| *price)
}

/// Synthetic invoice id correlating a payment session to a user and tariff.
///
/// Reversible only while `months` stays a single decimal digit, which all
/// supported durations satisfy.
pub fn invoice_id(user_id: i64, months: u32) -> i64 {
    debug_assert!(months < 10, "invoice id requires a single-digit duration");
    user_id * 10 + i64::from(months)
}
