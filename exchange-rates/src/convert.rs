//! Pure conversion and formatting helpers.

use tracing::warn;

use crate::CurrencyCode;
use crate::cache::ExchangeRateTable;

const CRYPTO_CURRENCIES: &[&str] = &["BTC", "ETH", "USDT", "USDC", "BNB"];

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn same_currency(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Rate of `code` in `table`, or 1 when the table does not know it.
fn rate_or_one(table: &ExchangeRateTable, code: &str) -> f64 {
    match table.rate(code) {
        Some(rate) if rate > 0.0 => rate,
        _ => {
            warn!(
                currency = %code,
                base = %table.base,
                "No exchange rate for currency, assuming 1"
            );
            1.0
        }
    }
}

/// `amount / from_rate * to_rate * (1 + markup / 100)`, rounded to cents.
pub fn convert_with_table(
    table: &ExchangeRateTable,
    amount: f64,
    from: &str,
    to: &str,
    markup_percent: f64,
) -> f64 {
    if same_currency(from, to) {
        return amount;
    }
    let base_amount = amount / rate_or_one(table, from);
    let converted = base_amount * rate_or_one(table, to);
    round2(converted * (1.0 + markup_percent / 100.0))
}

/// Units of `to` per one unit of `from`.
pub fn rate_with_table(table: &ExchangeRateTable, from: &str, to: &str) -> f64 {
    if same_currency(from, to) {
        return 1.0;
    }
    rate_or_one(table, to) / rate_or_one(table, from)
}

/// Formats an amount for display, e.g. `₦1550.00` or `₿0.00002300`.
///
/// BTC and ETH show eight decimals; everything else shows two. Unknown codes
/// use the code itself as the symbol.
pub fn format_currency_with_symbol(amount: f64, currency: &str) -> String {
    match currency.parse::<CurrencyCode>() {
        Ok(code) => format!(
            "{}{:.*}",
            code.symbol(),
            code.display_decimals(),
            amount
        ),
        Err(_) => format!("{}{:.2}", currency, amount),
    }
}

pub fn is_crypto_currency(currency: &str) -> bool {
    CRYPTO_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(currency.trim()))
}
