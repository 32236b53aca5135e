//! Exchange Rates Library with Macro-Based Currency Definitions
//!
//! Provides the supported currency set, a built-in rate table, and a
//! time-bounded [`RateCache`] that always resolves to *some* rate table:
//! fresh, stale, or built-in.
//!
//! # Adding a New Currency
//! Add a line to the `define_currencies!` macro invocation:
//! ```ignore
//! define_currencies! {
//!     // ... existing currencies ...
//!     JPY => ("JPY", "¥", 2, 151.2),
//! }
//! ```
//!
//! # Example
//! ```
//! use exchange_rates::{CurrencyCode, format_currency_with_symbol};
//!
//! let naira: CurrencyCode = "ngn".parse().unwrap();
//! assert_eq!(naira.symbol(), "₦");
//! assert_eq!(format_currency_with_symbol(0.5, "BTC"), "₿0.50000000");
//! ```

pub mod cache;
pub mod config;
pub mod convert;
pub mod source;

pub use cache::{Clock, ExchangeRateTable, ManualClock, RateCache, SystemClock};
pub use config::RatesConfig;
pub use convert::{
    convert_with_table, format_currency_with_symbol, is_crypto_currency, rate_with_table, round2,
};
pub use source::{HttpRateSource, RateError, RateSnapshot, RateSource};

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Defines all currencies and the CurrencyCode enum
// ─────────────────────────────────────────────────────────────────────────────

/// Macro to define currencies with an auto-generated `CurrencyCode` enum.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     Name => ("CODE", "SYMBOL", display_decimals, units_per_usd),
/// }
/// ```
#[macro_export]
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $symbol:literal, $decimals:expr, $per_usd:expr)
        ),* $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum CurrencyCode {
            $($name),*
        }

        impl CurrencyCode {
            pub fn code(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $code),*
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $symbol),*
                }
            }

            /// Decimal places used when displaying an amount.
            pub fn display_decimals(&self) -> usize {
                match self {
                    $(CurrencyCode::$name => $decimals),*
                }
            }

            /// Built-in rate: units of this currency per one USD.
            pub fn default_rate(&self) -> f64 {
                match self {
                    $(CurrencyCode::$name => $per_usd),*
                }
            }

            pub fn all() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }

        impl std::fmt::Display for CurrencyCode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }

        impl std::str::FromStr for CurrencyCode {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($code => Ok(CurrencyCode::$name),)*
                    _ => Err(format!("Unknown currency: {}", s)),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS - Add new currencies here!
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    USD => ("USD", "$", 2, 1.0),
    EUR => ("EUR", "€", 2, 0.92),
    GBP => ("GBP", "£", 2, 0.79),
    NGN => ("NGN", "₦", 2, 1550.0),
    GHS => ("GHS", "₵", 2, 15.5),
    KES => ("KES", "KSh", 2, 158.0),
    ZAR => ("ZAR", "R", 2, 19.2),
    BTC => ("BTC", "₿", 8, 0.000023),
    ETH => ("ETH", "Ξ", 8, 0.00041),
    USDT => ("USDT", "₮", 2, 1.001),
}
