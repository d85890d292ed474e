//! Money and currency types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency codes (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    RUB,
    JPY,
    CAD,
    AUD,
    CHF,
    CNY,
    INR,
    MXN,
    BRL,
    SGD,
    HKD,
    NZD,
    SEK,
    NOK,
    DKK,
    PLN,
    ZAR,
    KRW,
}

impl Currency {
    /// Get currency code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::RUB => "RUB",
            Self::JPY => "JPY",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::CHF => "CHF",
            Self::CNY => "CNY",
            Self::INR => "INR",
            Self::MXN => "MXN",
            Self::BRL => "BRL",
            Self::SGD => "SGD",
            Self::HKD => "HKD",
            Self::NZD => "NZD",
            Self::SEK => "SEK",
            Self::NOK => "NOK",
            Self::DKK => "DKK",
            Self::PLN => "PLN",
            Self::ZAR => "ZAR",
            Self::KRW => "KRW",
        }
    }

    /// Get decimal places (0 for zero-decimal currencies)
    pub fn decimals(&self) -> u32 {
        match self {
            Self::JPY | Self::KRW => 0,
            _ => 2,
        }
    }

    /// Parse from a three-letter code, case-insensitive
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Self::USD),
            "EUR" => Some(Self::EUR),
            "GBP" => Some(Self::GBP),
            "RUB" => Some(Self::RUB),
            "JPY" => Some(Self::JPY),
            "CAD" => Some(Self::CAD),
            "AUD" => Some(Self::AUD),
            "CHF" => Some(Self::CHF),
            "CNY" => Some(Self::CNY),
            "INR" => Some(Self::INR),
            "MXN" => Some(Self::MXN),
            "BRL" => Some(Self::BRL),
            "SGD" => Some(Self::SGD),
            "HKD" => Some(Self::HKD),
            "NZD" => Some(Self::NZD),
            "SEK" => Some(Self::SEK),
            "NOK" => Some(Self::NOK),
            "DKK" => Some(Self::DKK),
            "PLN" => Some(Self::PLN),
            "ZAR" => Some(Self::ZAR),
            "KRW" => Some(Self::KRW),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Decimal amount paired with its currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in major units (15.00 is fifteen dollars)
    pub amount: Decimal,
    /// Currency
    pub currency: Currency,
}

impl Money {
    /// Create a new money amount, rounded to the currency's precision
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(currency.decimals()),
            currency,
        }
    }

    /// Exact match on both amount and currency
    pub fn same_as(&self, amount: Decimal, currency: Currency) -> bool {
        self.currency == currency && self.amount == amount
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.prec$} {}",
            self.amount,
            self.currency.code(),
            prec = self.currency.decimals() as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("usd"), Some(Currency::USD));
        assert_eq!(Currency::from_code("RUB"), Some(Currency::RUB));
        assert_eq!(Currency::from_code("XXX"), None);
        assert_eq!(Currency::from_code(""), None);
    }

    #[test]
    fn test_currency_serde_uses_code() {
        let json = serde_json::to_string(&Currency::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");

        let parsed: Currency = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(parsed, Currency::GBP);
    }

    #[test]
    fn test_money_rounds_to_currency_precision() {
        let money = Money::new(Decimal::new(150049, 4), Currency::USD);
        assert_eq!(money.amount, Decimal::new(1500, 2));

        let yen = Money::new(Decimal::new(10004, 1), Currency::JPY);
        assert_eq!(yen.amount, Decimal::from(1000));
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(Decimal::new(15, 0), Currency::USD);
        assert_eq!(money.to_string(), "15.00 USD");
    }

    #[test]
    fn test_money_same_as() {
        let money = Money::new(Decimal::new(1500, 2), Currency::USD);
        assert!(money.same_as(Decimal::new(15, 0), Currency::USD));
        assert!(!money.same_as(Decimal::new(15, 0), Currency::EUR));
        assert!(!money.same_as(Decimal::new(1501, 2), Currency::USD));
    }
}
