//! Payment methods and the payment systems that serve them

use crate::money::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// External provider codes for the instruments the gateway routes
pub mod external_code {
    pub const BANK_CARD: &str = "BANKCARD";
    pub const WEBMONEY: &str = "WEBMONEY";
    pub const QIWI: &str = "QIWI";
    pub const NETELLER: &str = "NETELLER";
    pub const ALIPAY: &str = "ALIPAY";
    pub const BITCOIN: &str = "BITCOIN";
}

/// Category of payment credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    BankCard,
    EWallet,
    Crypto,
}

impl InstrumentType {
    /// Resolve the instrument served under a provider code
    pub fn from_external_code(code: &str) -> Option<Self> {
        match code {
            external_code::BANK_CARD => Some(Self::BankCard),
            external_code::WEBMONEY
            | external_code::QIWI
            | external_code::NETELLER
            | external_code::ALIPAY => Some(Self::EWallet),
            external_code::BITCOIN => Some(Self::Crypto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankCard => "bank_card",
            Self::EWallet => "ewallet",
            Self::Crypto => "crypto",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific parameters of a payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodParams {
    /// Handler that talks to the provider (e.g. "cardpay")
    pub handler: String,
    /// Terminal code registered with the provider, if it differs from the handler default
    pub terminal: Option<String>,
    /// Provider code for the method (e.g. "BANKCARD")
    pub external_id: String,
}

/// Payment method offered to payers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub name: String,
    pub group_alias: String,
    pub is_active: bool,
    pub instrument: InstrumentType,
    pub payment_system_id: Uuid,
    pub params: PaymentMethodParams,
    /// Currencies the method accepts; empty means any
    pub currencies: Vec<Currency>,
    pub min_payment_amount: Option<Decimal>,
    pub max_payment_amount: Option<Decimal>,
    /// Pattern payer accounts (card numbers, wallet ids) must match
    pub account_regexp: Option<String>,
}

impl PaymentMethod {
    /// Whether an order in `currency` may be paid with this method
    pub fn accepts_currency(&self, currency: Currency) -> bool {
        self.currencies.is_empty() || self.currencies.contains(&currency)
    }
}

/// Configured third-party provider endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSystem {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    /// Base URL of the provider API
    pub api_url: String,
    pub accounting_currency: Currency,
    pub accounting_period: String,
}
