//! Wire format of the CardPay payment creation request

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used by CardPay in both directions
pub const CARDPAY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Body of `POST /api/payments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayload {
    pub request: PayloadRequest,
    pub merchant_order: MerchantOrder,
    pub description: String,
    pub payment_method: String,
    pub payment_data: PaymentData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_account: Option<CardAccount>,
    pub customer: Customer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ewallet_account: Option<EWalletAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cryptocurrency_account: Option<CryptoCurrencyAccount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRequest {
    pub id: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantOrder {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub description: String,
    pub count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentData {
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAccount {
    pub card: Card,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub pan: String,
    pub holder: String,
    pub security_code: String,
    /// `MM/YYYY`
    pub expiration: String,
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last4 = self.pan.get(self.pan.len().saturating_sub(4)..).unwrap_or_default();
        f.debug_struct("Card")
            .field("pan", &format_args!("****{}", last4))
            .field("holder", &self.holder)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub ip: String,
    /// Payer account in the project
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EWalletAccount {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoCurrencyAccount {
    pub rollback_address: String,
}

/// Successful payment creation response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAccepted {
    pub redirect_url: String,
}
