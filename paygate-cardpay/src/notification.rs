//! Callback payloads sent by CardPay

use crate::builder::CARDPAY_TIME_FORMAT;
use crate::error::{NotificationError, NotificationResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use paygate_core::{InstrumentType, OrderStatus, txn_param};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Payment status reported by CardPay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Approved,
    Declined,
    Pending,
    Voided,
    Refunded,
    Chargeback,
    ChargebackResolved,
    Completed,
    Cancelled,
    Other(String),
}

impl ProviderStatus {
    pub fn parse(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "APPROVED" => Self::Approved,
            "DECLINED" => Self::Declined,
            "PENDING" => Self::Pending,
            "VOIDED" => Self::Voided,
            "REFUNDED" => Self::Refunded,
            "CHARGEBACK" => Self::Chargeback,
            "CHARGEBACK RESOLVED" => Self::ChargebackResolved,
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Final order status this provider status settles the order into.
    /// `None` for intermediate statuses that leave the order untouched.
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            Self::Completed => Some(OrderStatus::PaymentSystemComplete),
            Self::Declined => Some(OrderStatus::PaymentSystemDeclined),
            Self::Cancelled => Some(OrderStatus::PaymentSystemCanceled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMerchantOrder {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationCardAccount {
    pub holder: Option<String>,
    pub issuing_country_code: Option<String>,
    pub masked_pan: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationEWalletAccount {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationCryptoAccount {
    pub crypto_address: Option<String>,
    pub crypto_transaction_id: Option<String>,
    pub prc_amount: Option<String>,
    pub prc_currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationCustomer {
    pub email: Option<String>,
    pub ip: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPaymentData {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub auth_code: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub decline_reason: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_3d: Option<bool>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub rrn: Option<String>,
}

/// Body of a CardPay callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayNotification {
    pub merchant_order: NotificationMerchantOrder,
    pub payment_method: String,
    pub callback_time: String,
    #[serde(default)]
    pub card_account: Option<NotificationCardAccount>,
    #[serde(default)]
    pub ewallet_account: Option<NotificationEWalletAccount>,
    #[serde(default)]
    pub cryptocurrency_account: Option<NotificationCryptoAccount>,
    #[serde(default)]
    pub customer: Option<NotificationCustomer>,
    pub payment_data: NotificationPaymentData,
}

impl CardPayNotification {
    pub fn parse(body: &[u8]) -> NotificationResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Order identifier the callback refers to
    pub fn order_id(&self) -> NotificationResult<Uuid> {
        Uuid::parse_str(self.merchant_order.id.trim()).map_err(|_| {
            NotificationError::MalformedPayload(format!(
                "merchant order id '{}' is not an order identifier",
                self.merchant_order.id
            ))
        })
    }

    pub fn callback_time(&self) -> NotificationResult<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.callback_time, CARDPAY_TIME_FORMAT)
            .map(|time| time.and_utc())
            .map_err(|_| NotificationError::InvalidCallbackTime)
    }

    pub fn status(&self) -> ProviderStatus {
        ProviderStatus::parse(&self.payment_data.status)
    }

    pub fn instrument(&self) -> Option<InstrumentType> {
        InstrumentType::from_external_code(&self.payment_method)
    }

    /// Payer account as reported for the instrument
    pub fn payer_account(&self, instrument: InstrumentType) -> Option<String> {
        match instrument {
            InstrumentType::BankCard => self.card_account.as_ref()?.masked_pan.clone(),
            InstrumentType::EWallet => self.ewallet_account.as_ref()?.id.clone(),
            InstrumentType::Crypto => self.cryptocurrency_account.as_ref()?.crypto_address.clone(),
        }
    }

    /// Transaction details kept on the order, empty values skipped
    pub fn txn_params(&self, instrument: InstrumentType) -> HashMap<String, String> {
        let data = &self.payment_data;
        let mut params: Vec<(&str, Option<String>)> = vec![
            (txn_param::DECLINE_CODE, data.decline_code.clone()),
            (txn_param::DECLINE_REASON, data.decline_reason.clone()),
        ];

        match instrument {
            InstrumentType::BankCard => {
                let card = self.card_account.clone().unwrap_or_default();
                params.push((txn_param::EMISSION_COUNTRY, card.issuing_country_code));
                params.push((txn_param::TOKEN, card.token));
                params.push((txn_param::IS_3DS, data.is_3d.map(|v| v.to_string())));
                params.push((txn_param::RRN, data.rrn.clone()));
            }
            InstrumentType::EWallet => {}
            InstrumentType::Crypto => {
                let crypto = self.cryptocurrency_account.clone().unwrap_or_default();
                params.push((txn_param::CRYPTO_TRANSACTION_ID, crypto.crypto_transaction_id));
                params.push((txn_param::CRYPTO_AMOUNT, crypto.prc_amount));
                params.push((txn_param::CRYPTO_CURRENCY, crypto.prc_currency));
            }
        }

        params
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| (key.to_string(), v))
            })
            .collect()
    }
}
