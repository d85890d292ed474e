//! Orders and their lifecycle

use crate::money::{Currency, Money};
use crate::payment::{InstrumentType, PaymentMethod, PaymentMethodParams, PaymentSystem};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Keys of the raw payment requisites a payer submits
pub mod requisite {
    pub const PAN: &str = "pan";
    pub const CVV: &str = "cvv";
    pub const MONTH: &str = "month";
    pub const YEAR: &str = "year";
    pub const HOLDER: &str = "card_holder";
    pub const EWALLET: &str = "ewallet";
    pub const ADDRESS: &str = "address";
}

/// Keys of the transaction parameters a provider reports back
pub mod txn_param {
    pub const EMISSION_COUNTRY: &str = "emission_country";
    pub const TOKEN: &str = "token";
    pub const IS_3DS: &str = "is_3ds";
    pub const RRN: &str = "rrn";
    pub const DECLINE_CODE: &str = "decline_code";
    pub const DECLINE_REASON: &str = "decline_reason";
    pub const CRYPTO_TRANSACTION_ID: &str = "transaction_id";
    pub const CRYPTO_AMOUNT: &str = "amount_crypto";
    pub const CRYPTO_CURRENCY: &str = "currency_crypto";
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Admitted, nothing sent to the provider yet
    Created,
    /// Payment created at the provider
    PaymentSystemCreate,
    /// Provider refused to create the payment
    PaymentSystemRejectOnCreate,
    /// Provider notification could not be applied
    PaymentSystemReject,
    /// Provider reported the payment as completed
    PaymentSystemComplete,
    PaymentSystemDeclined,
    PaymentSystemCanceled,
    /// Completed and reported to the project
    Complete,
}

impl OrderStatus {
    /// Numeric code stored alongside the order
    pub fn code(&self) -> u8 {
        match self {
            Self::Created => 0,
            Self::PaymentSystemCreate => 1,
            Self::PaymentSystemRejectOnCreate => 2,
            Self::PaymentSystemReject => 3,
            Self::PaymentSystemComplete => 4,
            Self::PaymentSystemDeclined => 5,
            Self::PaymentSystemCanceled => 6,
            Self::Complete => 10,
        }
    }

    /// No further provider notification may change the order
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::PaymentSystemComplete
                | Self::PaymentSystemDeclined
                | Self::PaymentSystemCanceled
                | Self::Complete
        )
    }

    /// Payment was completed by the provider
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::PaymentSystemComplete | Self::Complete)
    }

    /// Whether a provider notification may be applied in this status
    pub fn accepts_notification(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::PaymentSystemCreate | Self::PaymentSystemReject
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::PaymentSystemCreate => "payment_system_create",
            Self::PaymentSystemRejectOnCreate => "payment_system_reject_on_create",
            Self::PaymentSystemReject => "payment_system_reject",
            Self::PaymentSystemComplete => "payment_system_complete",
            Self::PaymentSystemDeclined => "payment_system_declined",
            Self::PaymentSystemCanceled => "payment_system_canceled",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Payer data captured at order creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerData {
    pub ip: String,
    pub country: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Snapshot of the payment method chosen for an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaymentMethod {
    pub id: Uuid,
    pub name: String,
    pub group_alias: String,
    pub instrument: InstrumentType,
    pub params: PaymentMethodParams,
    pub payment_system: PaymentSystem,
    /// Format the payer account must match, if any
    pub account_regexp: Option<String>,
}

impl OrderPaymentMethod {
    /// Snapshot a payment method together with its payment system
    pub fn snapshot(method: &PaymentMethod, system: &PaymentSystem) -> Self {
        Self {
            id: method.id,
            name: method.name.clone(),
            group_alias: method.group_alias.clone(),
            instrument: method.instrument,
            params: method.params.clone(),
            payment_system: system.clone(),
            account_regexp: method.account_regexp.clone(),
        }
    }
}

/// Snapshot of the fixed package an order was matched against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFixedPackage {
    pub id: Uuid,
    pub name: String,
    pub region: String,
    pub price: Decimal,
    pub currency: Currency,
}

/// Project-supplied callback and redirect URLs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUrls {
    pub verify: Option<String>,
    pub notify: Option<String>,
    pub success: Option<String>,
    pub fail: Option<String>,
}

/// Payment order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Order identifier in the project's own system
    pub project_order_id: Option<String>,
    /// Payer account in the project
    pub project_account: String,
    pub description: String,
    pub project_income: Money,
    pub project_params: HashMap<String, String>,
    pub urls: OrderUrls,
    pub payer: PayerData,
    pub fixed_package: Option<OrderFixedPackage>,
    pub payment_method: Option<OrderPaymentMethod>,
    /// Amount the payer is charged through the payment method
    pub payment_method_outcome: Option<Money>,
    /// Amount the provider reports as received
    pub payment_method_income: Option<Money>,
    pub payment_requisites: HashMap<String, String>,
    pub payment_method_payer_account: Option<String>,
    pub payment_method_txn_params: HashMap<String, String>,
    pub payment_method_terminal_id: Option<String>,
    /// Provider-side payment identifier
    pub payment_method_order_id: Option<String>,
    pub payment_method_order_closed_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a freshly admitted order
    pub fn new(
        project_id: Uuid,
        project_account: impl Into<String>,
        amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            project_id,
            project_order_id: None,
            project_account: project_account.into(),
            description: default_description(id),
            project_income: amount,
            project_params: HashMap::new(),
            urls: OrderUrls::default(),
            payer: PayerData::default(),
            fixed_package: None,
            payment_method: None,
            payment_method_outcome: None,
            payment_method_income: None,
            payment_requisites: HashMap::new(),
            payment_method_payer_account: None,
            payment_method_txn_params: HashMap::new(),
            payment_method_terminal_id: None,
            payment_method_order_id: None,
            payment_method_order_closed_at: None,
            status: OrderStatus::Created,
            created_at,
            updated_at: created_at,
        }
    }

    /// Attach a payer requisite (card number, wallet id, ...)
    pub fn with_requisite(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payment_requisites.insert(key.into(), value.into());
        self
    }

    /// Look up a requisite by key
    pub fn requisite(&self, key: &str) -> Option<&str> {
        self.payment_requisites.get(key).map(String::as_str)
    }
}

/// Description used when the project does not supply one
pub fn default_description(order_id: Uuid) -> String {
    format!("Payment by order # {}", order_id)
}
