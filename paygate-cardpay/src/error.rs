//! Error types for the CardPay integration

use paygate_core::{RepositoryError, requisite};
use std::fmt;
use thiserror::Error;

/// Payer requisite that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequisiteField {
    Pan,
    Cvv,
    Month,
    Year,
    CardHolder,
    EWallet,
    Address,
}

impl RequisiteField {
    /// Requisite key as submitted by the payer
    pub fn key(&self) -> &'static str {
        match self {
            Self::Pan => requisite::PAN,
            Self::Cvv => requisite::CVV,
            Self::Month => requisite::MONTH,
            Self::Year => requisite::YEAR,
            Self::CardHolder => requisite::HOLDER,
            Self::EWallet => requisite::EWALLET,
            Self::Address => requisite::ADDRESS,
        }
    }
}

impl fmt::Display for RequisiteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Failure to build a provider payload from an order
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Requisite missing or malformed
    #[error("{}", invalid_requisite_message(.0))]
    InvalidRequisites(RequisiteField),

    /// No builder for the payment method's external code
    #[error("unknown payment method")]
    UnknownPaymentMethod(String),

    /// Order carries no payment method snapshot
    #[error("payment method for order not selected")]
    MissingPaymentMethod,

    /// Order carries no outcome amount
    #[error("order amount for payment method not calculated")]
    MissingAmount,
}

fn invalid_requisite_message(field: &RequisiteField) -> String {
    match field {
        RequisiteField::EWallet => "wallet identifier is invalid".to_string(),
        RequisiteField::Address => "crypto currency address is invalid".to_string(),
        other => format!("bank card {} is invalid", other),
    }
}

/// Payment gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Token could not be obtained
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Provider refused or could not be reached
    #[error("order can't be create. try request later")]
    GatewayRequestFailed(String),

    /// Payload could not be built from the order
    #[error(transparent)]
    Validation(#[from] BuildError),

    /// Missing or malformed provider settings
    #[error("payment system settings not found: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::GatewayRequestFailed(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::GatewayRequestFailed(err.to_string())
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure to process a provider notification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("request signature is invalid")]
    SignatureInvalid,

    #[error("request body is invalid: {0}")]
    MalformedPayload(String),

    #[error("time field in request is invalid")]
    InvalidCallbackTime,

    #[error("payment method from request not equal value in order")]
    PaymentMethodMismatch,

    #[error("unknown currency received from payment system")]
    UnknownCurrency,

    #[error("order with specified identifier not found")]
    OrderNotFound,

    #[error("order can't create. try request later")]
    OrderRejectedOnCreate,

    #[error("order status can't be changed")]
    StatusConflict,

    #[error("order update failed: {0}")]
    Persistence(#[from] RepositoryError),
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::MalformedPayload(err.to_string())
    }
}

/// Result type for notification handling
pub type NotificationResult<T> = Result<T, NotificationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_requisite_messages() {
        assert_eq!(
            BuildError::InvalidRequisites(RequisiteField::Pan).to_string(),
            "bank card pan is invalid"
        );
        assert_eq!(
            BuildError::InvalidRequisites(RequisiteField::EWallet).to_string(),
            "wallet identifier is invalid"
        );
        assert_eq!(
            BuildError::InvalidRequisites(RequisiteField::Address).to_string(),
            "crypto currency address is invalid"
        );
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err: GatewayError = BuildError::UnknownPaymentMethod("PAYPAL".into()).into();
        assert_eq!(err.to_string(), "unknown payment method");
    }
}
