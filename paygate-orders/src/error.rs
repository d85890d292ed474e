//! Admission errors
//!
//! `Display` is the message returned to the project that submitted the order.

use thiserror::Error;

/// Reason an order request was not admitted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("project with specified identifier not found")]
    ProjectNotFound,

    #[error("project with specified identifier is inactive")]
    ProjectInactive,

    #[error("currency received from request not found")]
    CurrencyNotFound,

    #[error("order request signature is invalid")]
    SignatureInvalid,

    #[error("payment method not specified for project")]
    PaymentMethodNotAllowed,

    #[error("payment method with specified not found")]
    PaymentMethodNotFound,

    #[error("payment method with specified is inactive")]
    PaymentMethodInactive,

    #[error("payment system for specified payment method not found")]
    PaymentSystemNotFound,

    #[error("payment system for specified payment method is inactive")]
    PaymentSystemInactive,

    #[error("payer region can't be found")]
    PayerRegionUnknown,

    #[error("project not have fixed packages for payer region")]
    FixedPackageForRegionNotFound,

    #[error("project not have fixed package with specified amount or currency")]
    FixedPackageNotFound,

    #[error("order amount is lower than min allowed payment amount for project")]
    AmountLowerThanMinAllowed,

    #[error("order amount is greater than max allowed payment amount for project")]
    AmountGreaterThanMaxAllowed,

    #[error("order amount is lower than min allowed payment amount for payment method")]
    AmountLowerThanMinAllowedPaymentMethod,

    #[error("order amount is greater than max allowed payment amount for payment method")]
    AmountGreaterThanMaxAllowedPaymentMethod,

    #[error("payment method not allow order currency")]
    PaymentMethodCurrencyNotAllowed,

    #[error("request with specified project order identifier processed early")]
    DuplicateProjectOrderId,

    #[error("dynamic verify url or notify url not allowed for project")]
    DynamicNotifyUrlsNotAllowed,

    #[error("dynamic payer redirect urls not allowed for project")]
    DynamicRedirectUrlsNotAllowed,

    #[error("order can't create. try request later")]
    OrderCanNotCreate,

    /// Raw request could not be read
    #[error("{field} is invalid")]
    InvalidField { field: &'static str },

    #[error("required field {field} not found")]
    MissingField { field: &'static str },
}

impl AdmissionError {
    /// Pipeline stage that produced the error, for logging
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ProjectNotFound | Self::ProjectInactive => "project",
            Self::CurrencyNotFound => "currency",
            Self::SignatureInvalid => "signature",
            Self::PaymentMethodNotAllowed
            | Self::PaymentMethodNotFound
            | Self::PaymentMethodInactive
            | Self::PaymentSystemNotFound
            | Self::PaymentSystemInactive => "payment_method",
            Self::PayerRegionUnknown
            | Self::FixedPackageForRegionNotFound
            | Self::FixedPackageNotFound => "fixed_package",
            Self::AmountLowerThanMinAllowed | Self::AmountGreaterThanMaxAllowed => "project_limits",
            Self::AmountLowerThanMinAllowedPaymentMethod
            | Self::AmountGreaterThanMaxAllowedPaymentMethod
            | Self::PaymentMethodCurrencyNotAllowed => "payment_method_limits",
            Self::DuplicateProjectOrderId => "project_order_id",
            Self::DynamicNotifyUrlsNotAllowed => "notify_urls",
            Self::DynamicRedirectUrlsNotAllowed => "redirect_urls",
            Self::OrderCanNotCreate => "insert",
            Self::InvalidField { .. } | Self::MissingField { .. } => "request",
        }
    }
}

/// Result type for admission
pub type AdmissionResult<T> = Result<T, AdmissionError>;
