//! Order requests submitted by projects

use crate::error::{AdmissionError, AdmissionResult};
use paygate_core::requisite;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use uuid::Uuid;

/// Form field names of an order request
pub mod field {
    pub const PROJECT_ID: &str = "PP_PROJECT_ID";
    pub const SIGNATURE: &str = "PP_SIGNATURE";
    pub const AMOUNT: &str = "PP_AMOUNT";
    pub const CURRENCY: &str = "PP_CURRENCY";
    pub const ACCOUNT: &str = "PP_ACCOUNT";
    pub const ORDER_ID: &str = "PP_ORDER_ID";
    pub const DESCRIPTION: &str = "PP_DESCRIPTION";
    pub const PAYMENT_METHOD: &str = "PP_PAYMENT_METHOD";
    pub const URL_VERIFY: &str = "PP_URL_VERIFY";
    pub const URL_NOTIFY: &str = "PP_URL_NOTIFY";
    pub const URL_SUCCESS: &str = "PP_URL_SUCCESS";
    pub const URL_FAIL: &str = "PP_URL_FAIL";
    pub const PAYER_EMAIL: &str = "PP_PAYER_EMAIL";
    pub const PAYER_PHONE: &str = "PP_PAYER_PHONE";
    pub const REGION: &str = "PP_REGION";

    pub(crate) const ALL: [&str; 15] = [
        PROJECT_ID,
        SIGNATURE,
        AMOUNT,
        CURRENCY,
        ACCOUNT,
        ORDER_ID,
        DESCRIPTION,
        PAYMENT_METHOD,
        URL_VERIFY,
        URL_NOTIFY,
        URL_SUCCESS,
        URL_FAIL,
        PAYER_EMAIL,
        PAYER_PHONE,
        REGION,
    ];
}

const REQUISITE_KEYS: [&str; 7] = [
    requisite::PAN,
    requisite::CVV,
    requisite::MONTH,
    requisite::YEAR,
    requisite::HOLDER,
    requisite::EWALLET,
    requisite::ADDRESS,
];

/// Order request as received from a project
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub project_id: Uuid,
    pub signature: Option<String>,
    pub amount: Decimal,
    /// ISO 4217 code; fixed-amount projects may leave it to the matched package
    pub currency: Option<String>,
    pub account: String,
    /// Order identifier in the project's own system
    pub project_order_id: Option<String>,
    pub description: Option<String>,
    /// Payment method group alias
    pub payment_method: Option<String>,
    pub url_verify: Option<String>,
    pub url_notify: Option<String>,
    pub url_success: Option<String>,
    pub url_fail: Option<String>,
    pub payer_email: Option<String>,
    pub payer_phone: Option<String>,
    /// Explicit payer region; takes precedence over geolocation
    pub region: Option<String>,
    /// Address the request came from
    pub origin_ip: String,
    /// Payer requisites submitted with the order
    pub requisites: HashMap<String, String>,
    /// Fields the gateway does not know, passed back to the project
    pub other: HashMap<String, String>,
    /// Every submitted field, as signed by the project
    pub raw_params: BTreeMap<String, String>,
}

impl OrderRequest {
    pub fn new(project_id: Uuid, amount: Decimal, account: impl Into<String>) -> Self {
        Self {
            project_id,
            signature: None,
            amount,
            currency: None,
            account: account.into(),
            project_order_id: None,
            description: None,
            payment_method: None,
            url_verify: None,
            url_notify: None,
            url_success: None,
            url_fail: None,
            payer_email: None,
            payer_phone: None,
            region: None,
            origin_ip: String::new(),
            requisites: HashMap::new(),
            other: HashMap::new(),
            raw_params: BTreeMap::new(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_origin_ip(mut self, ip: impl Into<String>) -> Self {
        self.origin_ip = ip.into();
        self
    }

    /// Read a request from submitted form fields. Empty values count as absent.
    pub fn from_params(
        params: &HashMap<String, String>,
        origin_ip: impl Into<String>,
    ) -> AdmissionResult<Self> {
        let get = |name: &str| {
            params
                .get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let require = |name: &'static str| get(name).ok_or(AdmissionError::MissingField { field: name });

        let project_id = Uuid::parse_str(&require(field::PROJECT_ID)?).map_err(|_| {
            AdmissionError::InvalidField {
                field: field::PROJECT_ID,
            }
        })?;
        let amount = Decimal::from_str(&require(field::AMOUNT)?)
            .ok()
            .filter(|amount| amount.is_sign_positive() && !amount.is_zero())
            .ok_or(AdmissionError::InvalidField {
                field: field::AMOUNT,
            })?;

        let mut request = Self::new(project_id, amount, require(field::ACCOUNT)?);
        request.signature = get(field::SIGNATURE);
        request.currency = get(field::CURRENCY);
        request.project_order_id = get(field::ORDER_ID);
        request.description = get(field::DESCRIPTION);
        request.payment_method = get(field::PAYMENT_METHOD);
        request.url_verify = get(field::URL_VERIFY);
        request.url_notify = get(field::URL_NOTIFY);
        request.url_success = get(field::URL_SUCCESS);
        request.url_fail = get(field::URL_FAIL);
        request.payer_email = get(field::PAYER_EMAIL);
        request.payer_phone = get(field::PAYER_PHONE);
        request.region = get(field::REGION);
        request.origin_ip = origin_ip.into();

        for (key, value) in params {
            if field::ALL.contains(&key.as_str()) {
                continue;
            }
            if REQUISITE_KEYS.contains(&key.as_str()) {
                request.requisites.insert(key.clone(), value.clone());
            } else {
                request.other.insert(key.clone(), value.clone());
            }
        }
        request.raw_params = params
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(request)
    }

    /// Verify or notify URL supplied with the request
    pub fn has_dynamic_notify_urls(&self) -> bool {
        self.url_verify.is_some() || self.url_notify.is_some()
    }

    /// Success or fail URL supplied with the request
    pub fn has_dynamic_redirect_urls(&self) -> bool {
        self.url_success.is_some() || self.url_fail.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_params() {
        let project_id = Uuid::new_v4();
        let project = project_id.to_string();
        let request = OrderRequest::from_params(
            &params(&[
                (field::PROJECT_ID, project.as_str()),
                (field::AMOUNT, "15.00"),
                (field::CURRENCY, "USD"),
                (field::ACCOUNT, "player-42"),
                (field::ORDER_ID, "ext-1"),
                (field::URL_SUCCESS, ""),
                (requisite::PAN, "4111111111111111"),
                ("game_server", "eu-3"),
            ]),
            "203.0.113.7",
        )
        .unwrap();

        assert_eq!(request.project_id, project_id);
        assert_eq!(request.amount, Decimal::new(1500, 2));
        assert_eq!(request.currency.as_deref(), Some("USD"));
        assert_eq!(request.project_order_id.as_deref(), Some("ext-1"));
        assert_eq!(request.url_success, None);
        assert!(!request.has_dynamic_redirect_urls());
        assert_eq!(request.origin_ip, "203.0.113.7");
        assert_eq!(request.requisites.get(requisite::PAN).map(String::as_str), Some("4111111111111111"));
        assert_eq!(request.other.get("game_server").map(String::as_str), Some("eu-3"));
        assert!(!request.other.contains_key(field::AMOUNT));
        assert_eq!(request.raw_params.len(), 8);
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let project = Uuid::new_v4().to_string();

        let missing = OrderRequest::from_params(
            &params(&[(field::PROJECT_ID, project.as_str()), (field::AMOUNT, "10")]),
            "",
        );
        assert_eq!(
            missing,
            Err(AdmissionError::MissingField {
                field: field::ACCOUNT
            })
        );

        for amount in ["ten", "-5", "0"] {
            let invalid = OrderRequest::from_params(
                &params(&[
                    (field::PROJECT_ID, project.as_str()),
                    (field::AMOUNT, amount),
                    (field::ACCOUNT, "a"),
                ]),
                "",
            );
            assert_eq!(
                invalid,
                Err(AdmissionError::InvalidField {
                    field: field::AMOUNT
                })
            );
        }

        let bad_project = OrderRequest::from_params(
            &params(&[(field::PROJECT_ID, "5b1f"), (field::AMOUNT, "1"), (field::ACCOUNT, "a")]),
            "",
        );
        assert!(matches!(bad_project, Err(AdmissionError::InvalidField { .. })));
    }
}
