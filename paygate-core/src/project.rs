//! Merchant projects and their fixed-price catalogue

use crate::money::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Payment method attached to a project under a group alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPaymentMethod {
    /// Payment method identifier
    pub id: Uuid,
    pub enabled: bool,
    pub added_at: DateTime<Utc>,
}

/// Pre-priced product bundle for a payer region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPackage {
    pub id: Uuid,
    pub name: String,
    pub region: String,
    pub price: Decimal,
    pub currency: Currency,
    pub is_active: bool,
}

impl FixedPackage {
    /// Active and priced exactly at `amount` in `currency`
    pub fn matches(&self, amount: Decimal, currency: Currency) -> bool {
        self.is_active && self.price == amount && self.currency == currency
    }
}

/// Merchant project accepting payments through the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    /// Shared secret used to sign order requests
    pub secret_key: String,
    /// Allowed payment methods keyed by group alias; several historical entries per alias
    pub payment_methods: HashMap<String, Vec<ProjectPaymentMethod>>,
    /// Fixed packages keyed by region code
    pub fixed_packages: HashMap<String, Vec<FixedPackage>>,
    pub only_fixed_amounts: bool,
    pub allow_dynamic_notify_urls: bool,
    pub allow_dynamic_redirect_urls: bool,
    pub min_payment_amount: Option<Decimal>,
    pub max_payment_amount: Option<Decimal>,
}

impl Project {
    /// Newest enabled payment method registered under `alias`
    pub fn payment_method_for_alias(&self, alias: &str) -> Option<&ProjectPaymentMethod> {
        self.payment_methods
            .get(alias)?
            .iter()
            .filter(|entry| entry.enabled)
            .max_by_key(|entry| entry.added_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Test project".into(),
            is_active: true,
            secret_key: "secret".into(),
            payment_methods: HashMap::new(),
            fixed_packages: HashMap::new(),
            only_fixed_amounts: false,
            allow_dynamic_notify_urls: false,
            allow_dynamic_redirect_urls: false,
            min_payment_amount: None,
            max_payment_amount: None,
        }
    }

    #[test]
    fn test_newest_enabled_alias_wins() {
        let now = Utc::now();
        let old = Uuid::new_v4();
        let newest = Uuid::new_v4();
        let disabled = Uuid::new_v4();

        let mut project = project();
        project.payment_methods.insert(
            "bank_card".into(),
            vec![
                ProjectPaymentMethod {
                    id: old,
                    enabled: true,
                    added_at: now - Duration::days(10),
                },
                ProjectPaymentMethod {
                    id: newest,
                    enabled: true,
                    added_at: now - Duration::days(1),
                },
                ProjectPaymentMethod {
                    id: disabled,
                    enabled: false,
                    added_at: now,
                },
            ],
        );

        let resolved = project.payment_method_for_alias("bank_card").unwrap();
        assert_eq!(resolved.id, newest);
        assert!(project.payment_method_for_alias("qiwi").is_none());
    }

    #[test]
    fn test_fixed_package_matches() {
        let package = FixedPackage {
            id: Uuid::new_v4(),
            name: "100 gems".into(),
            region: "US".into(),
            price: Decimal::new(1500, 2),
            currency: Currency::USD,
            is_active: true,
        };

        assert!(package.matches(Decimal::new(15, 0), Currency::USD));
        assert!(!package.matches(Decimal::new(15, 0), Currency::EUR));

        let inactive = FixedPackage {
            is_active: false,
            ..package
        };
        assert!(!inactive.matches(Decimal::new(15, 0), Currency::USD));
    }
}
