//! Admission pipeline for order requests
//!
//! Checks run in a fixed order and stop at the first failure: project,
//! currency and request signature, payment method, fixed package, amount
//! limits, duplicate project order id, then dynamic notify and redirect
//! URLs. Nothing is written. Repository errors are logged and the record is
//! treated as missing.

use crate::error::{AdmissionError, AdmissionResult};
use crate::request::OrderRequest;
use crate::signature::verify_request;
use paygate_config::GatewaySettings;
use paygate_core::{
    Currency, FixedPackage, FixedPackageFilter, GeoLookup, OrderFixedPackage, OrderPaymentMethod,
    PaymentMethod, Project, Repository, RepositoryResult,
};
use rust_decimal::Decimal;
use std::net::IpAddr;
use std::sync::Arc;

/// Everything an admitted request resolved to
#[derive(Debug, Clone)]
pub struct Admission {
    pub project: Project,
    /// Order currency, taken from the fixed package when the request had none
    pub currency: Currency,
    pub payment_method: Option<OrderPaymentMethod>,
    pub fixed_package: Option<OrderFixedPackage>,
    /// Payer region used for fixed-package matching
    pub region: Option<String>,
}

/// Runs admission checks against the repository and geolocation
pub struct OrderValidator {
    repository: Arc<dyn Repository>,
    geo: Arc<dyn GeoLookup>,
    signature_required: bool,
}

impl OrderValidator {
    pub fn new(repository: Arc<dyn Repository>, geo: Arc<dyn GeoLookup>) -> Self {
        Self {
            repository,
            geo,
            signature_required: false,
        }
    }

    /// Reject unsigned requests
    pub fn require_signature(mut self, required: bool) -> Self {
        self.signature_required = required;
        self
    }

    pub fn with_settings(self, settings: &GatewaySettings) -> Self {
        self.require_signature(settings.order_signature_required)
    }

    /// Admit or reject an order request
    pub async fn validate(&self, request: &OrderRequest) -> AdmissionResult<Admission> {
        let result = self.run(request).await;
        if let Err(e) = &result {
            tracing::info!(
                project_id = %request.project_id,
                project_order_id = request.project_order_id.as_deref().unwrap_or_default(),
                stage = e.stage(),
                error = %e,
                "Order request rejected"
            );
        }
        result
    }

    async fn run(&self, request: &OrderRequest) -> AdmissionResult<Admission> {
        let project = found(
            self.repository.find_project_by_id(request.project_id).await,
            "project",
        )
        .ok_or(AdmissionError::ProjectNotFound)?;

        if !project.is_active {
            return Err(AdmissionError::ProjectInactive);
        }

        let requested_currency = match &request.currency {
            Some(code) => Some(Currency::from_code(code).ok_or(AdmissionError::CurrencyNotFound)?),
            None => None,
        };

        self.check_signature(request, &project)?;

        let method = match &request.payment_method {
            Some(alias) => Some(self.resolve_payment_method(&project, alias).await?),
            None => None,
        };

        let (fixed_package, region) = if project.only_fixed_amounts {
            let region = self.payer_region(request)?;
            let package = self
                .match_fixed_package(&project, &region, request.amount, requested_currency)
                .await?;
            (Some(package), Some(region))
        } else {
            (None, None)
        };

        let currency = requested_currency
            .or(fixed_package.as_ref().map(|package| package.currency))
            .ok_or(AdmissionError::CurrencyNotFound)?;

        check_limits(
            request.amount,
            project.min_payment_amount,
            project.max_payment_amount,
            AdmissionError::AmountLowerThanMinAllowed,
            AdmissionError::AmountGreaterThanMaxAllowed,
        )?;

        if let Some((method, _)) = &method {
            check_limits(
                request.amount,
                method.min_payment_amount,
                method.max_payment_amount,
                AdmissionError::AmountLowerThanMinAllowedPaymentMethod,
                AdmissionError::AmountGreaterThanMaxAllowedPaymentMethod,
            )?;
            if !method.accepts_currency(currency) {
                return Err(AdmissionError::PaymentMethodCurrencyNotAllowed);
            }
        }

        if let Some(project_order_id) = &request.project_order_id {
            let existing = found(
                self.repository
                    .find_order_by_project_order_id(project.id, project_order_id)
                    .await,
                "order",
            );
            if existing.is_some() {
                return Err(AdmissionError::DuplicateProjectOrderId);
            }
        }

        if request.has_dynamic_notify_urls() && !project.allow_dynamic_notify_urls {
            return Err(AdmissionError::DynamicNotifyUrlsNotAllowed);
        }

        if request.has_dynamic_redirect_urls() && !project.allow_dynamic_redirect_urls {
            return Err(AdmissionError::DynamicRedirectUrlsNotAllowed);
        }

        Ok(Admission {
            project,
            currency,
            payment_method: method.map(|(_, snapshot)| snapshot),
            fixed_package,
            region,
        })
    }

    fn check_signature(&self, request: &OrderRequest, project: &Project) -> AdmissionResult<()> {
        match &request.signature {
            Some(signature) => {
                if verify_request(&request.raw_params, signature, &project.secret_key) {
                    Ok(())
                } else {
                    Err(AdmissionError::SignatureInvalid)
                }
            }
            None if self.signature_required => Err(AdmissionError::SignatureInvalid),
            None => Ok(()),
        }
    }

    async fn resolve_payment_method(
        &self,
        project: &Project,
        alias: &str,
    ) -> AdmissionResult<(PaymentMethod, OrderPaymentMethod)> {
        let entry = project
            .payment_method_for_alias(alias)
            .ok_or(AdmissionError::PaymentMethodNotAllowed)?;

        let method = found(
            self.repository.find_payment_method_by_id(entry.id).await,
            "payment_method",
        )
        .ok_or(AdmissionError::PaymentMethodNotFound)?;

        if !method.is_active {
            return Err(AdmissionError::PaymentMethodInactive);
        }

        let system = found(
            self.repository
                .find_payment_system_by_id(method.payment_system_id)
                .await,
            "payment_system",
        )
        .ok_or(AdmissionError::PaymentSystemNotFound)?;

        if !system.is_active {
            return Err(AdmissionError::PaymentSystemInactive);
        }

        let snapshot = OrderPaymentMethod::snapshot(&method, &system);
        Ok((method, snapshot))
    }

    /// Explicit region first, geolocation of the origin address otherwise
    fn payer_region(&self, request: &OrderRequest) -> AdmissionResult<String> {
        if let Some(region) = request.region.as_deref().filter(|r| !r.is_empty()) {
            return Ok(region.to_string());
        }

        request
            .origin_ip
            .parse::<IpAddr>()
            .ok()
            .and_then(|ip| self.geo.resolve_country(ip))
            .filter(|country| !country.is_empty())
            .ok_or(AdmissionError::PayerRegionUnknown)
    }

    async fn match_fixed_package(
        &self,
        project: &Project,
        region: &str,
        amount: Decimal,
        currency: Option<Currency>,
    ) -> AdmissionResult<OrderFixedPackage> {
        let filter = FixedPackageFilter {
            project_id: project.id,
            region: region.to_string(),
        };
        let packages = self
            .repository
            .find_fixed_packages(&filter)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(project_id = %project.id, region, error = %e, "Fixed package lookup failed");
                Vec::new()
            });

        if packages.is_empty() {
            return Err(AdmissionError::FixedPackageForRegionNotFound);
        }

        // when several packages match, the last one in catalogue order is used
        let package = packages
            .iter()
            .filter(|package| package_matches(package, amount, currency))
            .next_back()
            .ok_or(AdmissionError::FixedPackageNotFound)?;

        Ok(OrderFixedPackage {
            id: package.id,
            name: package.name.clone(),
            region: region.to_string(),
            price: package.price,
            currency: package.currency,
        })
    }
}

impl std::fmt::Debug for OrderValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderValidator")
            .field("signature_required", &self.signature_required)
            .finish_non_exhaustive()
    }
}

fn package_matches(package: &FixedPackage, amount: Decimal, currency: Option<Currency>) -> bool {
    match currency {
        Some(currency) => package.matches(amount, currency),
        None => package.is_active && package.price == amount,
    }
}

fn check_limits(
    amount: Decimal,
    min: Option<Decimal>,
    max: Option<Decimal>,
    below: AdmissionError,
    above: AdmissionError,
) -> AdmissionResult<()> {
    if min.is_some_and(|min| amount < min) {
        return Err(below);
    }
    if max.is_some_and(|max| amount > max) {
        return Err(above);
    }
    Ok(())
}

fn found<T>(result: RepositoryResult<Option<T>>, lookup: &'static str) -> Option<T> {
    result.unwrap_or_else(|e| {
        tracing::error!(lookup, error = %e, "Lookup failed, treating record as missing");
        None
    })
}
