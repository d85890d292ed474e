//! Order creation

use crate::error::{AdmissionError, AdmissionResult};
use crate::request::OrderRequest;
use crate::validator::{Admission, OrderValidator};
use paygate_config::GatewaySettings;
use paygate_core::{Clock, GeoLookup, Money, Order, OrderUrls, PayerData, Repository};
use std::net::IpAddr;
use std::sync::Arc;

/// Admits order requests and stores the resulting orders
pub struct OrderProcessor {
    validator: OrderValidator,
    repository: Arc<dyn Repository>,
    geo: Arc<dyn GeoLookup>,
    clock: Arc<dyn Clock>,
}

impl OrderProcessor {
    pub fn new(
        repository: Arc<dyn Repository>,
        geo: Arc<dyn GeoLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            validator: OrderValidator::new(repository.clone(), geo.clone()),
            repository,
            geo,
            clock,
        }
    }

    pub fn with_settings(mut self, settings: &GatewaySettings) -> Self {
        self.validator = self.validator.with_settings(settings);
        self
    }

    pub fn validator(&self) -> &OrderValidator {
        &self.validator
    }

    /// Validate a request and insert the new order
    pub async fn process(&self, request: &OrderRequest) -> AdmissionResult<Order> {
        let admission = self.validator.validate(request).await?;
        let order = self.build_order(request, admission);

        if let Err(e) = self.repository.insert_order(&order).await {
            tracing::error!(order_id = %order.id, stage = "insert", error = %e, "Order insert failed");
            return Err(AdmissionError::OrderCanNotCreate);
        }

        tracing::info!(
            order_id = %order.id,
            project_id = %order.project_id,
            amount = %order.project_income,
            "Order created"
        );
        Ok(order)
    }

    fn build_order(&self, request: &OrderRequest, admission: Admission) -> Order {
        let amount = Money::new(request.amount, admission.currency);
        let mut order = Order::new(
            admission.project.id,
            request.account.clone(),
            amount,
            self.clock.now(),
        );

        order.project_order_id = request.project_order_id.clone();
        if let Some(description) = &request.description {
            order.description = description.clone();
        }
        order.project_params = request.other.clone();
        order.payment_requisites = request.requisites.clone();
        order.urls = OrderUrls {
            verify: request.url_verify.clone(),
            notify: request.url_notify.clone(),
            success: request.url_success.clone(),
            fail: request.url_fail.clone(),
        };
        order.payer = PayerData {
            ip: request.origin_ip.clone(),
            country: admission
                .region
                .or_else(|| self.resolve_country(&request.origin_ip))
                .or_else(|| request.region.clone()),
            email: request.payer_email.clone(),
            phone: request.payer_phone.clone(),
        };
        order.fixed_package = admission.fixed_package;

        if let Some(method) = admission.payment_method {
            order.payment_method = Some(method);
            order.payment_method_outcome = Some(amount);
        }

        order
    }

    fn resolve_country(&self, ip: &str) -> Option<String> {
        ip.parse::<IpAddr>()
            .ok()
            .and_then(|ip| self.geo.resolve_country(ip))
    }
}

impl std::fmt::Debug for OrderProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderProcessor")
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}
