//! Payment creation at CardPay

use crate::auth::{GatewayAuthClient, TerminalCredentials};
use crate::builder::{BuilderRegistry, PaymentAccepted};
use crate::error::{BuildError, GatewayError, GatewayResult};
use crate::token::TokenStore;
use crate::transport::{ProviderAction, Transport};
use paygate_config::GatewaySettings;
use paygate_core::{Clock, Order};
use std::fmt;
use std::sync::Arc;

/// Submits payment requests for admitted orders
pub struct GatewayPaymentClient {
    auth: GatewayAuthClient,
    transport: Arc<Transport>,
    builders: BuilderRegistry,
    clock: Arc<dyn Clock>,
    settings: Arc<GatewaySettings>,
}

impl GatewayPaymentClient {
    /// Create a client with the default transport and builders
    pub fn new(
        settings: Arc<GatewaySettings>,
        tokens: Arc<TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> GatewayResult<Self> {
        let transport = Arc::new(Transport::from_settings(&settings)?);
        Ok(Self {
            auth: GatewayAuthClient::new(transport.clone(), tokens, clock.clone()),
            transport,
            builders: BuilderRegistry::default(),
            clock,
            settings,
        })
    }

    /// Replace the transport used for both token and payment requests
    pub fn with_transport(mut self, transport: Arc<Transport>) -> Self {
        let tokens = self.auth.store().clone();
        self.auth = GatewayAuthClient::new(transport.clone(), tokens, self.clock.clone());
        self.transport = transport;
        self
    }

    pub fn with_builders(mut self, builders: BuilderRegistry) -> Self {
        self.builders = builders;
        self
    }

    pub fn auth(&self) -> &GatewayAuthClient {
        &self.auth
    }

    /// Create the payment for an order.
    ///
    /// The payload is built before any token is requested, so an order with
    /// bad requisites never reaches the provider. The order itself is left
    /// untouched; callers record the outcome.
    pub async fn create_payment(&self, order: &Order) -> GatewayResult<PaymentAccepted> {
        let payload = self.builders.build(order, self.clock.now()).map_err(|e| {
            tracing::warn!(order_id = %order.id, stage = "build", error = %e, "Payment request not built");
            GatewayError::Validation(e)
        })?;

        let method = order
            .payment_method
            .as_ref()
            .ok_or(GatewayError::Validation(BuildError::MissingPaymentMethod))?;
        let credentials = TerminalCredentials::for_method(method, &self.settings.cardpay)?;

        let token = self
            .auth
            .get_valid_token(&method.params.external_id, &credentials)
            .await
            .inspect_err(|e| {
                tracing::warn!(order_id = %order.id, stage = "auth", error = %e, "Token not obtained");
            })?;

        let response = self
            .transport
            .post_json(
                ProviderAction::CreatePayment,
                &credentials.base_url,
                &payload,
                &token.authorization(),
            )
            .await
            .inspect_err(|e| {
                tracing::warn!(order_id = %order.id, stage = "create_payment", error = %e, "Payment request failed");
            })?;

        if !response.is_ok() {
            tracing::warn!(
                order_id = %order.id,
                stage = "create_payment",
                status = response.status,
                "Payment rejected by provider"
            );
            return Err(GatewayError::GatewayRequestFailed(format!(
                "provider answered with status {}",
                response.status
            )));
        }

        let accepted: PaymentAccepted = serde_json::from_str(&response.body)?;
        tracing::info!(order_id = %order.id, "Payment created");
        Ok(accepted)
    }
}

impl fmt::Debug for GatewayPaymentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayPaymentClient")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
