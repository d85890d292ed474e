//! Applies CardPay callbacks to orders.
//!
//! Each external code has its own callback key. Only the `payment_method`
//! field is read to pick it; the signature is then checked over the raw body
//! before the callback is decoded or its order looked up. Outcomes distinguish callbacks whose order could not be located
//! from callbacks whose order was located but could not be updated; the
//! webhook answers the former with 400 and the latter with 200.

use crate::error::{NotificationError, NotificationResult};
use crate::notification::CardPayNotification;
use crate::signature::verify_notification;
use paygate_config::CardPaySettings;
use paygate_core::{Clock, Currency, Money, Order, OrderStatus, Repository};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub const PAYMENT_COMPLETE_MESSAGE: &str = "Payment successfully complete";
pub const STATUS_SKIPPED_MESSAGE: &str = "notification with intermediate status skipped";

/// Result of handling one callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Callback accepted; the order was updated or already reflected it
    Applied { order_id: Uuid, message: String },

    /// Signature missing or wrong; nothing was read
    Rejected { error: NotificationError },

    /// Callback could not be applied
    ApplicationFailed {
        order_found: bool,
        order_id: Option<Uuid>,
        error: NotificationError,
    },
}

impl NotificationOutcome {
    /// HTTP status the provider should receive
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Applied { .. } => 200,
            Self::ApplicationFailed {
                order_found: true, ..
            } => 200,
            Self::Rejected { .. } | Self::ApplicationFailed { .. } => 400,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Applied { message, .. } => message.clone(),
            Self::Rejected { error } | Self::ApplicationFailed { error, .. } => error.to_string(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    fn not_found(order_id: Option<Uuid>, error: NotificationError) -> Self {
        Self::ApplicationFailed {
            order_found: false,
            order_id,
            error,
        }
    }
}

struct CallbackTerminal {
    terminal_id: String,
    callback_secret: SecretString,
}

#[derive(Deserialize)]
struct SignedMethod {
    payment_method: String,
}

/// Verifies, decodes and applies provider callbacks
pub struct NotificationProcessor {
    repository: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    terminals: HashMap<String, CallbackTerminal>,
}

impl NotificationProcessor {
    /// Create a processor with no terminals; every callback is rejected until one is added
    pub fn new(repository: Arc<dyn Repository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            terminals: HashMap::new(),
        }
    }

    pub fn from_settings(
        repository: Arc<dyn Repository>,
        clock: Arc<dyn Clock>,
        settings: &CardPaySettings,
    ) -> Self {
        settings
            .terminals()
            .fold(Self::new(repository, clock), |processor, (code, terminal)| {
                processor.with_terminal(
                    code,
                    terminal.terminal_id.as_str(),
                    terminal.callback_secret_word.expose_secret(),
                )
            })
    }

    /// Accept callbacks for `code`, signed with `callback_secret` and recorded under `terminal_id`
    pub fn with_terminal(
        mut self,
        code: impl Into<String>,
        terminal_id: impl Into<String>,
        callback_secret: impl Into<String>,
    ) -> Self {
        self.terminals.insert(
            code.into(),
            CallbackTerminal {
                terminal_id: terminal_id.into(),
                callback_secret: SecretString::new(callback_secret.into().into()),
            },
        );
        self
    }

    fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(signed) = serde_json::from_slice::<SignedMethod>(body) else {
            return false;
        };
        self.terminals
            .get(&signed.payment_method)
            .filter(|terminal| !terminal.callback_secret.expose_secret().is_empty())
            .is_some_and(|terminal| {
                verify_notification(body, signature, terminal.callback_secret.expose_secret())
            })
    }

    /// Handle one callback
    pub async fn handle(&self, body: &[u8], signature: Option<&str>) -> NotificationOutcome {
        let verified = signature.is_some_and(|s| self.verify(body, s));
        if !verified {
            tracing::warn!(has_signature = signature.is_some(), "Rejected callback with invalid signature");
            return NotificationOutcome::Rejected {
                error: NotificationError::SignatureInvalid,
            };
        }

        let notification = match CardPayNotification::parse(body) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed callback body");
                return NotificationOutcome::not_found(None, e);
            }
        };

        let order_id = match notification.order_id() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Callback without a valid order id");
                return NotificationOutcome::not_found(None, e);
            }
        };

        let order = match self.repository.find_order_by_id(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::warn!(order_id = %order_id, "Callback for unknown order");
                return NotificationOutcome::not_found(Some(order_id), NotificationError::OrderNotFound);
            }
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Order lookup failed");
                return NotificationOutcome::not_found(Some(order_id), NotificationError::OrderNotFound);
            }
        };

        match self.apply(order, &notification).await {
            Ok(message) => {
                tracing::info!(order_id = %order_id, status = %notification.payment_data.status, "Callback applied");
                NotificationOutcome::Applied { order_id, message }
            }
            Err(error) => {
                tracing::warn!(order_id = %order_id, error = %error, "Callback not applied");
                NotificationOutcome::ApplicationFailed {
                    order_found: true,
                    order_id: Some(order_id),
                    error,
                }
            }
        }
    }

    async fn apply(&self, mut order: Order, notification: &CardPayNotification) -> NotificationResult<String> {
        let closed_at = notification.callback_time()?;

        let method = order
            .payment_method
            .as_ref()
            .ok_or(NotificationError::PaymentMethodMismatch)?;
        let instrument = notification
            .instrument()
            .filter(|instrument| *instrument == method.instrument)
            .ok_or(NotificationError::PaymentMethodMismatch)?;
        if notification.payment_method != method.params.external_id {
            return Err(NotificationError::PaymentMethodMismatch);
        }
        let terminal = self
            .terminals
            .get(&notification.payment_method)
            .map(|terminal| terminal.terminal_id.clone())
            .unwrap_or_default();

        let Some(target) = notification.status().order_status() else {
            return Ok(STATUS_SKIPPED_MESSAGE.to_string());
        };

        if order.status.is_terminal() {
            return if order.status == target || (target.is_complete() && order.status.is_complete()) {
                Ok(already_applied_message(order.status).to_string())
            } else {
                Err(NotificationError::StatusConflict)
            };
        }
        if order.status == OrderStatus::PaymentSystemRejectOnCreate {
            return Err(NotificationError::OrderRejectedOnCreate);
        }
        if !order.status.accepts_notification() {
            return Err(NotificationError::StatusConflict);
        }

        let data = &notification.payment_data;
        let currency = Currency::from_code(&data.currency).ok_or(NotificationError::UnknownCurrency)?;

        order.payment_method_payer_account = notification.payer_account(instrument);
        order.payment_method_txn_params = notification.txn_params(instrument);
        order.payment_method_terminal_id = Some(terminal).filter(|t| !t.is_empty());
        order.payment_method_order_id = Some(data.id.clone());
        order.payment_method_order_closed_at = Some(closed_at);
        order.payment_method_income = Some(Money::new(data.amount, currency));
        order.status = target;
        order.updated_at = self.clock.now();

        self.repository.update_order(&order).await?;

        Ok(PAYMENT_COMPLETE_MESSAGE.to_string())
    }
}

fn already_applied_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::PaymentSystemDeclined => "payment system decline order with specified identifier early",
        OrderStatus::PaymentSystemCanceled => "payment system cancel order with specified identifier early",
        _ => "order with specified identifier payed early",
    }
}

impl fmt::Debug for NotificationProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationProcessor")
            .field("terminals", &self.terminals.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::card_order;
    use crate::notification::tests::body;
    use crate::signature::notification_signature;
    use paygate_config::TerminalSettings;
    use paygate_core::{InMemoryRepository, ManualClock, txn_param};
    use rust_decimal::Decimal;

    const SECRET: &str = "callback-secret";
    const WALLET_SECRET: &str = "wallet-callback-secret";

    struct Fixture {
        repository: Arc<InMemoryRepository>,
        processor: NotificationProcessor,
        order: Order,
    }

    async fn fixture(status: OrderStatus) -> Fixture {
        let repository = Arc::new(InMemoryRepository::new());
        let mut order = card_order();
        order.status = status;
        repository.add_order(order.clone()).await;

        let processor =
            NotificationProcessor::new(repository.clone(), Arc::new(ManualClock::default()))
                .with_terminal("BANKCARD", "1000", SECRET)
                .with_terminal("QIWI", "2000", WALLET_SECRET);

        Fixture {
            repository,
            processor,
            order,
        }
    }

    fn signed(value: &serde_json::Value) -> (Vec<u8>, String) {
        signed_with(value, SECRET)
    }

    fn signed_with(value: &serde_json::Value, secret: &str) -> (Vec<u8>, String) {
        let raw = serde_json::to_vec(value).unwrap();
        let signature = notification_signature(&raw, secret);
        (raw, signature)
    }

    #[tokio::test]
    async fn test_tampered_signature_is_rejected_without_lookup() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        let (raw, signature) = signed(&body(f.order.id, "COMPLETED"));
        let mut tampered = raw.clone();
        tampered.push(b' ');

        let outcome = f.processor.handle(&tampered, Some(&signature)).await;
        assert_eq!(
            outcome,
            NotificationOutcome::Rejected {
                error: NotificationError::SignatureInvalid
            }
        );
        assert_eq!(outcome.http_status(), 400);

        let outcome = f.processor.handle(&raw, None).await;
        assert!(matches!(outcome, NotificationOutcome::Rejected { .. }));

        assert_eq!(f.repository.order_lookups(), 0);
        assert_eq!(f.repository.order_updates(), 0);
    }

    #[tokio::test]
    async fn test_completed_callback_applies_once() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        let (raw, signature) = signed(&body(f.order.id, "COMPLETED"));

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(
            outcome,
            NotificationOutcome::Applied {
                order_id: f.order.id,
                message: PAYMENT_COMPLETE_MESSAGE.into()
            }
        );
        assert_eq!(outcome.http_status(), 200);

        let stored = f.repository.order(f.order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::PaymentSystemComplete);
        assert_eq!(stored.payment_method_order_id.as_deref(), Some("cp-9001"));
        assert_eq!(stored.payment_method_payer_account.as_deref(), Some("411111...1111"));
        assert_eq!(stored.payment_method_terminal_id.as_deref(), Some("1000"));
        assert_eq!(
            stored.payment_method_income,
            Some(Money::new(Decimal::new(15, 0), Currency::USD))
        );
        assert_eq!(
            stored.payment_method_txn_params.get(txn_param::RRN).map(String::as_str),
            Some("000111222")
        );
        assert!(stored.payment_method_order_closed_at.is_some());
        assert_eq!(f.repository.order_updates(), 1);

        let repeat = f.processor.handle(&raw, Some(&signature)).await;
        assert!(repeat.is_applied());
        assert_eq!(repeat.message(), "order with specified identifier payed early");
        assert_eq!(f.repository.order_updates(), 1);
    }

    #[tokio::test]
    async fn test_created_order_accepts_callback() {
        let f = fixture(OrderStatus::Created).await;
        let (raw, signature) = signed(&body(f.order.id, "DECLINED"));

        assert!(f.processor.handle(&raw, Some(&signature)).await.is_applied());
        let stored = f.repository.order(f.order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::PaymentSystemDeclined);
    }

    #[tokio::test]
    async fn test_intermediate_status_leaves_order_untouched() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        let (raw, signature) = signed(&body(f.order.id, "PENDING"));

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(outcome.message(), STATUS_SKIPPED_MESSAGE);
        assert_eq!(f.repository.order_updates(), 0);
    }

    #[tokio::test]
    async fn test_unknown_order_is_hard_failure() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        let missing = Uuid::new_v4();
        let (raw, signature) = signed(&body(missing, "COMPLETED"));

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(
            outcome,
            NotificationOutcome::ApplicationFailed {
                order_found: false,
                order_id: Some(missing),
                error: NotificationError::OrderNotFound
            }
        );
        assert_eq!(outcome.http_status(), 400);
    }

    #[tokio::test]
    async fn test_lookup_error_is_treated_as_not_found() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        f.repository.set_fail_queries(true);
        let (raw, signature) = signed(&body(f.order.id, "COMPLETED"));

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(outcome.http_status(), 400);
        assert!(matches!(
            outcome,
            NotificationOutcome::ApplicationFailed {
                order_found: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_update_failure_is_soft_failure() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        f.repository.set_fail_updates(true);
        let (raw, signature) = signed(&body(f.order.id, "COMPLETED"));

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(outcome.http_status(), 200);
        assert!(matches!(
            outcome,
            NotificationOutcome::ApplicationFailed {
                order_found: true,
                error: NotificationError::Persistence(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_payment_method_mismatch() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        let mut value = body(f.order.id, "COMPLETED");
        value["payment_method"] = "QIWI".into();
        let (raw, signature) = signed_with(&value, WALLET_SECRET);

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(outcome.message(), "payment method from request not equal value in order");
        assert_eq!(outcome.http_status(), 200);
        assert_eq!(f.repository.order_updates(), 0);
    }

    #[tokio::test]
    async fn test_reject_on_create_is_refused() {
        let f = fixture(OrderStatus::PaymentSystemRejectOnCreate).await;
        let (raw, signature) = signed(&body(f.order.id, "COMPLETED"));

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(outcome.message(), "order can't create. try request later");
        assert_eq!(f.repository.order_updates(), 0);
    }

    #[tokio::test]
    async fn test_conflicting_terminal_status() {
        let f = fixture(OrderStatus::PaymentSystemDeclined).await;
        let (raw, signature) = signed(&body(f.order.id, "COMPLETED"));

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert!(matches!(
            outcome,
            NotificationOutcome::ApplicationFailed {
                error: NotificationError::StatusConflict,
                ..
            }
        ));

        let (raw, signature) = signed(&body(f.order.id, "DECLINED"));
        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(
            outcome.message(),
            "payment system decline order with specified identifier early"
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;
        let raw = b"not json".to_vec();
        let signature = notification_signature(&raw, SECRET);

        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert!(matches!(outcome, NotificationOutcome::Rejected { .. }));
        assert_eq!(outcome.http_status(), 400);
        assert_eq!(f.repository.order_lookups(), 0);
    }

    #[tokio::test]
    async fn test_callback_key_follows_payment_method() {
        let f = fixture(OrderStatus::PaymentSystemCreate).await;

        // BANKCARD callback signed with the QIWI terminal's key
        let (raw, signature) = signed_with(&body(f.order.id, "COMPLETED"), WALLET_SECRET);
        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert_eq!(
            outcome,
            NotificationOutcome::Rejected {
                error: NotificationError::SignatureInvalid
            }
        );

        let mut value = body(f.order.id, "COMPLETED");
        value["payment_method"] = "PAYPAL".into();
        let (raw, signature) = signed(&value);
        let outcome = f.processor.handle(&raw, Some(&signature)).await;
        assert!(matches!(outcome, NotificationOutcome::Rejected { .. }));

        assert_eq!(f.repository.order_lookups(), 0);
        assert_eq!(f.repository.order_updates(), 0);
    }

    #[tokio::test]
    async fn test_from_settings_records_code_terminal() {
        let repository = Arc::new(InMemoryRepository::new());
        let mut order = card_order();
        order.status = OrderStatus::PaymentSystemCreate;
        repository.add_order(order.clone()).await;

        let settings = CardPaySettings::default()
            .with_terminal("BANKCARD", TerminalSettings::new("1000", "pw", SECRET))
            .with_terminal("QIWI", TerminalSettings::new("2000", "pw", WALLET_SECRET));
        let processor = NotificationProcessor::from_settings(
            repository.clone(),
            Arc::new(ManualClock::default()),
            &settings,
        );

        let (raw, signature) = signed(&body(order.id, "COMPLETED"));
        assert!(processor.handle(&raw, Some(&signature)).await.is_applied());
        let stored = repository.order(order.id).await.unwrap();
        assert_eq!(stored.payment_method_terminal_id.as_deref(), Some("1000"));
    }
}
