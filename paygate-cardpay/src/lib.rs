//! CardPay integration for the paygate billing gateway
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     GatewayPaymentClient                     │
//! │  BuilderRegistry ──▶ GatewayAuthClient ──▶ POST /api/payments │
//! │   (card, wallet,      (TokenStore, per                       │
//! │    crypto)             key exchange lock)                    │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//!                      Transport + AuditSink
//!                                │
//! ┌──────────────────────────────────────────────────────────────┐
//! │  POST /cardpay/notify ──▶ NotificationEndpoint               │
//! │      Signature header      └▶ NotificationProcessor          │
//! │                                 └▶ Repository::update_order  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paygate_cardpay::{GatewayPaymentClient, NotificationEndpoint, NotificationProcessor, TokenStore};
//!
//! let client = GatewayPaymentClient::new(settings.clone(), Arc::new(TokenStore::new()), clock.clone())?;
//! let accepted = client.create_payment(&order).await?;
//! println!("redirect payer to {}", accepted.redirect_url);
//!
//! let processor = NotificationProcessor::from_settings(repository, clock, &settings.cardpay);
//! let endpoint = NotificationEndpoint::new(Arc::new(processor));
//! let response = endpoint.handle(request).await;
//! ```

pub mod auth;
pub mod builder;
pub mod client;
pub mod error;
pub mod notification;
pub mod processor;
pub mod signature;
pub mod token;
pub mod transport;
pub mod webhook;

pub use auth::{GatewayAuthClient, TerminalCredentials};
pub use builder::{
    BankCardBuilder, BuildContext, BuildResult, BuilderRegistry, CARDPAY_TIME_FORMAT,
    CryptoBuilder, EWalletBuilder, PaymentAccepted, PaymentRequestBuilder, ProviderPayload,
};
pub use client::GatewayPaymentClient;
pub use error::*;
pub use notification::{CardPayNotification, ProviderStatus};
pub use processor::{NotificationOutcome, NotificationProcessor, PAYMENT_COMPLETE_MESSAGE};
pub use signature::{notification_signature, verify_notification};
pub use token::{Token, TokenStore};
pub use transport::{
    AuditSink, HttpExchange, ProviderAction, RawResponse, TracingAuditSink, Transport,
    TransportConfig,
};
pub use webhook::{NOTIFY_PATH, NotificationEndpoint, SIGNATURE_HEADER, WebhookResponse};
