//! Provider payload construction.
//!
//! The common envelope is shared by every instrument; the instrument block
//! (card, wallet or crypto address) is filled in by the builder registered
//! for the order's [`InstrumentType`].

mod bank_card;
mod crypto;
mod ewallet;
pub mod payload;

pub use bank_card::BankCardBuilder;
pub use crypto::CryptoBuilder;
pub use ewallet::EWalletBuilder;
pub use payload::*;

use crate::error::BuildError;
use chrono::{DateTime, Utc};
use paygate_core::{InstrumentType, Order, OrderPaymentMethod};
use std::collections::HashMap;

/// Result type for payload construction
pub type BuildResult<T> = Result<T, BuildError>;

/// Inputs available to a builder
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub order: &'a Order,
    pub method: &'a OrderPaymentMethod,
    pub now: DateTime<Utc>,
}

/// Fills the instrument-specific part of a payload
pub trait PaymentRequestBuilder: Send + Sync {
    fn instrument(&self) -> InstrumentType;

    fn build(&self, ctx: &BuildContext<'_>, payload: ProviderPayload) -> BuildResult<ProviderPayload>;
}

/// Builders keyed by instrument type
pub struct BuilderRegistry {
    builders: HashMap<InstrumentType, Box<dyn PaymentRequestBuilder>>,
}

impl BuilderRegistry {
    /// Registry with no builders
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register a builder, replacing any builder for the same instrument
    pub fn register(mut self, builder: impl PaymentRequestBuilder + 'static) -> Self {
        self.builders.insert(builder.instrument(), Box::new(builder));
        self
    }

    pub fn supports(&self, instrument: InstrumentType) -> bool {
        self.builders.contains_key(&instrument)
    }

    /// Build the full payload for an order
    pub fn build(&self, order: &Order, now: DateTime<Utc>) -> BuildResult<ProviderPayload> {
        let method = order
            .payment_method
            .as_ref()
            .ok_or(BuildError::MissingPaymentMethod)?;
        let code = method.params.external_id.as_str();

        let builder = InstrumentType::from_external_code(code)
            .and_then(|instrument| self.builders.get(&instrument))
            .ok_or_else(|| BuildError::UnknownPaymentMethod(code.to_string()))?;

        let ctx = BuildContext { order, method, now };
        builder.build(&ctx, envelope(&ctx)?)
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::empty()
            .register(BankCardBuilder)
            .register(EWalletBuilder)
            .register(CryptoBuilder)
    }
}

fn envelope(ctx: &BuildContext<'_>) -> BuildResult<ProviderPayload> {
    let order = ctx.order;
    let outcome = order
        .payment_method_outcome
        .as_ref()
        .ok_or(BuildError::MissingAmount)?;

    let items = order
        .fixed_package
        .iter()
        .map(|package| OrderItem {
            name: package.name.clone(),
            description: package.name.clone(),
            count: 1,
            price: package.price,
        })
        .collect();

    Ok(ProviderPayload {
        request: PayloadRequest {
            id: order.id.to_string(),
            time: ctx.now.format(CARDPAY_TIME_FORMAT).to_string(),
        },
        merchant_order: MerchantOrder {
            id: order.id.to_string(),
            description: order.description.clone(),
            items,
        },
        description: order.description.clone(),
        payment_method: ctx.method.params.external_id.clone(),
        payment_data: PaymentData {
            currency: outcome.currency.code().to_string(),
            amount: outcome.amount,
        },
        card_account: None,
        customer: Customer {
            email: order.payer.email.clone(),
            ip: order.payer.ip.clone(),
            id: order.project_account.clone(),
        },
        ewallet_account: None,
        cryptocurrency_account: None,
    })
}

/// Non-empty, trimmed requisite value
pub(crate) fn required<'a>(
    order: &'a Order,
    field: crate::error::RequisiteField,
) -> BuildResult<&'a str> {
    order
        .requisite(field.key())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(BuildError::InvalidRequisites(field))
}
