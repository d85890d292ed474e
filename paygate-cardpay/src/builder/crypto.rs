//! Cryptocurrency payload

use super::{BuildContext, BuildResult, CryptoCurrencyAccount, PaymentRequestBuilder, ProviderPayload, required};
use crate::error::RequisiteField;
use paygate_core::InstrumentType;

/// Builds `cryptocurrency_account` with the payer's rollback address
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoBuilder;

impl PaymentRequestBuilder for CryptoBuilder {
    fn instrument(&self) -> InstrumentType {
        InstrumentType::Crypto
    }

    fn build(&self, ctx: &BuildContext<'_>, mut payload: ProviderPayload) -> BuildResult<ProviderPayload> {
        let address = required(ctx.order, RequisiteField::Address)?;
        payload.cryptocurrency_account = Some(CryptoCurrencyAccount {
            rollback_address: address.to_string(),
        });
        Ok(payload)
    }
}
