//! E-wallet payload

use super::{BuildContext, BuildResult, EWalletAccount, PaymentRequestBuilder, ProviderPayload, required};
use crate::error::RequisiteField;
use paygate_core::InstrumentType;

/// Builds `ewallet_account` for WebMoney, Qiwi, Neteller and Alipay
#[derive(Debug, Clone, Copy, Default)]
pub struct EWalletBuilder;

impl PaymentRequestBuilder for EWalletBuilder {
    fn instrument(&self) -> InstrumentType {
        InstrumentType::EWallet
    }

    fn build(&self, ctx: &BuildContext<'_>, mut payload: ProviderPayload) -> BuildResult<ProviderPayload> {
        let wallet = required(ctx.order, RequisiteField::EWallet)?;
        payload.ewallet_account = Some(EWalletAccount {
            id: wallet.to_string(),
        });
        Ok(payload)
    }
}
