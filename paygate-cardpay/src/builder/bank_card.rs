//! Bank card payload

use super::{BuildContext, BuildResult, CardAccount, PaymentRequestBuilder, ProviderPayload, required};
use crate::error::{BuildError, RequisiteField};
use chrono::Datelike;
use paygate_core::InstrumentType;
use regex::Regex;

/// Builds `card_account` from the payer's card requisites
#[derive(Debug, Clone, Copy, Default)]
pub struct BankCardBuilder;

impl PaymentRequestBuilder for BankCardBuilder {
    fn instrument(&self) -> InstrumentType {
        InstrumentType::BankCard
    }

    fn build(&self, ctx: &BuildContext<'_>, mut payload: ProviderPayload) -> BuildResult<ProviderPayload> {
        let order = ctx.order;

        let pan = validate_pan(
            required(order, RequisiteField::Pan)?,
            ctx.method.account_regexp.as_deref(),
        )?;
        let cvv = validate_cvv(required(order, RequisiteField::Cvv)?)?;
        let month = validate_month(required(order, RequisiteField::Month)?)?;
        let year = validate_year(required(order, RequisiteField::Year)?, ctx.now.year())?;
        let holder = required(order, RequisiteField::CardHolder)?;

        payload.card_account = Some(CardAccount {
            card: super::Card {
                pan,
                holder: holder.to_string(),
                security_code: cvv.to_string(),
                expiration: format!("{:02}/{}", month, year),
            },
        });

        Ok(payload)
    }
}

fn invalid(field: RequisiteField) -> BuildError {
    BuildError::InvalidRequisites(field)
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Digits only, 12 to 19 long, Luhn-valid, and matching the method's format when it has one.
/// Spaces and dashes between digit groups are dropped.
fn validate_pan(raw: &str, account_regexp: Option<&str>) -> BuildResult<String> {
    let pan: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();

    if !all_digits(&pan) || !(12..=19).contains(&pan.len()) || !luhn(&pan) {
        return Err(invalid(RequisiteField::Pan));
    }

    if let Some(pattern) = account_regexp {
        let matches = Regex::new(pattern)
            .map(|re| re.is_match(&pan))
            .unwrap_or_else(|e| {
                tracing::warn!(pattern, error = %e, "Invalid account format on payment method");
                false
            });
        if !matches {
            return Err(invalid(RequisiteField::Pan));
        }
    }

    Ok(pan)
}

fn luhn(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, d)| match i % 2 {
            0 => d,
            _ if d * 2 > 9 => d * 2 - 9,
            _ => d * 2,
        })
        .sum();
    sum % 10 == 0
}

fn validate_cvv(cvv: &str) -> BuildResult<&str> {
    if all_digits(cvv) && (3..=4).contains(&cvv.len()) {
        Ok(cvv)
    } else {
        Err(invalid(RequisiteField::Cvv))
    }
}

fn validate_month(month: &str) -> BuildResult<u32> {
    if !all_digits(month) || month.len() > 2 {
        return Err(invalid(RequisiteField::Month));
    }
    match month.parse::<u32>() {
        Ok(m) if (1..=12).contains(&m) => Ok(m),
        _ => Err(invalid(RequisiteField::Month)),
    }
}

/// Four-digit year; a two-digit year takes the century of `current_year`
fn validate_year(year: &str, current_year: i32) -> BuildResult<String> {
    if !all_digits(year) {
        return Err(invalid(RequisiteField::Year));
    }
    match year.len() {
        4 => Ok(year.to_string()),
        2 => Ok(format!("{}{}", current_year / 100, year)),
        _ => Err(invalid(RequisiteField::Year)),
    }
}
