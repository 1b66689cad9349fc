//! Payment details form.
//!
//! No payment is processed. The form is validated for shape only and the
//! session keeps nothing beyond the cardholder name and the last four digits.

use serde::{Deserialize, Serialize};

use super::validation::{FieldRule, ValidationErrors, present, validate};

const MIN_CARD_DIGITS: usize = 12;
const MAX_CARD_DIGITS: usize = 19;

/// Raw payment form as submitted by the payment page.
///
/// Implements `Debug` manually to redact the card number.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentForm {
    pub cardholder_name: String,
    pub card_number: String,
    /// `MM/YY`.
    pub expiry: String,
}

impl std::fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentForm")
            .field("cardholder_name", &self.cardholder_name)
            .field("card_number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// What the session retains about the payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub cardholder_name: String,
    pub last4: String,
}

fn card_digits(number: &str) -> Option<String> {
    let mut digits = String::with_capacity(number.len());
    for c in number.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' => {}
            _ => return None,
        }
    }
    Some(digits)
}

fn cardholder_present(f: &PaymentForm) -> bool {
    present(&f.cardholder_name)
}

fn card_number_present(f: &PaymentForm) -> bool {
    present(&f.card_number)
}

fn card_number_shape(f: &PaymentForm) -> bool {
    card_digits(&f.card_number)
        .is_some_and(|d| (MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&d.len()))
}

fn expiry_shape(f: &PaymentForm) -> bool {
    let Some((month, year)) = f.expiry.trim().split_once('/') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    two_digits(month)
        && two_digits(year)
        && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m))
}

/// Payment form rules.
pub const PAYMENT_RULES: &[FieldRule<PaymentForm>] = &[
    FieldRule {
        field: "cardholder_name",
        check: cardholder_present,
        message: "Name on card is required",
    },
    FieldRule {
        field: "card_number",
        check: card_number_present,
        message: "Card number is required",
    },
    FieldRule {
        field: "card_number",
        check: card_number_shape,
        message: "Card number must be 12 to 19 digits",
    },
    FieldRule {
        field: "expiry",
        check: expiry_shape,
        message: "Expiry must be MM/YY",
    },
];

impl PaymentForm {
    /// Validate the form and reduce it to a [`PaymentSummary`].
    ///
    /// # Errors
    ///
    /// Returns every violated field together.
    pub fn validate(&self) -> Result<PaymentSummary, ValidationErrors> {
        validate(self, PAYMENT_RULES)?;

        let digits = card_digits(&self.card_number).unwrap_or_default();
        let last4 = digits
            .get(digits.len().saturating_sub(4)..)
            .unwrap_or_default()
            .to_owned();

        Ok(PaymentSummary {
            cardholder_name: self.cardholder_name.trim().to_owned(),
            last4,
        })
    }
}
