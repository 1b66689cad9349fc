//! Shipping details form.

use serde::{Deserialize, Serialize};

use marketstall_core::Email;

use super::validation::{FieldRule, ValidationErrors, present, validate};

const INVALID_EMAIL: &str = "Enter a valid email address";

/// Raw shipping form as submitted by the shipping page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub street_address: String,
    /// Apartment, suite, unit. Optional.
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    /// Blank means the configured default country.
    pub country: String,
}

/// Validated shipping details kept on the checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub street_address: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    pub country: String,
}

impl ShippingAddress {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn email_present(f: &ShippingForm) -> bool {
    present(&f.email)
}

fn email_shape(f: &ShippingForm) -> bool {
    Email::parse(&f.email).is_ok()
}

fn first_name_present(f: &ShippingForm) -> bool {
    present(&f.first_name)
}

fn last_name_present(f: &ShippingForm) -> bool {
    present(&f.last_name)
}

fn street_present(f: &ShippingForm) -> bool {
    present(&f.street_address)
}

fn city_present(f: &ShippingForm) -> bool {
    present(&f.city)
}

fn state_present(f: &ShippingForm) -> bool {
    present(&f.state)
}

fn postal_code_present(f: &ShippingForm) -> bool {
    present(&f.postal_code)
}

fn phone_present(f: &ShippingForm) -> bool {
    present(&f.phone)
}

/// Required shipping fields. Country is never validated; it has a default.
pub const SHIPPING_RULES: &[FieldRule<ShippingForm>] = &[
    FieldRule {
        field: "email",
        check: email_present,
        message: "Email is required",
    },
    FieldRule {
        field: "email",
        check: email_shape,
        message: INVALID_EMAIL,
    },
    FieldRule {
        field: "first_name",
        check: first_name_present,
        message: "First name is required",
    },
    FieldRule {
        field: "last_name",
        check: last_name_present,
        message: "Last name is required",
    },
    FieldRule {
        field: "street_address",
        check: street_present,
        message: "Street address is required",
    },
    FieldRule {
        field: "city",
        check: city_present,
        message: "City is required",
    },
    FieldRule {
        field: "state",
        check: state_present,
        message: "State / province is required",
    },
    FieldRule {
        field: "postal_code",
        check: postal_code_present,
        message: "Postal code is required",
    },
    FieldRule {
        field: "phone",
        check: phone_present,
        message: "Phone number is required",
    },
];

impl ShippingForm {
    /// Validate the form and produce a trimmed [`ShippingAddress`].
    ///
    /// # Errors
    ///
    /// Returns every violated field together.
    pub fn validate(&self, default_country: &str) -> Result<ShippingAddress, ValidationErrors> {
        validate(self, SHIPPING_RULES)?;

        let email =
            Email::parse(&self.email).map_err(|_| ValidationErrors::single("email", INVALID_EMAIL))?;
        let line2 = self.address_line2.trim();
        let country = self.country.trim();

        Ok(ShippingAddress {
            email,
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            street_address: self.street_address.trim().to_owned(),
            address_line2: (!line2.is_empty()).then(|| line2.to_owned()),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            country: if country.is_empty() {
                default_country.to_owned()
            } else {
                country.to_owned()
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete_form() -> ShippingForm {
        ShippingForm {
            email: "buyer@example.com".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            street_address: "12 Analytical Way".to_owned(),
            address_line2: String::new(),
            city: "Springfield".to_owned(),
            state: "IL".to_owned(),
            postal_code: "62701".to_owned(),
            phone: "555-0100".to_owned(),
            country: String::new(),
        }
    }

    #[test]
    fn test_complete_form_validates() {
        let address = complete_form().validate("United States").unwrap();
        assert_eq!(address.email.as_str(), "buyer@example.com");
        assert_eq!(address.country, "United States");
        assert_eq!(address.address_line2, None);
        assert_eq!(address.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_email_and_city_missing_reported_together() {
        let form = ShippingForm {
            email: String::new(),
            city: String::new(),
            ..complete_form()
        };
        let err = form.validate("United States").unwrap_err();
        assert_eq!(err.fields(), ["email", "city"]);
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let err = ShippingForm::default().validate("United States").unwrap_err();
        assert_eq!(
            err.fields(),
            [
                "email",
                "first_name",
                "last_name",
                "street_address",
                "city",
                "state",
                "postal_code",
                "phone"
            ]
        );
        assert!(!err.contains("country"));
    }

    #[test]
    fn test_bad_email_shape() {
        let form = ShippingForm {
            email: "buyer-at-example.com".to_owned(),
            ..complete_form()
        };
        let err = form.validate("United States").unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].message, INVALID_EMAIL);
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let form = ShippingForm {
            phone: "   ".to_owned(),
            ..complete_form()
        };
        assert_eq!(form.validate("United States").unwrap_err().fields(), ["phone"]);
    }

    #[test]
    fn test_explicit_country_kept() {
        let form = ShippingForm {
            country: " Canada ".to_owned(),
            ..complete_form()
        };
        assert_eq!(form.validate("United States").unwrap().country, "Canada");
    }
}
