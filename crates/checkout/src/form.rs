//! The customer form and its per-field validation.
//!
//! The form re-validates eagerly: the phone verdict is recomputed whenever
//! the phone text, the selected method, or the country changes, so a
//! displayed error can never describe a stale (country, method, phone)
//! combination.

use std::collections::BTreeMap;

use serde::Serialize;

use boutik_core::{Email, PhoneNumber};

use crate::catalog::{Catalog, CountryCode, MethodId};
use crate::phone::validate_phone;
use crate::vault::SavedCustomer;

/// Minimum length for first and last names.
pub const MIN_NAME_LEN: usize = 2;

/// The fields a checkout form validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    FirstName,
    LastName,
    Phone,
    Method,
}

/// Per-field validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// True if no field is in error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Error message for a field, if any.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Iterate over (field, message) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn set(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }
}

/// Snapshot of a form that passed the full submission gate.
#[derive(Debug, Clone)]
pub struct ValidatedForm {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: PhoneNumber,
    pub country: CountryCode,
    pub method: MethodId,
}

impl ValidatedForm {
    /// `"First Last"`, as the payment backend expects it.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The mutable checkout form.
#[derive(Debug, Clone)]
pub struct CustomerForm {
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    country: CountryCode,
    method: Option<MethodId>,
    errors: FieldErrors,
}

impl CustomerForm {
    /// An empty form scoped to a country.
    #[must_use]
    pub fn new(country: CountryCode) -> Self {
        Self {
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            country,
            method: None,
            errors: FieldErrors::default(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub const fn country(&self) -> CountryCode {
        self.country
    }

    #[must_use]
    pub const fn method(&self) -> Option<&MethodId> {
        self.method.as_ref()
    }

    /// Current validation errors.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn set_email(&mut self, value: &str) {
        self.email = value.to_owned();
        self.check_email(false);
    }

    pub fn set_first_name(&mut self, value: &str) {
        self.first_name = value.to_owned();
        self.check_name(Field::FirstName, false);
    }

    pub fn set_last_name(&mut self, value: &str) {
        self.last_name = value.to_owned();
        self.check_name(Field::LastName, false);
    }

    pub fn set_phone(&mut self, value: &str) {
        self.phone = value.to_owned();
        self.check_phone(false);
    }

    /// Switch country. The selected method is always cleared, since the
    /// method list is scoped to the country, and the phone verdict is
    /// recomputed against no method.
    pub fn set_country(&mut self, country: CountryCode) {
        self.country = country;
        self.method = None;
        self.errors.clear(Field::Method);
        self.check_phone(false);
    }

    /// Select a payment method. Returns `false` (and changes nothing) if
    /// the method is not offered in the current country. On success the
    /// phone verdict is recomputed under the new method's rules.
    pub fn set_method(&mut self, method: MethodId) -> bool {
        let offered = Catalog::methods_for(self.country)
            .iter()
            .any(|m| m.id_str() == method.as_str());
        if !offered {
            return false;
        }

        self.method = Some(method);
        self.errors.clear(Field::Method);
        self.check_phone(false);
        true
    }

    /// Deselect the method and drop any provider-specific phone error.
    pub fn clear_method(&mut self) {
        self.method = None;
        self.check_phone(false);
    }

    /// Overwrite the whole form, country included, from a saved customer.
    /// The method is left unselected; the restored country re-scopes the
    /// method list.
    pub fn apply_saved(&mut self, customer: &SavedCustomer) {
        self.country = customer.country;
        self.method = None;
        self.email = customer.email.as_str().to_owned();
        self.first_name = customer.first_name.clone();
        self.last_name = customer.last_name.clone();
        self.phone = customer.phone.digits().to_owned();
        self.errors = FieldErrors::default();
        self.check_email(false);
        self.check_name(Field::FirstName, false);
        self.check_name(Field::LastName, false);
        self.check_phone(false);
    }

    /// Clear every field and reset the country.
    pub fn reset(&mut self, country: CountryCode) {
        *self = Self::new(country);
    }

    /// Run the full submission gate: all four fields must pass and a
    /// method must be selected. On failure the error map is populated and
    /// `None` is returned.
    pub fn validate_for_submit(&mut self) -> Option<ValidatedForm> {
        let email = self.check_email(true);
        let first = self.check_name(Field::FirstName, true);
        let last = self.check_name(Field::LastName, true);
        let phone = self.check_phone(true);

        if self.method.is_none() {
            self.errors.set(Field::Method, "choose a payment method");
        }

        match (email, first, last, phone, self.method.clone()) {
            (Some(email), true, true, Some(phone), Some(method)) => Some(ValidatedForm {
                email,
                first_name: self.first_name.trim().to_owned(),
                last_name: self.last_name.trim().to_owned(),
                phone,
                country: self.country,
                method,
            }),
            _ => None,
        }
    }

    fn check_email(&mut self, strict: bool) -> Option<Email> {
        if self.email.trim().is_empty() && !strict {
            self.errors.clear(Field::Email);
            return None;
        }

        match Email::parse(&self.email) {
            Ok(email) => {
                self.errors.clear(Field::Email);
                Some(email)
            }
            Err(error) => {
                self.errors.set(Field::Email, error.to_string());
                None
            }
        }
    }

    fn check_name(&mut self, field: Field, strict: bool) -> bool {
        let value = match field {
            Field::FirstName => self.first_name.trim(),
            Field::LastName => self.last_name.trim(),
            _ => return true,
        };

        if value.is_empty() && !strict {
            self.errors.clear(field);
            return false;
        }

        if value.chars().count() < MIN_NAME_LEN {
            self.errors.set(field, "enter at least 2 characters");
            false
        } else {
            self.errors.clear(field);
            true
        }
    }

    fn check_phone(&mut self, strict: bool) -> Option<PhoneNumber> {
        if self.phone.trim().is_empty() && !strict {
            self.errors.clear(Field::Phone);
            return None;
        }

        match validate_phone(self.country, self.method.as_ref(), &self.phone) {
            Ok(phone) => {
                self.errors.clear(Field::Phone);
                Some(phone)
            }
            Err(error) => {
                self.errors.set(Field::Phone, error.to_string());
                None
            }
        }
    }
}
