//! Per-field schemas for the join and login forms.
//!
//! A schema decides how each submitted value is coerced by the normalizer,
//! which fields are mandatory (and with which message), and which cross-field
//! rules run after the required-field pass.

use super::validate::{address_complete, passwords_match, Rule};

pub const EMAIL: &str = "email";
pub const NAME: &str = "name";
pub const PASSWORD: &str = "password";
pub const CONFIRM_PASSWORD: &str = "confirmPassword";
pub const PHONE_NUMBER: &str = "phoneNumber";
pub const GENDER: &str = "gender";
pub const BIRTH_DATE: &str = "birthDt";
pub const REQUIRED_TERMS_1: &str = "requiredTerms1";
pub const REQUIRED_TERMS_2: &str = "requiredTerms2";
pub const REQUIRED_TERMS_3: &str = "requiredTerms3";
pub const OPTIONAL_TERMS: &str = "optionalTerms";
pub const ZIP_CODE: &str = "zipCode";
pub const ADDRESS: &str = "address";
pub const ADDRESS_SUB: &str = "addressSub";

/// How a submitted value is coerced before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, kept verbatim.
    Text,
    /// Calendar date, rewritten as `YYYY-MM-DD` when it parses.
    Date,
    /// Checkbox flag, `"true"` and `"false"` become booleans.
    Flag,
    /// Repeatable field, every occurrence is kept in submission order.
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Message reported when the field is absent or blank.
    pub required: Option<&'static str>,
}

impl FieldSpec {
    const fn mandatory(name: &'static str, kind: FieldKind, message: &'static str) -> Self {
        Self {
            name,
            kind,
            required: Some(message),
        }
    }

    const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: None,
        }
    }
}

pub struct FormSchema {
    name: &'static str,
    fields: &'static [FieldSpec],
    rules: &'static [Rule],
}

impl FormSchema {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Cross-field rules, run in order after the required-field pass.
    #[must_use]
    pub const fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Mandatory fields with their messages, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.fields
            .iter()
            .filter_map(|field| field.required.map(|message| (field.name, message)))
    }
}

impl std::fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("rules", &self.rules.len())
            .finish()
    }
}

pub static JOIN_FORM: FormSchema = FormSchema {
    name: "join",
    fields: &[
        FieldSpec::mandatory(EMAIL, FieldKind::Text, "Please enter your email."),
        FieldSpec::mandatory(NAME, FieldKind::Text, "Please enter your name."),
        FieldSpec::mandatory(PASSWORD, FieldKind::Text, "Please enter your password."),
        FieldSpec::mandatory(
            CONFIRM_PASSWORD,
            FieldKind::Text,
            "Please confirm your password.",
        ),
        FieldSpec::mandatory(
            PHONE_NUMBER,
            FieldKind::Text,
            "Please enter your phone number.",
        ),
        FieldSpec::mandatory(GENDER, FieldKind::Text, "Please select your gender."),
        FieldSpec::mandatory(
            BIRTH_DATE,
            FieldKind::Date,
            "Please select your date of birth.",
        ),
        FieldSpec::mandatory(
            REQUIRED_TERMS_1,
            FieldKind::Flag,
            "You must agree to the terms of service.",
        ),
        FieldSpec::mandatory(
            REQUIRED_TERMS_2,
            FieldKind::Flag,
            "You must agree to the privacy policy.",
        ),
        FieldSpec::mandatory(
            REQUIRED_TERMS_3,
            FieldKind::Flag,
            "You must agree to the collection and use of personal information.",
        ),
        FieldSpec::optional(ZIP_CODE, FieldKind::Text),
        FieldSpec::optional(ADDRESS, FieldKind::Text),
        FieldSpec::optional(ADDRESS_SUB, FieldKind::Text),
        FieldSpec::optional(OPTIONAL_TERMS, FieldKind::Multi),
    ],
    rules: &[address_complete as Rule, passwords_match as Rule],
};

pub static LOGIN_FORM: FormSchema = FormSchema {
    name: "login",
    fields: &[
        FieldSpec::mandatory(EMAIL, FieldKind::Text, "Please enter your email."),
        FieldSpec::mandatory(PASSWORD, FieldKind::Text, "Please enter your password."),
    ],
    rules: &[],
};
