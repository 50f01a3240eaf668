//! Validation rules. Every rule takes the accumulated [`ErrorMap`] by value and
//! returns it, so a pass never stops at the first violation.

use super::client::Credentials;
use super::errors::ErrorMap;
use super::form::{FieldValue, SubmittedForm};
use super::schema::{
    FormSchema, ADDRESS, CONFIRM_PASSWORD, EMAIL, LOGIN_FORM, PASSWORD, ZIP_CODE,
};

pub const ADDRESS_MESSAGE: &str = "Please enter your address.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match.";

pub type Rule = fn(ErrorMap, &SubmittedForm) -> ErrorMap;

/// Run the required-field pass of `schema`, then its cross-field rules.
#[must_use]
pub fn validate(schema: &FormSchema, form: &SubmittedForm) -> ErrorMap {
    let errors = required_fields(schema, ErrorMap::new(), form);
    schema
        .rules()
        .iter()
        .fold(errors, |errors, rule| rule(errors, form))
}

/// Absent fields, blank text and unchecked consent flags all fail.
#[must_use]
pub fn required_fields(schema: &FormSchema, errors: ErrorMap, form: &SubmittedForm) -> ErrorMap {
    schema
        .required_fields()
        .fold(errors, |errors, (field, message)| {
            if form.get(field).map_or(true, FieldValue::is_blank) {
                errors.with(field, message)
            } else {
                errors
            }
        })
}

/// Both the postal code and the street address must be filled in.
#[must_use]
pub fn address_complete(errors: ErrorMap, form: &SubmittedForm) -> ErrorMap {
    let filled = |field: &str| form.text(field).is_some_and(|value| !value.trim().is_empty());

    if filled(ZIP_CODE) && filled(ADDRESS) {
        errors
    } else {
        errors.with(ADDRESS, ADDRESS_MESSAGE)
    }
}

#[must_use]
pub fn passwords_match(errors: ErrorMap, form: &SubmittedForm) -> ErrorMap {
    match form.get(PASSWORD) {
        Some(password) if password.is_set() && form.get(CONFIRM_PASSWORD) != Some(password) => {
            errors.with(CONFIRM_PASSWORD, PASSWORD_MISMATCH_MESSAGE)
        }
        _ => errors,
    }
}

/// Validate a normalized login form and extract the credentials.
///
/// # Errors
/// Returns the error map when the email or password is missing.
pub fn login_credentials(form: &SubmittedForm) -> Result<Credentials, ErrorMap> {
    let errors = validate(&LOGIN_FORM, form);
    if errors.has_errors() {
        return Err(errors);
    }

    match (form.text(EMAIL), form.text(PASSWORD)) {
        (Some(email), Some(password)) => Ok(Credentials::new(email, password)),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::form::normalize;
    use crate::member::schema::{
        BIRTH_DATE, GENDER, JOIN_FORM, NAME, PHONE_NUMBER, REQUIRED_TERMS_1, REQUIRED_TERMS_2,
        REQUIRED_TERMS_3,
    };
    use secrecy::ExposeSecret;

    fn valid_join_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            (EMAIL, "user@example.com"),
            (NAME, "Jane Doe"),
            (PASSWORD, "s3cret-pass"),
            (CONFIRM_PASSWORD, "s3cret-pass"),
            (PHONE_NUMBER, "010-1234-5678"),
            (GENDER, "FEMALE"),
            (BIRTH_DATE, "1990-01-02"),
            (REQUIRED_TERMS_1, "true"),
            (REQUIRED_TERMS_2, "true"),
            (REQUIRED_TERMS_3, "true"),
            (ZIP_CODE, "04524"),
            (ADDRESS, "110 Sejong-daero"),
        ]
    }

    fn join_errors(pairs: Vec<(&str, &str)>) -> ErrorMap {
        validate(&JOIN_FORM, &normalize(&JOIN_FORM, pairs))
    }

    #[test]
    fn valid_join_form_has_no_errors() {
        let errors = join_errors(valid_join_pairs());
        assert!(!errors.has_errors(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn each_missing_required_field_reports_its_message() {
        for (field, message) in JOIN_FORM.required_fields() {
            let pairs = valid_join_pairs()
                .into_iter()
                .filter(|(key, _)| *key != field)
                .collect();
            let errors = join_errors(pairs);
            assert!(
                errors.messages(field).iter().any(|m| m == message),
                "missing {field} should report {message:?}, got {errors:?}"
            );
        }
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let pairs = valid_join_pairs()
            .into_iter()
            .map(|(key, value)| if key == NAME { (key, "   ") } else { (key, value) })
            .collect();
        let errors = join_errors(pairs);
        assert_eq!(errors.messages(NAME), ["Please enter your name."]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn unchecked_consent_counts_as_missing() {
        let pairs = valid_join_pairs()
            .into_iter()
            .map(|(key, value)| {
                if key == REQUIRED_TERMS_2 {
                    (key, "false")
                } else {
                    (key, value)
                }
            })
            .collect();
        let errors = join_errors(pairs);
        assert_eq!(
            errors.messages(REQUIRED_TERMS_2),
            ["You must agree to the privacy policy."]
        );
    }

    #[test]
    fn collects_every_violation() {
        let errors = join_errors(Vec::new());
        assert_eq!(errors.len(), JOIN_FORM.required_fields().count() + 1);
        assert_eq!(errors.messages(ADDRESS), [ADDRESS_MESSAGE]);
    }

    #[test]
    fn address_needs_zip_code_and_street() {
        let without_zip = valid_join_pairs()
            .into_iter()
            .filter(|(key, _)| *key != ZIP_CODE)
            .collect();
        assert_eq!(join_errors(without_zip).messages(ADDRESS), [ADDRESS_MESSAGE]);

        let blank_street = valid_join_pairs()
            .into_iter()
            .map(|(key, value)| if key == ADDRESS { (key, " ") } else { (key, value) })
            .collect();
        let errors = join_errors(blank_street);
        assert_eq!(errors.messages(ADDRESS), [ADDRESS_MESSAGE]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn password_mismatch_yields_exactly_one_error() {
        let pairs = valid_join_pairs()
            .into_iter()
            .map(|(key, value)| {
                if key == CONFIRM_PASSWORD {
                    (key, "different")
                } else {
                    (key, value)
                }
            })
            .collect();
        let errors = join_errors(pairs);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.messages(CONFIRM_PASSWORD),
            [PASSWORD_MISMATCH_MESSAGE]
        );
    }

    #[test]
    fn missing_confirmation_reports_required_and_mismatch() {
        let pairs = valid_join_pairs()
            .into_iter()
            .filter(|(key, _)| *key != CONFIRM_PASSWORD)
            .collect();
        let errors = join_errors(pairs);
        assert_eq!(
            errors.messages(CONFIRM_PASSWORD),
            ["Please confirm your password.", PASSWORD_MISMATCH_MESSAGE]
        );
    }

    #[test]
    fn mismatch_is_skipped_without_password() {
        let form = SubmittedForm::new();
        assert!(passwords_match(ErrorMap::new(), &form).is_empty());
    }

    #[test]
    fn rules_thread_the_accumulator() {
        let seeded = ErrorMap::new().with(NAME, "kept");
        let errors = address_complete(seeded, &SubmittedForm::new());
        assert_eq!(errors.messages(NAME), ["kept"]);
        assert_eq!(errors.messages(ADDRESS), [ADDRESS_MESSAGE]);
    }

    #[test]
    fn login_requires_email_and_password() {
        let form = normalize(&LOGIN_FORM, [(EMAIL, " "), ("$ACTION_ID_1", "")]);
        let Err(errors) = login_credentials(&form) else {
            panic!("blank login form must not validate");
        };
        assert_eq!(errors.messages(EMAIL), ["Please enter your email."]);
        assert_eq!(errors.messages(PASSWORD), ["Please enter your password."]);
    }

    #[test]
    fn login_credentials_are_extracted() {
        let form = normalize(&LOGIN_FORM, [(EMAIL, "user@example.com"), (PASSWORD, "pw")]);
        let Ok(credentials) = login_credentials(&form) else {
            panic!("complete login form must validate");
        };
        assert_eq!(credentials.email(), "user@example.com");
        assert_eq!(credentials.password().expose_secret(), "pw");
    }
}
