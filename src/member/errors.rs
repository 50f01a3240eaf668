use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

/// Key used when the member API answers with a message that is not tied to a
/// field.
pub const GLOBAL_FIELD: &str = "global";

/// Field name to ordered list of messages. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<String, Vec<String>>);

impl ErrorMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` to `field` and hand the map back.
    #[must_use]
    pub fn with(mut self, field: &str, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.0.is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages attached to `field`, empty when the field is valid.
    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Build the map from the `message` member of a member API reply.
    ///
    /// Field values may be a list of messages or a single message. A bare
    /// string, or a reply without usable messages, is filed under
    /// [`GLOBAL_FIELD`] so a rejection never yields an empty map.
    #[must_use]
    pub fn from_remote(message: Option<&Value>, fallback: &str) -> Self {
        let errors = match message {
            Some(Value::Object(fields)) => {
                fields
                    .iter()
                    .fold(Self::new(), |errors, (field, messages)| match messages {
                        Value::Array(items) => items
                            .iter()
                            .fold(errors, |errors, item| errors.with(field, message_text(item))),
                        Value::Null => errors,
                        other => errors.with(field, message_text(other)),
                    })
            }
            Some(Value::String(text)) if !text.trim().is_empty() => {
                Self::new().with(GLOBAL_FIELD, text.clone())
            }
            _ => Self::new(),
        };

        if errors.is_empty() {
            Self::new().with(GLOBAL_FIELD, fallback)
        } else {
            errors
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for ErrorMap {
    fn from_iter<T: IntoIterator<Item = (K, Vec<String>)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, messages)| (field.into(), messages))
                .collect(),
        )
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Broad classification of [`ActionError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The member API could not be reached or did not answer in time.
    RemoteUnavailable,
    /// The member API answered with something that is not a valid reply.
    RemoteProtocol,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RemoteUnavailable => "remote_unavailable",
            Self::RemoteProtocol => "remote_protocol",
        }
    }
}

/// Failures talking to the member API. Local validation problems and remote
/// rejections are not errors, they end up in an [`ErrorMap`].
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("member API unreachable: {0}")]
    RemoteUnavailable(#[source] reqwest::Error),
    #[error("member API returned an invalid reply: {0}")]
    MalformedResponse(String),
}

impl ActionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Self::MalformedResponse(_) => ErrorKind::RemoteProtocol,
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_appends_in_order() {
        let errors = ErrorMap::new()
            .with("password", "first")
            .with("password", "second")
            .with("email", "missing");
        assert_eq!(errors.messages("password"), ["first", "second"]);
        assert_eq!(errors.messages("email"), ["missing"]);
        assert!(errors.messages("name").is_empty());
        assert_eq!(errors.len(), 2);
        assert!(errors.has_errors());
    }

    #[test]
    fn remote_field_lists_are_kept_verbatim() {
        let message = json!({"email": ["taken"], "password": ["short", "weak"]});
        let errors = ErrorMap::from_remote(Some(&message), "rejected");
        let expected: ErrorMap = [
            ("email", vec!["taken".to_string()]),
            ("password", vec!["short".to_string(), "weak".to_string()]),
        ]
        .into_iter()
        .collect();
        assert_eq!(errors, expected);
    }

    #[test]
    fn remote_single_messages_are_wrapped() {
        let message = json!({"email": "taken"});
        let errors = ErrorMap::from_remote(Some(&message), "rejected");
        assert_eq!(errors.messages("email"), ["taken"]);
    }

    #[test]
    fn remote_plain_string_goes_to_global() {
        let message = json!("Member service is closed");
        let errors = ErrorMap::from_remote(Some(&message), "rejected");
        assert_eq!(errors.messages(GLOBAL_FIELD), ["Member service is closed"]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn remote_without_message_uses_fallback() {
        let errors = ErrorMap::from_remote(None, "rejected");
        assert_eq!(errors.messages(GLOBAL_FIELD), ["rejected"]);

        let empty = json!({"email": []});
        let errors = ErrorMap::from_remote(Some(&empty), "rejected");
        assert_eq!(errors.messages(GLOBAL_FIELD), ["rejected"]);
    }

    #[test]
    fn serializes_as_plain_object() -> Result<(), serde_json::Error> {
        let errors = ErrorMap::new().with("email", "taken");
        assert_eq!(serde_json::to_value(&errors)?, json!({"email": ["taken"]}));
        let back: ErrorMap = serde_json::from_value(json!({"email": ["taken"]}))?;
        assert_eq!(back, errors);
        Ok(())
    }

    #[test]
    fn malformed_json_is_a_protocol_error() {
        let err = serde_json::from_str::<Value>("<html>").map_err(ActionError::from);
        assert!(matches!(
            err.map_err(|err| err.kind()),
            Err(ErrorKind::RemoteProtocol)
        ));
    }
}
