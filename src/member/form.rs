//! Form normalizer: raw `(key, value)` pairs into a [`SubmittedForm`].

use super::schema::{FieldKind, FormSchema};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Framework plumbing fields carry this marker in their key.
pub const ACTION_MARKER: &str = "$ACTION";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// A required field holding this value counts as missing.
    ///
    /// Blank text and an unchecked (`false`) flag are blank; a list never is,
    /// even when empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Flag(flag) => !flag,
            Self::List(_) => false,
        }
    }

    /// Any value except empty text and `false`.
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Text(text) => !text.is_empty(),
            Self::Flag(flag) => *flag,
            Self::List(_) => true,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Normalized submission, serialized as a flat JSON object for the member API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedForm(BTreeMap<String, FieldValue>);

impl SubmittedForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Text value of `field`, `None` when absent or not text.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    #[must_use]
    pub fn list(&self, field: &str) -> Option<&[String]> {
        match self.get(field) {
            Some(FieldValue::List(items)) => Some(items),
            _ => None,
        }
    }

    /// Set `field`, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(field.into(), value)
    }

    /// Append to a repeatable field, turning a scalar into a list if needed.
    pub fn push(&mut self, field: impl Into<String>, value: String) {
        let entry = self
            .0
            .entry(field.into())
            .or_insert_with(|| FieldValue::List(Vec::new()));
        match entry {
            FieldValue::List(items) => items.push(value),
            other => *other = FieldValue::List(vec![value]),
        }
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(field, value)| (field.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for SubmittedForm {
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value))
                .collect(),
        )
    }
}

/// Build a [`SubmittedForm`] from submitted pairs, in submission order.
///
/// Repeatable fields of `schema` always exist, empty when never submitted.
/// Fields the schema does not know get the generic `"true"`/`"false"`
/// coercion and last-write-wins semantics.
pub fn normalize<I, K, V>(schema: &FormSchema, pairs: I) -> SubmittedForm
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut form = SubmittedForm::new();

    for field in schema
        .fields()
        .iter()
        .filter(|field| field.kind == FieldKind::Multi)
    {
        form.insert(field.name, FieldValue::List(Vec::new()));
    }

    for (key, value) in pairs {
        let key: String = key.into();
        if key.contains(ACTION_MARKER) {
            continue;
        }

        let value: String = value.into();
        match schema.field(&key).map(|field| field.kind) {
            Some(FieldKind::Multi) => form.push(key, value),
            Some(FieldKind::Text) => {
                form.insert(key, FieldValue::Text(value));
            }
            Some(FieldKind::Date) => {
                form.insert(key, FieldValue::Text(canonical_date(value)));
            }
            Some(FieldKind::Flag) | None => {
                form.insert(key, coerce_flag(value));
            }
        }
    }

    form
}

/// Keep the first value of every key, dropping later repeats.
///
/// Login reads single values the way a browser `FormData.get` does.
pub fn first_values<I, K, V>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut seen = HashSet::new();
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .filter(|(key, _)| seen.insert(key.clone()))
        .collect()
}

fn coerce_flag(value: String) -> FieldValue {
    match value.as_str() {
        "true" => FieldValue::Flag(true),
        "false" => FieldValue::Flag(false),
        _ => FieldValue::Text(value),
    }
}

/// Rewrite a parseable date as `YYYY-MM-DD`; anything else is returned as-is.
#[must_use]
pub fn canonical_date(value: String) -> String {
    match parse_date(value.trim()) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => value,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}
