//! Format checks for types that own their validation.

use chrono::{DateTime, Utc};
use entkit_model::DataType;
use entkit_types::{parse_date_text, parse_time_text, Value};
use regex_lite::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 ().\-]{5,19}$").expect("phone pattern"));

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url pattern"));

static LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Z]{2})?$").expect("language pattern"));

fn is_upper_code(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|b| b.is_ascii_uppercase())
}

/// Checks `text` against the format of `data_type`. Types without a
/// format always pass.
pub(crate) fn matches_format(data_type: DataType, text: &str) -> bool {
    match data_type {
        DataType::Email => EMAIL.is_match(text),
        DataType::Phone => PHONE.is_match(text),
        DataType::Url => URL.is_match(text),
        DataType::Ulid => ulid::Ulid::from_string(text).is_ok(),
        DataType::Uuid => uuid::Uuid::parse_str(text).is_ok(),
        DataType::CountryCode => is_upper_code(text, 2),
        DataType::CurrencyCode => is_upper_code(text, 3),
        _ => true,
    }
}

pub(crate) fn is_language_code(code: &str) -> bool {
    LANGUAGE.is_match(code)
}

/// Brings a temporal value into a form that orders correctly against
/// another value of the same data type.
pub(crate) fn normalize_temporal(data_type: DataType, value: &Value) -> Option<Value> {
    match (data_type, value) {
        (DataType::DateTime, Value::Timestamp(_)) => Some(value.clone()),
        (DataType::DateTime, Value::Text(text)) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| Value::Timestamp(ts.with_timezone(&Utc))),
        (DataType::Date, Value::Timestamp(ts)) => {
            Some(Value::Text(ts.date_naive().format("%Y-%m-%d").to_string()))
        }
        (DataType::Date, Value::Text(text)) => {
            parse_date_text(text).map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
        }
        (DataType::Time, Value::Text(text)) => {
            parse_time_text(text).map(|t| Value::Text(t.format("%H:%M:%S%.f").to_string()))
        }
        _ => None,
    }
}
