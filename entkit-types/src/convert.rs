//! Conversions between Rust field types and [`Value`].
//!
//! `FromValue` accepts the directly matching variant first and then falls
//! back to a best-effort numeric or textual conversion, so a record read
//! from a loosely-typed source (JSON, query parameters) still lands in a
//! strongly-typed struct.

use crate::{MarshalError, MarshalResult, Record, Value};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::str::FromStr;
use uuid::Uuid;

/// Produces the wire value for a typed field.
pub trait IntoValue {
    fn to_value(&self) -> Value;
}

/// Reads a typed field back from its wire value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> MarshalResult<Self>;
}

fn incompatible<T>(expected: &'static str, found: &Value) -> MarshalResult<T> {
    Err(MarshalError::Incompatible {
        expected,
        found: found.kind(),
    })
}

// ── Integers ─────────────────────────────────────────────────────

macro_rules! integer_value {
    ($($ty:ty => $name:literal, $variant:ident, $wide:ty);* $(;)?) => {$(
        impl IntoValue for $ty {
            fn to_value(&self) -> Value {
                Value::$variant(<$wide>::from(*self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> MarshalResult<Self> {
                let out_of_range = |v: &dyn std::fmt::Display| MarshalError::OutOfRange {
                    target: $name,
                    value: v.to_string(),
                };
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(&i)),
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|_| out_of_range(&u)),
                    Value::Float(f) => {
                        if f.fract() != 0.0 || !f.is_finite() {
                            return Err(out_of_range(&f));
                        }
                        Decimal::from_f64(f)
                            .and_then(|d| d.to_i128())
                            .and_then(|i| <$ty>::try_from(i).ok())
                            .ok_or_else(|| out_of_range(&f))
                    }
                    Value::Decimal(d) => {
                        if !d.fract().is_zero() {
                            return Err(out_of_range(&d));
                        }
                        d.to_i128()
                            .and_then(|i| <$ty>::try_from(i).ok())
                            .ok_or_else(|| out_of_range(&d))
                    }
                    Value::Text(s) => s.trim().parse::<$ty>().map_err(|_| MarshalError::Parse {
                        target: $name,
                        value: s,
                    }),
                    other => incompatible($name, &other),
                }
            }
        }
    )*};
}

integer_value! {
    i8 => "i8", Int, i64;
    i16 => "i16", Int, i64;
    i32 => "i32", Int, i64;
    i64 => "i64", Int, i64;
    u8 => "u8", Int, i64;
    u16 => "u16", Int, i64;
    u32 => "u32", Int, i64;
    u64 => "u64", UInt, u64;
}

// ── Floats ───────────────────────────────────────────────────────

impl IntoValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Text(s) => s.trim().parse().map_err(|_| MarshalError::Parse {
                target: "f64",
                value: s,
            }),
            other => match other.as_f64() {
                Some(f) => Ok(f),
                None => incompatible("f64", &other),
            },
        }
    }
}

impl IntoValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> MarshalResult<Self> {
        let wide = f64::from_value(value)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(MarshalError::OutOfRange {
                target: "f32",
                value: wide.to_string(),
            });
        }
        Ok(narrow)
    }
}

impl IntoValue for Decimal {
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Text(s) => Decimal::from_str(s.trim()).map_err(|_| MarshalError::Parse {
                target: "decimal",
                value: s,
            }),
            Value::Float(f) => Decimal::from_f64(f).ok_or(MarshalError::OutOfRange {
                target: "decimal",
                value: f.to_string(),
            }),
            other => match other.as_decimal() {
                Some(d) => Ok(d),
                None => incompatible("decimal", &other),
            },
        }
    }
}

// ── Text, bool, time ─────────────────────────────────────────────

impl IntoValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bool(_) | Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Decimal(_) => {
                Ok(value.to_string())
            }
            Value::Timestamp(t) => Ok(t.to_rfc3339()),
            other => incompatible("string", &other),
        }
    }
}

impl IntoValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(0) | Value::UInt(0) => Ok(false),
            Value::Int(1) | Value::UInt(1) => Ok(true),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(MarshalError::Parse {
                    target: "bool",
                    value: s,
                }),
            },
            other => incompatible("bool", &other),
        }
    }
}

impl IntoValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| MarshalError::Parse {
                    target: "timestamp",
                    value: s,
                }),
            other => incompatible("timestamp", &other),
        }
    }
}

impl IntoValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Text(s) => Uuid::parse_str(s.trim()).map_err(|_| MarshalError::Parse {
                target: "uuid",
                value: s,
            }),
            other => incompatible("uuid", &other),
        }
    }
}

// ── Containers ───────────────────────────────────────────────────

impl IntoValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> MarshalResult<Self> {
        Ok(value)
    }
}

impl IntoValue for Record {
    fn to_value(&self) -> Value {
        Value::Map(self.clone())
    }
}

impl FromValue for Record {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Map(record) => Ok(record),
            other => incompatible("map", &other),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(IntoValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => incompatible("list", &other),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, IntoValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> MarshalResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
