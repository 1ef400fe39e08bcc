/*
[INPUT]:  Loosely typed protocol values (numbers or numeric strings, 0/1 flags)
[OUTPUT]: serde adapters for Decimal and bool fields
[POS]:    Data layer - shared serde helpers for request and model types
[UPDATE]: When the server changes how numbers or flags are encoded
*/

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

fn decimal_from_value<E: Error>(value: &Value) -> Result<Decimal, E> {
    if let Some(raw) = value.as_str() {
        return Decimal::from_str(raw.trim()).map_err(E::custom);
    }
    if value.is_number() {
        let raw = value.to_string();
        return Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(E::custom);
    }
    Err(E::custom(format!("invalid decimal value {value}")))
}

/// Decimal sent as a JSON number or a numeric string
pub mod decimal {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        decimal_from_value(&value)
    }

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(value, serializer)
    }
}

/// Optional decimal; `null`, a missing field and `""` all read as `None`
pub mod decimal_option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Null => Ok(None),
            Value::String(raw) if raw.trim().is_empty() => Ok(None),
            other => decimal_from_value(other).map(Some),
        }
    }

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float_option::serialize(value, serializer)
    }
}

pub mod decimal_vec {
    use super::*;
    use serde::Serialize;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values: Vec<Value> = Vec::deserialize(deserializer)?;
        values.iter().map(decimal_from_value::<D::Error>).collect()
    }

    pub fn serialize<S>(values: &[Decimal], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let numbers: Vec<f64> = values
            .iter()
            .map(|value| value.to_string().parse::<f64>().unwrap_or_default())
            .collect();
        numbers.serialize(serializer)
    }
}

/// Boolean carried as `0`/`1` on the wire
pub mod flag {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(false),
            Value::Bool(flag) => Ok(flag),
            Value::Number(number) => match number.as_u64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(Error::custom(format!("invalid flag {number}"))),
            },
            other => Err(Error::custom(format!("invalid flag {other}"))),
        }
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }
}

pub mod flag_option {
    use super::*;

    pub fn serialize<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(flag) => serializer.serialize_u8(u8::from(*flag)),
            None => serializer.serialize_none(),
        }
    }
}
