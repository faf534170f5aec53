//! Lenient field readers for the producer's JSON.
//!
//! Optional fields are absent when the key is missing, `null` or a blank
//! string. Anything else must parse or the whole payload is rejected.

use crate::feed::{IcaoAddress, Squawk};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn numeric(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("unrepresentable number {number}")),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("expected a number, found {text:?}")),
        other => Err(format!("expected a number, found {other}")),
    }
}

fn finite(value: f64) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("non-finite number {value}"))
    }
}

pub(crate) fn counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(exact) = exact_counter(&value) {
        return Ok(exact);
    }
    let number = numeric(&value)
        .and_then(|n| n.ok_or_else(|| "counter is blank".to_string()))
        .and_then(finite)
        .map_err(D::Error::custom)?;
    if number < 0.0 {
        return Err(D::Error::custom(format!("negative counter {number}")));
    }
    Ok(number.round() as u64)
}

/// Integer counters taken as-is; only fractional rates go through `f64`.
fn exact_counter(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn optional_counter<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => return Ok(None),
        Value::String(text) if text.trim().is_empty() => return Ok(None),
        _ => {}
    }
    counter(value).map(Some).map_err(D::Error::custom)
}

pub(crate) fn optional_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    numeric(&value)
        .and_then(|n| n.map(finite).transpose())
        .map_err(D::Error::custom)
}

pub(crate) fn optional_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(number) = numeric(&value)
        .and_then(|n| n.map(finite).transpose())
        .map_err(D::Error::custom)?
    else {
        return Ok(None);
    };
    let rounded = number.round();
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(D::Error::custom(format!("{number} out of range")));
    }
    Ok(Some(rounded as i32))
}

pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => {
            let trimmed = text.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        other => Err(D::Error::custom(format!("expected a string, found {other}"))),
    }
}

pub(crate) fn optional_squawk<'de, D>(deserializer: D) -> Result<Option<Squawk>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .map(|code| Some(Squawk::new(code)))
            .ok_or_else(|| D::Error::custom(format!("invalid squawk {number}"))),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse::<u32>()
            .map(|code| Some(Squawk::new(code)))
            .map_err(|_| D::Error::custom(format!("invalid squawk {text:?}"))),
        other => Err(D::Error::custom(format!("invalid squawk {other}"))),
    }
}

pub(crate) fn icao<'de, D>(deserializer: D) -> Result<IcaoAddress, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => text.parse().map_err(D::Error::custom),
        Value::Number(number) => number
            .as_u64()
            .and_then(|raw| u32::try_from(raw).ok())
            .and_then(IcaoAddress::new)
            .ok_or_else(|| D::Error::custom(format!("invalid icao address {number}"))),
        other => Err(D::Error::custom(format!("invalid icao address {other}"))),
    }
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(value) => Ok(value),
        other => Err(D::Error::custom(format!("expected a boolean, found {other}"))),
    }
}
