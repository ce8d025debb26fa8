use std::fmt::Display;

use colored::Colorize;
use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::instrument::{deserialize_code, deserialize_ticker};

/// A price field as the brokerage sent it. Only JSON numbers are ever rescaled.
#[derive(Clone, Debug, PartialEq)]
pub enum Price {
    Amount(Decimal),
    /// Number outside the range of [`Decimal`].
    Float(f64),
    Other(Value),
}

impl Price {
    fn from_number(number: &Number) -> Option<Self> {
        let text = number.to_string();
        let amount = Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text));
        if let Ok(amount) = amount {
            return Some(Price::Amount(amount));
        }
        number.as_f64().map(Price::Float)
    }

    /// Numeric prices divided by `divisor`, anything else cloned as-is.
    pub fn divided_by(&self, divisor: Decimal) -> Self {
        match self {
            Price::Amount(amount) => Price::Amount(amount / divisor),
            Price::Float(value) => Price::Float(value / divisor.to_f64().unwrap_or(f64::NAN)),
            Price::Other(value) => Price::Other(value.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if let Value::Number(number) = &value {
            if let Some(price) = Price::from_number(number) {
                return Ok(price);
            }
        }
        Ok(Price::Other(value))
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Price::Amount(amount) => rust_decimal::serde::float::serialize(amount, serializer),
            Price::Float(value) => serializer.serialize_f64(*value),
            Price::Other(value) => value.serialize(serializer),
        }
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Price::Amount(amount) => write!(f, "{}", amount.normalize()),
            Price::Float(value) => write!(f, "{}", value),
            Price::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Position exactly as listed by the brokerage portfolio endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawPosition {
    #[serde(default, deserialize_with = "deserialize_ticker")]
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_price: Option<Price>,
    #[serde(
        default,
        deserialize_with = "deserialize_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Position after currency normalization, serialized flat for the front-end.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(flatten)]
    pub raw: RawPosition,
    /// Currency the price fields are expressed in, when known.
    pub price_currency: Option<String>,
    /// Minor unit the prices were converted from, e.g. `GBX`.
    pub normalized_from: Option<String>,
}

impl Position {
    pub fn is_normalized(&self) -> bool {
        self.normalized_from.is_some()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let price = |p: &Option<Price>| p.as_ref().map(|p| p.to_string()).unwrap_or_default();
        write!(
            f,
            "{}: {} (avg {}) {}",
            self.raw.ticker.bold(),
            price(&self.raw.current_price).purple(),
            price(&self.raw.average_price),
            self.price_currency.as_deref().unwrap_or("?").yellow()
        )?;
        if let Some(from) = &self.normalized_from {
            write!(f, " [from {}]", from)?;
        }
        Ok(())
    }
}
