use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Marker the brokerage appends to equity tickers, e.g. `BARC_EQ`.
pub const EQUITY_SUFFIX: &str = "_EQ";

/// Instrument metadata as returned by the brokerage.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    #[serde(default, deserialize_with = "deserialize_ticker")]
    pub ticker: String,
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
    #[serde(
        default,
        deserialize_with = "deserialize_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keeps string values only; a null or non-string field reads as absent.
pub(crate) fn deserialize_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(code)) => Ok(Some(code)),
        Some(other) => {
            debug!("Ignoring non-string code {}", other);
            Ok(None)
        }
        None => Ok(None),
    }
}

pub(crate) fn deserialize_ticker<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_code(deserializer)?.unwrap_or_default())
}

/// `BARC_EQ` -> `BARC`, anything else unchanged.
pub fn strip_suffix(ticker: &str) -> &str {
    ticker.strip_suffix(EQUITY_SUFFIX).unwrap_or(ticker)
}

/// Instruments keyed by raw and suffix-stripped ticker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstrumentMap {
    by_ticker: HashMap<String, Arc<Instrument>>,
}

impl InstrumentMap {
    /// Later entries overwrite earlier ones sharing a key.
    pub fn from_instruments<I>(instruments: I) -> Self
    where
        I: IntoIterator<Item = Instrument>,
    {
        let mut by_ticker = HashMap::new();
        for instrument in instruments {
            if instrument.ticker.is_empty() {
                continue;
            }
            let raw = instrument.ticker.clone();
            let stripped = strip_suffix(&raw).to_string();
            let instrument = Arc::new(instrument);
            if stripped != raw {
                by_ticker.insert(stripped, instrument.clone());
            }
            by_ticker.insert(raw, instrument);
        }
        Self { by_ticker }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Instrument>> {
        self.by_ticker.get(key)
    }

    /// Raw ticker first, then its suffix-stripped form.
    pub fn lookup(&self, ticker: &str) -> Option<&Arc<Instrument>> {
        self.by_ticker
            .get(ticker)
            .or_else(|| self.by_ticker.get(strip_suffix(ticker)))
    }

    /// Number of keys, both ticker forms counted.
    pub fn len(&self) -> usize {
        self.by_ticker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }
}
