//! Rescaling of brokerage positions priced in a minor currency unit.

use rust_decimal::Decimal;

use crate::{
    instrument::Instrument,
    position::{Position, RawPosition},
};

/// Pence. UK equities are quoted in it.
pub const MINOR_UNIT: &str = "GBX";
pub const MAJOR_UNIT: &str = "GBP";
const MINOR_PER_MAJOR: Decimal = Decimal::ONE_HUNDRED;

type CurrencySource = for<'a> fn(&'a RawPosition, Option<&'a Instrument>) -> Option<&'a str>;

/// Where the priced currency is read from, highest precedence first.
const CURRENCY_SOURCES: [CurrencySource; 5] = [
    instrument_currency_code,
    instrument_currency,
    instrument_currency_id,
    position_currency_code,
    position_currency,
];

fn instrument_currency_code<'a>(_: &'a RawPosition, i: Option<&'a Instrument>) -> Option<&'a str> {
    i.and_then(|i| i.currency_code.as_deref())
}

fn instrument_currency<'a>(_: &'a RawPosition, i: Option<&'a Instrument>) -> Option<&'a str> {
    i.and_then(|i| i.currency.as_deref())
}

fn instrument_currency_id<'a>(_: &'a RawPosition, i: Option<&'a Instrument>) -> Option<&'a str> {
    i.and_then(|i| i.currency_id.as_deref())
}

fn position_currency_code<'a>(p: &'a RawPosition, _: Option<&'a Instrument>) -> Option<&'a str> {
    p.currency_code.as_deref()
}

fn position_currency<'a>(p: &'a RawPosition, _: Option<&'a Instrument>) -> Option<&'a str> {
    p.currency.as_deref()
}

/// First non-blank currency among [`CURRENCY_SOURCES`].
pub fn resolve_currency<'a>(
    position: &'a RawPosition,
    instrument: Option<&'a Instrument>,
) -> Option<&'a str> {
    CURRENCY_SOURCES
        .iter()
        .filter_map(|source| source(position, instrument))
        .map(str::trim)
        .find(|code| !code.is_empty())
}

pub fn normalize(position: &RawPosition, instrument: Option<&Instrument>) -> Position {
    let currency = resolve_currency(position, instrument).map(str::to_string);

    if currency.as_deref() != Some(MINOR_UNIT) {
        return Position {
            raw: position.clone(),
            price_currency: currency,
            normalized_from: None,
        };
    }

    let mut raw = position.clone();
    raw.current_price = position.current_price.as_ref().map(|p| p.divided_by(MINOR_PER_MAJOR));
    raw.average_price = position.average_price.as_ref().map(|p| p.divided_by(MINOR_PER_MAJOR));

    Position {
        raw,
        price_currency: Some(MAJOR_UNIT.to_string()),
        normalized_from: Some(MINOR_UNIT.to_string()),
    }
}
