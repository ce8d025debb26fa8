use std::sync::Arc;

use tracing::debug;

use crate::{
    cache::{Clock, InstrumentCache, Snapshot, SystemClock},
    error::ApiError,
    instrument::{Instrument, InstrumentMap},
    normalize::normalize,
    position::{Position, RawPosition},
    upstream::Brokerage,
};

/// Brokerage client plus the instrument cache it feeds.
#[derive(Debug)]
pub struct Portfolio<B, C = SystemClock> {
    brokerage: B,
    instruments: InstrumentCache<C>,
}

impl<B: Brokerage, C: Clock> Portfolio<B, C> {
    pub fn new(brokerage: B, instruments: InstrumentCache<C>) -> Self {
        Self {
            brokerage,
            instruments,
        }
    }

    pub fn brokerage(&self) -> &B {
        &self.brokerage
    }

    pub fn instrument_cache(&self) -> &InstrumentCache<C> {
        &self.instruments
    }

    pub async fn get_instruments(&self, auth: &str) -> Result<Arc<InstrumentMap>, ApiError> {
        self.instruments.get_instruments(&self.brokerage, auth).await
    }

    pub async fn instrument_snapshot(&self, auth: &str) -> Result<Snapshot, ApiError> {
        self.instruments.refresh_if_stale(&self.brokerage, auth).await
    }

    /// Every open position with GBX prices rescaled to GBP. Fails as a whole.
    pub async fn list_normalized_portfolio(&self, auth: &str) -> Result<Vec<Position>, ApiError> {
        self.list_portfolio_with(auth, normalize).await
    }

    /// Lists positions, passing each one exactly once through `normalizer`.
    pub async fn list_portfolio_with<F>(
        &self,
        auth: &str,
        normalizer: F,
    ) -> Result<Vec<Position>, ApiError>
    where
        F: FnMut(&RawPosition, Option<&Instrument>) -> Position,
    {
        let positions = self.brokerage.positions(auth).await?;
        let instruments = self.get_instruments(auth).await?;

        let positions = normalize_all_with(&positions, &instruments, normalizer);
        debug!(
            "{} positions, {} normalized",
            positions.len(),
            positions.iter().filter(|p| p.is_normalized()).count()
        );
        Ok(positions)
    }
}

pub fn normalize_all(positions: &[RawPosition], instruments: &InstrumentMap) -> Vec<Position> {
    normalize_all_with(positions, instruments, normalize)
}

pub fn normalize_all_with<F>(
    positions: &[RawPosition],
    instruments: &InstrumentMap,
    mut normalizer: F,
) -> Vec<Position>
where
    F: FnMut(&RawPosition, Option<&Instrument>) -> Position,
{
    positions
        .iter()
        .map(|position| {
            let instrument = instruments.lookup(&position.ticker).map(Arc::as_ref);
            normalizer(position, instrument)
        })
        .collect()
}
