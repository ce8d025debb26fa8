use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{error::ApiError, instrument::InstrumentMap, upstream::Brokerage};

pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One complete fetch of the instrument metadata.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub instruments: Arc<InstrumentMap>,
    pub fetched_at: DateTime<Utc>,
}

/// Instrument metadata cache, refreshed lazily once older than its ttl.
///
/// Refreshes are not serialized: concurrent callers that all see a stale snapshot each
/// fetch, and the last one to finish replaces the snapshot.
#[derive(Debug)]
pub struct InstrumentCache<C = SystemClock> {
    ttl: TimeDelta,
    clock: C,
    snapshot: RwLock<Option<Snapshot>>,
}

impl InstrumentCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl Default for InstrumentCache<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<C: Clock> InstrumentCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            snapshot: RwLock::new(None),
        }
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Age of `snapshot` according to the cache's own clock.
    pub fn age_of(&self, snapshot: &Snapshot) -> TimeDelta {
        self.clock.now() - snapshot.fetched_at
    }

    /// Current snapshot if it is younger than the ttl.
    pub async fn fresh_snapshot(&self) -> Option<Snapshot> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .filter(|snapshot| self.age_of(snapshot) < self.ttl)
            .cloned()
    }

    /// Fetches the instrument list and replaces the snapshot wholesale.
    pub async fn refresh<B: Brokerage>(
        &self,
        brokerage: &B,
        auth: &str,
    ) -> Result<Snapshot, ApiError> {
        let instruments = brokerage.instruments(auth).await?;
        let count = instruments.len();

        let snapshot = Snapshot {
            instruments: Arc::new(InstrumentMap::from_instruments(instruments)),
            fetched_at: self.clock.now(),
        };
        *self.snapshot.write().await = Some(snapshot.clone());

        info!(
            "Instrument cache refreshed : {} instruments, {} keys",
            count,
            snapshot.instruments.len()
        );
        Ok(snapshot)
    }

    pub async fn refresh_if_stale<B: Brokerage>(
        &self,
        brokerage: &B,
        auth: &str,
    ) -> Result<Snapshot, ApiError> {
        match self.fresh_snapshot().await {
            Some(snapshot) => {
                debug!("Instrument cache hit, fetched at {}", snapshot.fetched_at);
                Ok(snapshot)
            }
            None => self.refresh(brokerage, auth).await,
        }
    }

    pub async fn get_instruments<B: Brokerage>(
        &self,
        brokerage: &B,
        auth: &str,
    ) -> Result<Arc<InstrumentMap>, ApiError> {
        Ok(self.refresh_if_stale(brokerage, auth).await?.instruments)
    }
}
