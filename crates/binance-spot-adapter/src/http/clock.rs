/*
[INPUT]:  Exchange server time samples and the local wall clock
[OUTPUT]: Clock offset and exchange-aligned request timestamps
[POS]:    HTTP layer - clock synchronization for signed requests
[UPDATE]: When changing how offsets are measured or applied
*/

use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};

use crate::http::{BinanceError, Result};

/// Local wall clock in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Thread-safe offset between the exchange clock and the local clock.
///
/// Concurrent synchronizations race benignly: the last write wins.
#[derive(Debug, Clone, Default)]
pub struct ClockSync {
    offset_ms: Arc<RwLock<Option<i64>>>,
}

impl ClockSync {
    /// Create an unsynchronized clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a server time sample taken at local time `local_ms`
    pub fn record(&self, server_time_ms: i64, local_ms: i64) -> i64 {
        let offset = server_time_ms - local_ms;
        self.set_offset(offset);
        offset
    }

    /// Overwrite the offset directly
    pub fn set_offset(&self, offset_ms: i64) {
        let mut guard = self.offset_ms.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(offset_ms);
    }

    /// Current offset, `None` until the first synchronization
    pub fn offset(&self) -> Option<i64> {
        *self.offset_ms.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an offset was ever established
    pub fn is_synced(&self) -> bool {
        self.offset().is_some()
    }

    /// Exchange-aligned timestamp: `now + offset`
    pub fn timestamp(&self) -> Result<i64> {
        self.offset()
            .map(|offset| now_ms() + offset)
            .ok_or(BinanceError::ClockNotSynced)
    }
}
