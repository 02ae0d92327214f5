use crate::error::Result;
use crate::policy::rate_interval;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Global request spacing: consecutive permits are handed out at least
/// `1 / rate` seconds apart, no matter how many workers ask.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn per_second(rate: f64) -> Result<Self> {
        Ok(Self {
            interval: rate_interval(rate)?,
            next_slot: Mutex::new(None),
        })
    }

    /// Reserve the next slot, then sleep until it arrives.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            // past the clock's range the next slot is unreachable anyway
            *next = Some(slot.checked_add(self.interval).unwrap_or(slot));
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}
