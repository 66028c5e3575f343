//! Cost-based throttle inspection.
//!
//! Admin API responses carry
//! `extensions.cost.throttleStatus {maximumAvailable, currentlyAvailable, restoreRate}`.

use std::collections::HashMap;

use serde::Deserialize;

/// Fraction of the bucket below which a warning is logged.
pub const LOW_BUDGET_RATIO: f64 = 0.1;

/// Throttle bucket state reported with a single response. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub currently_available: f64,
    pub maximum_available: f64,
    #[serde(rename = "restoreRate")]
    pub restore_rate_per_second: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cost {
    throttle_status: Option<RateLimitStatus>,
}

impl RateLimitStatus {
    /// Read the throttle status out of a response's `extensions` map.
    #[must_use]
    pub fn from_extensions(extensions: &HashMap<String, serde_json::Value>) -> Option<Self> {
        let cost = extensions.get("cost")?;
        serde_json::from_value::<Cost>(cost.clone())
            .ok()
            .and_then(|c| c.throttle_status)
    }

    /// The bucket is empty; data must not be returned.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.currently_available <= 0.0
    }

    /// Less than [`LOW_BUDGET_RATIO`] of the bucket remains.
    #[must_use]
    pub fn is_low(&self) -> bool {
        self.currently_available < LOW_BUDGET_RATIO * self.maximum_available
    }

    /// Seconds until the bucket refills: `ceil((max - current) / restoreRate)`.
    ///
    /// A non-positive restore rate yields 1 so callers always back off.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn retry_after_secs(&self) -> u64 {
        if self.restore_rate_per_second <= 0.0 {
            return 1;
        }
        let missing = (self.maximum_available - self.currently_available).max(0.0);
        (missing / self.restore_rate_per_second).ceil().max(1.0) as u64
    }
}
