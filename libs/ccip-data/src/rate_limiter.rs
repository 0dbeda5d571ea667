//! Token bucket model of an on-chain rate limiter.

use common::interfaces::offramp_v1_0_0::EVM2EVMOffRampV1_0_0;
use common::interfaces::offramp_v1_2_0::EVM2EVMOffRampV1_2_0;
use common::interfaces::token_pool::ITokenPoolV1_2_0;
use serde::{Deserialize, Serialize};

/// Snapshot of a token bucket as last written on-chain.
///
/// The layer never mutates it, it only projects the fill level forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimiterState {
    pub tokens: u128,
    /// Unix seconds of the last on-chain update
    pub last_updated: u32,
    pub is_enabled: bool,
    pub capacity: u128,
    /// Tokens refilled per second
    pub rate: u128,
}

impl RateLimiterState {
    /// Tokens available at unix time `now`.
    ///
    /// A disabled bucket never limits, so it reports full capacity.
    pub fn tokens_at(&self, now: u64) -> u128 {
        if !self.is_enabled {
            return self.capacity;
        }
        let last_updated = u64::from(self.last_updated);
        if now <= last_updated {
            return self.tokens.min(self.capacity);
        }
        let refill = self.rate.saturating_mul(u128::from(now - last_updated));
        self.tokens.saturating_add(refill).min(self.capacity)
    }

    /// Whether `amount` could be released at `now`.
    pub fn can_consume(&self, amount: u128, now: u64) -> bool {
        amount <= self.tokens_at(now)
    }
}

impl From<EVM2EVMOffRampV1_0_0::TokenBucket> for RateLimiterState {
    fn from(bucket: EVM2EVMOffRampV1_0_0::TokenBucket) -> Self {
        Self {
            tokens: bucket.tokens,
            last_updated: bucket.lastUpdated,
            is_enabled: bucket.isEnabled,
            capacity: bucket.capacity,
            rate: bucket.rate,
        }
    }
}

impl From<EVM2EVMOffRampV1_2_0::TokenBucket> for RateLimiterState {
    fn from(bucket: EVM2EVMOffRampV1_2_0::TokenBucket) -> Self {
        Self {
            tokens: bucket.tokens,
            last_updated: bucket.lastUpdated,
            is_enabled: bucket.isEnabled,
            capacity: bucket.capacity,
            rate: bucket.rate,
        }
    }
}

impl From<ITokenPoolV1_2_0::TokenBucket> for RateLimiterState {
    fn from(bucket: ITokenPoolV1_2_0::TokenBucket) -> Self {
        Self {
            tokens: bucket.tokens,
            last_updated: bucket.lastUpdated,
            is_enabled: bucket.isEnabled,
            capacity: bucket.capacity,
            rate: bucket.rate,
        }
    }
}
