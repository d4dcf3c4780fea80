//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified messages per second
pub fn create_limiter(messages_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(messages_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Inbound message quota for the remote peer. Replication runs at 10/s and
/// events are one-shot, so anything past this is a misbehaving peer.
pub const INBOUND_RATE_LIMIT: u32 = 30;

/// Inbound rate limiter state for the remote peer
#[derive(Clone)]
pub struct PeerRateLimiter {
    inbound_limiter: Arc<Limiter>,
}

impl PeerRateLimiter {
    pub fn new() -> Self {
        Self {
            inbound_limiter: create_limiter(INBOUND_RATE_LIMIT),
        }
    }

    /// Check if an inbound message is allowed (returns true if allowed)
    pub fn check_inbound(&self) -> bool {
        self.inbound_limiter.check().is_ok()
    }
}

impl Default for PeerRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
