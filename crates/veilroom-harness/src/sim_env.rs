//! Simulated environment.
//!
//! Randomness comes from a ChaCha20 stream seeded by the test, so keys, IVs
//! and room ids repeat exactly between runs. Time is virtual: it only moves
//! when a test calls [`SimEnv::advance`] or something sleeps.

use std::{
    ops::Sub,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use veilroom_core::env::Environment;

/// 2025-01-01T00:00:00Z
const SIM_EPOCH_SECS: i64 = 1_735_689_600;

/// Virtual monotonic instant (time since simulation start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(Duration);

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Deterministic [`Environment`].
#[derive(Debug, Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha20Rng>>,
    elapsed: Arc<Mutex<Duration>>,
    epoch: DateTime<Utc>,
}

impl SimEnv {
    /// Environment seeded with `seed`, starting at 2025-01-01T00:00:00Z.
    pub fn with_seed(seed: u64) -> Self {
        let epoch = DateTime::from_timestamp(SIM_EPOCH_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            epoch,
        }
    }

    /// Move virtual time forward.
    pub fn advance(&self, by: Duration) {
        *lock(&self.elapsed) += by;
    }

    /// Virtual time since the simulation started.
    pub fn elapsed(&self) -> Duration {
        *lock(&self.elapsed)
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.elapsed()).unwrap_or(TimeDelta::zero());
        self.epoch + elapsed
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        lock(&self.rng).fill_bytes(buffer);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);
        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.random_bytes(&mut x);
        b.random_bytes(&mut y);
        assert_eq!(x, y);
    }

    #[test]
    fn clones_share_the_stream() {
        let a = SimEnv::with_seed(7);
        let b = a.clone();
        let (mut x, mut y) = ([0u8; 16], [0u8; 16]);
        a.random_bytes(&mut x);
        b.random_bytes(&mut y);
        assert_ne!(x, y);
    }

    #[test]
    fn wall_clock_follows_virtual_time() {
        let env = SimEnv::with_seed(1);
        let start = env.wall_clock();
        let t0 = env.now();
        env.advance(Duration::from_millis(1500));
        assert_eq!((env.wall_clock() - start).num_milliseconds(), 1500);
        assert_eq!(env.now() - t0, Duration::from_millis(1500));
    }
}
