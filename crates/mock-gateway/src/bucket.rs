use std::time::Instant;

const MICROS_PER_SECOND: u128 = 1_000_000;

/// Token bucket using integer-only math.
///
/// Tokens are held in micro-units so sub-millisecond refills are not lost.
/// A full bucket admits `capacity` requests back to back; after that it
/// admits `rate` requests per second.
#[derive(Debug)]
pub struct TokenBucket {
    /// Refill rate in tokens per second
    rate: u64,
    /// Maximum tokens that can accumulate (the burst limit)
    capacity: u64,
    /// Current token count in micro-tokens
    tokens: u128,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket.
    pub fn new(rate: u64, capacity: u64) -> Self {
        Self::new_at(rate, capacity, Instant::now())
    }

    fn new_at(rate: u64, capacity: u64, now: Instant) -> Self {
        Self {
            rate,
            capacity,
            tokens: (capacity as u128) * MICROS_PER_SECOND,
            last_refill: now,
        }
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed_micros = now.saturating_duration_since(self.last_refill).as_micros();
        if elapsed_micros == 0 {
            return;
        }

        // rate * elapsed_micros is already in micro-tokens
        let added = (self.rate as u128).saturating_mul(elapsed_micros);
        let max_tokens = (self.capacity as u128) * MICROS_PER_SECOND;
        self.tokens = self.tokens.saturating_add(added).min(max_tokens);
        self.last_refill = now;
    }

    /// Take one token if available.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= MICROS_PER_SECOND {
            self.tokens -= MICROS_PER_SECOND;
            true
        } else {
            false
        }
    }

    /// Whole tokens currently available.
    pub fn remaining(&mut self) -> u64 {
        self.refill(Instant::now());
        (self.tokens / MICROS_PER_SECOND) as u64
    }
}
