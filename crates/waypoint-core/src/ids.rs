//! Item id generation.
//!
//! The engine asks an [`IdGenerator`] for a fresh id whenever an `/add`
//! arrives without one, and writes the id into the canonical journal line.
//! Replay therefore never generates ids.

use std::sync::atomic::{AtomicU64, Ordering};

use jiff::Timestamp;

/// Source of item ids.
pub trait IdGenerator: Send + Sync {
    /// Returns an id not previously returned by this generator.
    fn next(&self) -> String;
}

/// Production generator: microseconds since the epoch, forced strictly
/// increasing within the process, rendered in base 36.
#[derive(Debug, Default)]
pub struct ClockIds {
    last: AtomicU64,
}

impl ClockIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for ClockIds {
    fn next(&self) -> String {
        let now = u64::try_from(Timestamp::now().as_microsecond()).unwrap_or(0);
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(previous + 1);
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return base36(candidate),
                Err(actual) => previous = actual,
            }
        }
    }
}

/// Deterministic generator yielding `1`, `2`, `3`, ...
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
