//! Dossier id generation and timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix shared by every dossier id.
pub const DOSSIER_ID_PREFIX: &str = "DOS-";

/// Source of new dossier ids.
pub trait DossierIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Last value handed out by any [`TimestampIdGenerator`] in the process.
static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Last value handed out by any [`SystemClock`] in the process.
static LAST_CLOCK_MICROS: AtomicI64 = AtomicI64::new(0);

/// `DOS-<unix millis>`, strictly increasing within the process.
///
/// Every instance draws from the same counter, so services built
/// independently never hand out the same id. Two sessions of the same user
/// in different processes can still collide within one millisecond; the
/// repository's create-only write reports that as `AlreadyExists` instead
/// of overwriting.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampIdGenerator;

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl DossierIdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> String {
        let millis = next_monotonic(&LAST_ID_MILLIS, Utc::now().timestamp_millis());
        format!("{}{}", DOSSIER_ID_PREFIX, millis)
    }
}

/// `DOS-<uuid v4, simple form>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl DossierIdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        format!("{}{}", DOSSIER_ID_PREFIX, Uuid::new_v4().simple())
    }
}

/// Time source for `created_at` / `updated_at`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock truncated to microseconds (the document store's precision)
/// and strictly increasing across every instance in the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let micros = next_monotonic(&LAST_CLOCK_MICROS, Utc::now().timestamp_micros());
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}

/// Returns `max(candidate, last + 1)` and stores it.
fn next_monotonic(last: &AtomicI64, candidate: i64) -> i64 {
    let mut previous = last.load(Ordering::Relaxed);
    loop {
        let next = candidate.max(previous + 1);
        match last.compare_exchange_weak(previous, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => previous = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_timestamp_ids_are_unique_and_numeric() {
        let generator = TimestampIdGenerator::new();
        let ids: Vec<String> = (0..500).map(|_| generator.next_id()).collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        for id in &ids {
            let digits = id.strip_prefix(DOSSIER_ID_PREFIX).unwrap();
            assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_uuid_ids() {
        let id = UuidIdGenerator.next_id();
        assert!(id.starts_with(DOSSIER_ID_PREFIX));
        assert_eq!(id.len(), DOSSIER_ID_PREFIX.len() + 32);
    }

    #[test]
    fn test_clock_strictly_increasing() {
        let clock = SystemClock::new();
        let mut previous = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > previous);
            assert_eq!(next.timestamp_subsec_nanos() % 1_000, 0);
            previous = next;
        }
    }

    #[test]
    fn test_separate_generators_share_sequence() {
        let first = TimestampIdGenerator::new();
        let second = TimestampIdGenerator::new();
        let mut seen = HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(first.next_id()));
            assert!(seen.insert(second.next_id()));
        }
    }

    #[test]
    fn test_separate_clocks_interleave_increasing() {
        let first = SystemClock::new();
        let second = SystemClock::new();
        let mut previous = first.now();
        for _ in 0..500 {
            let a = second.now();
            let b = first.now();
            assert!(a > previous);
            assert!(b > a);
            previous = b;
        }
    }

    #[test]
    fn test_generators_on_threads_stay_unique() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    let generator = TimestampIdGenerator::new();
                    (0..100).map(|_| generator.next_id()).collect::<Vec<_>>()
                })
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
