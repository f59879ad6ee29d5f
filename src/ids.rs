use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

static LAST_ID_MS: AtomicI64 = AtomicI64::new(0);

/// Opaque record id derived from the epoch-millisecond clock, compatible with
/// the ids already in the store. Bumps past the previous value when two calls
/// land in the same millisecond.
pub fn timestamp_id() -> String {
    let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    let mut prev = LAST_ID_MS.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_ID_MS.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(current) => prev = current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_numeric_strings() {
        let id = timestamp_id();
        let ms: i64 = id.parse().expect("id should parse as i64");
        // Past 2020-01-01 in milliseconds.
        assert!(ms > 1_577_836_800_000);
    }

    #[test]
    fn ids_are_unique_within_a_millisecond() {
        let a = timestamp_id();
        let b = timestamp_id();
        let c = timestamp_id();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(a.parse::<i64>().unwrap() < b.parse::<i64>().unwrap());
    }
}
