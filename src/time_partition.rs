//! Time keys for stored commits
//!
//! Rows are keyed by a version-1 UUID built from the commit timestamp, so ids
//! sort by time, and carry the label of the fixed-width time bucket they fall
//! in so queries over a date window can prune whole partitions.

use anyhow::{Context, Result};
use chrono::DateTime;
use sha2::{Digest, Sha256};
use uuid::{NoContext, Timestamp, Uuid};

const SECONDS_PER_DAY: i64 = 86_400;

/// Build a time-based UUID for a commit.
///
/// The timestamp field comes from `date` (RFC 3339). The node field is taken
/// from the SHA-256 of the commit hash, so the same commit always maps to the
/// same id and re-loading a repository overwrites instead of duplicating.
pub fn uuid_from_time(date: &str, commit_hash: &str) -> Result<Uuid> {
    let parsed = DateTime::parse_from_rfc3339(date)
        .with_context(|| format!("Invalid commit date: {}", date))?;

    // UUIDv1 cannot represent pre-1970 times through the Unix constructor
    let seconds = parsed.timestamp().max(0) as u64;
    let nanos = parsed.timestamp_subsec_nanos();

    let digest = Sha256::digest(commit_hash.as_bytes());
    let mut node_id = [0u8; 6];
    node_id.copy_from_slice(&digest[..6]);

    let ts = Timestamp::from_unix(NoContext, seconds, nanos);
    Ok(Uuid::new_v1(ts, &node_id))
}

/// Assigns commits to epoch-aligned buckets of a fixed number of days
#[derive(Debug, Clone, Copy)]
pub struct TimePartitioner {
    interval_secs: i64,
}

impl TimePartitioner {
    pub fn new(interval_days: u32) -> Self {
        Self {
            interval_secs: i64::from(interval_days.max(1)) * SECONDS_PER_DAY,
        }
    }

    pub fn interval_days(&self) -> i64 {
        self.interval_secs / SECONDS_PER_DAY
    }

    /// Unix start of the bucket holding `committed_at`
    pub fn bucket_start(&self, committed_at: i64) -> i64 {
        committed_at.div_euclid(self.interval_secs) * self.interval_secs
    }

    /// Bucket label: the UTC start date as `YYYY-MM-DD`
    pub fn bucket(&self, committed_at: i64) -> String {
        let start = self.bucket_start(committed_at);
        DateTime::from_timestamp(start, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| start.to_string())
    }
}

impl Default for TimePartitioner {
    fn default() -> Self {
        Self::new(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH_A: &str = "0123456789abcdef0123456789abcdef01234567";
    const HASH_B: &str = "fedcba9876543210fedcba9876543210fedcba98";

    #[test]
    fn test_uuid_is_version_one() {
        let id = uuid_from_time("2024-01-01T00:00:00+00:00", HASH_A).unwrap();
        assert_eq!(id.get_version_num(), 1);
    }

    #[test]
    fn test_uuid_encodes_commit_time() {
        let id = uuid_from_time("2024-01-01T02:00:00+02:00", HASH_A).unwrap();
        let (secs, _nanos) = id.get_timestamp().unwrap().to_unix();
        assert_eq!(secs, 1_704_067_200);
    }

    #[test]
    fn test_uuid_is_deterministic_per_commit() {
        let a1 = uuid_from_time("2024-01-01T00:00:00+00:00", HASH_A).unwrap();
        let a2 = uuid_from_time("2024-01-01T00:00:00+00:00", HASH_A).unwrap();
        let b = uuid_from_time("2024-01-01T00:00:00+00:00", HASH_B).unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b, "same second, different commit must not collide");
    }

    #[test]
    fn test_uuid_rejects_bad_date() {
        assert!(uuid_from_time("yesterday", HASH_A).is_err());
    }

    #[test]
    fn test_uuid_clamps_pre_epoch_dates() {
        let id = uuid_from_time("1969-12-31T23:59:59+00:00", HASH_A).unwrap();
        let (secs, _) = id.get_timestamp().unwrap().to_unix();
        assert_eq!(secs, 0);
    }

    #[test]
    fn test_weekly_buckets_are_epoch_aligned() {
        let partitioner = TimePartitioner::default();
        assert_eq!(partitioner.interval_days(), 7);
        // The Unix epoch was a Thursday, so weekly buckets start on Thursdays
        assert_eq!(partitioner.bucket(0), "1970-01-01");
        // 2024-01-01 (Monday) falls in the bucket starting Thursday 2023-12-28
        assert_eq!(partitioner.bucket(1_704_067_200), "2023-12-28");
        assert_eq!(partitioner.bucket(1_704_067_200 + 3 * 86_400), "2024-01-04");
    }

    #[test]
    fn test_bucket_boundaries() {
        let partitioner = TimePartitioner::new(1);
        let midnight = 1_704_067_200;
        assert_eq!(partitioner.bucket(midnight - 1), "2023-12-31");
        assert_eq!(partitioner.bucket(midnight), "2024-01-01");
        assert_eq!(partitioner.bucket_start(midnight + 500), midnight);
    }

    #[test]
    fn test_negative_timestamps_round_down() {
        let partitioner = TimePartitioner::new(1);
        assert_eq!(partitioner.bucket_start(-1), -86_400);
        assert_eq!(partitioner.bucket(-1), "1969-12-31");
    }
}
