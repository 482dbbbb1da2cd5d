use serde::{Deserialize, Serialize};

/// Default number of concurrent ranges
pub const MAX_THREAD_COUNT: usize = 6;

/// A contiguous slice `[skip, skip + count)` of the commit walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRange {
    pub skip: usize,
    pub count: usize,
}

impl CommitRange {
    /// Worker name, used for spans and reports
    pub fn name(&self) -> String {
        format!("Thread_skip_{}_{}", self.skip, self.count)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Split `total` commits into `max_workers` contiguous ranges.
///
/// Every range but the last gets `total / max_workers` commits; the last
/// also takes the remainder. Counts always sum to `total`. With fewer
/// commits than workers the leading ranges are empty.
pub fn plan_workloads(total: usize, max_workers: usize) -> Vec<CommitRange> {
    let workers = max_workers.max(1);
    let per = total / workers;
    let rem = total % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut skip = 0;
    for i in 0..workers {
        let count = if i + 1 == workers { per + rem } else { per };
        ranges.push(CommitRange { skip, count });
        skip += count;
    }
    ranges
}
