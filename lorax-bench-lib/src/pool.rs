use parking_lot::Mutex;
use rand::{RngExt as _, SeedableRng as _, rngs::StdRng};

use crate::{BenchConfig, TargetId, TargetMode};

/// Shared work queue drained by the benchmark workers.
///
/// All state lives behind a single lock which is only held
/// for the duration of a claim. Remaining counts only ever decrease,
/// once the pool is exhausted it stays exhausted.
pub struct WorkPool {
    state: Mutex<PoolState>,
}

struct PoolState {
    quota: Quota,
    rng: StdRng,
}

enum Quota {
    Single { target: TargetId, remaining: usize },
    Multi { counters: Vec<(TargetId, usize)> },
}

impl std::fmt::Debug for WorkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkPool")
            .field("remaining", &self.remaining())
            .finish()
    }
}

impl WorkPool {
    /// Create the pool for the given config.
    ///
    /// The config is expected to be validated already,
    /// an invalid config results in an empty (exhausted) pool.
    pub fn new(config: &BenchConfig) -> Self {
        let quota = match &config.targets {
            TargetMode::Single(target) => Quota::Single {
                target: target.clone(),
                remaining: config.total_requests,
            },
            TargetMode::Multi(targets) => {
                let per_target = config.per_target_quota();
                Quota::Multi {
                    counters: targets
                        .iter()
                        .map(|target| (target.clone(), per_target))
                        .collect(),
                }
            }
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };

        Self {
            state: Mutex::new(PoolState { quota, rng }),
        }
    }

    /// Reserve one unit of work, `None` once the pool is exhausted.
    pub fn claim_next(&self) -> Option<TargetId> {
        let mut state = self.state.lock();
        let PoolState { quota, rng } = &mut *state;

        match quota {
            Quota::Single { target, remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                Some(target.clone())
            }
            Quota::Multi { counters } => {
                let eligible = counters
                    .iter()
                    .filter(|(_, remaining)| *remaining > 0)
                    .count();
                if eligible == 0 {
                    return None;
                }

                let pick = rng.random_range(0..eligible);
                let (target, remaining) = counters
                    .iter_mut()
                    .filter(|(_, remaining)| *remaining > 0)
                    .nth(pick)?;
                *remaining -= 1;
                Some(target.clone())
            }
        }
    }

    /// Sum of all remaining counts.
    pub fn remaining(&self) -> usize {
        match &self.state.lock().quota {
            Quota::Single { remaining, .. } => *remaining,
            Quota::Multi { counters } => counters.iter().map(|(_, remaining)| remaining).sum(),
        }
    }

    /// Snapshot of the remaining count per target, in configuration order.
    pub fn remaining_per_target(&self) -> Vec<(TargetId, usize)> {
        match &self.state.lock().quota {
            Quota::Single { target, remaining } => vec![(target.clone(), *remaining)],
            Quota::Multi { counters } => counters.clone(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Drop all remaining work, exhausting the pool.
    ///
    /// Requests already claimed are unaffected,
    /// workers stop at their next claim.
    pub fn close(&self) {
        match &mut self.state.lock().quota {
            Quota::Single { remaining, .. } => *remaining = 0,
            Quota::Multi { counters } => {
                for (_, remaining) in counters.iter_mut() {
                    *remaining = 0;
                }
            }
        }
    }
}
