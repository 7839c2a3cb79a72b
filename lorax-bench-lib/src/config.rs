use std::{collections::HashSet, fmt};

use crate::TargetId;

/// Which targets the workers hit during a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMode {
    /// All workers repeatedly hit the same target until the budget is spent.
    Single(TargetId),
    /// Workers pull a uniformly random target among those with quota left.
    /// Each target receives `total_requests / targets.len()` units of work.
    Multi(Vec<TargetId>),
}

/// Configuration of a single benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Total request budget.
    pub total_requests: usize,
    /// Amount of concurrent workers.
    pub num_workers: usize,
    pub targets: TargetMode,
    /// Seed for the random target selection,
    /// a random seed is used if none is defined.
    pub seed: Option<u64>,
}

impl BenchConfig {
    pub fn single(total_requests: usize, num_workers: usize, target: TargetId) -> Self {
        Self {
            total_requests,
            num_workers,
            targets: TargetMode::Single(target),
            seed: None,
        }
    }

    pub fn multi(
        total_requests: usize,
        num_workers: usize,
        targets: impl IntoIterator<Item = TargetId>,
    ) -> Self {
        Self {
            total_requests,
            num_workers,
            targets: TargetMode::Multi(targets.into_iter().collect()),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn num_targets(&self) -> usize {
        match &self.targets {
            TargetMode::Single(_) => 1,
            TargetMode::Multi(targets) => targets.len(),
        }
    }

    /// Quota each target starts with.
    ///
    /// In multi-target mode the budget is divided with integer division,
    /// the residual is never claimed.
    pub fn per_target_quota(&self) -> usize {
        match &self.targets {
            TargetMode::Single(_) => self.total_requests,
            TargetMode::Multi(targets) => self
                .total_requests
                .checked_div(targets.len())
                .unwrap_or_default(),
        }
    }

    /// Amount of requests a run with this config will issue.
    pub fn claimable_requests(&self) -> usize {
        self.per_target_quota() * self.num_targets()
    }

    /// Reject configurations that would hang the driver
    /// or produce a vacuous run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.total_requests == 0 {
            return Err(ConfigError::NoRequests);
        }

        if let TargetMode::Multi(targets) = &self.targets {
            if targets.is_empty() {
                return Err(ConfigError::NoTargets);
            }

            let mut seen = HashSet::with_capacity(targets.len());
            if let Some(duplicate) = targets.iter().find(|target| !seen.insert(*target)) {
                return Err(ConfigError::DuplicateTarget(duplicate.clone()));
            }

            if self.total_requests < targets.len() {
                return Err(ConfigError::BudgetBelowTargetCount {
                    budget: self.total_requests,
                    targets: targets.len(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum ConfigError {
    NoWorkers,
    NoRequests,
    NoTargets,
    DuplicateTarget(TargetId),
    BudgetBelowTargetCount { budget: usize, targets: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoWorkers => write!(f, "ConfigError: at least one worker is required"),
            ConfigError::NoRequests => {
                write!(f, "ConfigError: total request budget has to be positive")
            }
            ConfigError::NoTargets => {
                write!(f, "ConfigError: multi-target mode requires at least one target")
            }
            ConfigError::DuplicateTarget(target) => {
                write!(f, "ConfigError: target '{target}' is defined more than once")
            }
            ConfigError::BudgetBelowTargetCount { budget, targets } => write!(
                f,
                "ConfigError: request budget ({budget}) is smaller than the amount of targets ({targets})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
