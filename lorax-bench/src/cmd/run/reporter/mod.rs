mod human;
mod json;

use lorax_bench_lib::{BenchConfig, BenchmarkResult, TargetMode};

use crate::lorax::BASE_MODEL_TARGET;

pub use self::{human::HumanReporter, json::JsonlReporter};

pub trait Reporter: Send + Sync + 'static {
    fn report(&mut self, config: &BenchConfig, result: &BenchmarkResult);
}

pub(super) fn mode_name(config: &BenchConfig) -> &'static str {
    match &config.targets {
        TargetMode::Single(target) if target.as_str() == BASE_MODEL_TARGET => "base",
        TargetMode::Single(_) => "single",
        TargetMode::Multi(_) => "multi",
    }
}

/// Duration in (fractional) milliseconds, microsecond precision.
pub(super) fn as_millis_f64(d: std::time::Duration) -> f64 {
    (d.as_micros() as f64) / 1_000.
}
