#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

//! Concurrent benchmark driver.
//!
//! A fixed pool of worker threads drains a shared [`WorkPool`] of target
//! (adapter) identifiers, issues one blocking request per claimed unit of work
//! through an [`Invoke`] implementation and records the latency of every
//! attempt. Once all workers have been joined the records are folded into a
//! [`BenchmarkResult`].

pub mod config;
pub mod driver;
pub mod invoke;
pub mod pool;
pub mod result;
pub mod target;
pub mod worker;

pub use self::{
    config::{BenchConfig, ConfigError, TargetMode},
    driver::{BenchError, run_benchmark},
    invoke::Invoke,
    pool::WorkPool,
    result::{BenchmarkResult, FailureRecord, TargetSummary},
    target::TargetId,
    worker::{LatencyRecord, Outcome, Sample},
};
