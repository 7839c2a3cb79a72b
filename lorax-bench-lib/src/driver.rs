use std::{fmt, thread, time::Instant};

use rama::telemetry::tracing;

use crate::{
    BenchConfig, BenchmarkResult, ConfigError, Invoke, LatencyRecord, WorkPool,
    worker::run_worker,
};


/// Run a benchmark to completion.
///
/// Spawns exactly `config.num_workers` OS threads which drain a freshly
/// created [`WorkPool`] through the given invoker. This call only returns
/// once every worker has been joined. The configuration is validated prior
/// to any thread being started.
pub fn run_benchmark<I>(config: &BenchConfig, invoker: &I) -> Result<BenchmarkResult, BenchError>
where
    I: Invoke + ?Sized,
{
    config.validate().map_err(BenchError::InvalidConfig)?;

    let pool = WorkPool::new(config);

    tracing::info!(
        total_requests = config.total_requests,
        claimable_requests = config.claimable_requests(),
        num_targets = config.num_targets(),
        num_workers = config.num_workers,
        seed = ?config.seed,
        "starting benchmark run",
    );

    let start = Instant::now();
    let records = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.num_workers);
        for worker in 0..config.num_workers {
            let pool = &pool;
            let spawned = thread::Builder::new()
                .name(format!("lorabench-worker-{worker}"))
                .spawn_scoped(scope, move || run_worker(worker, pool, invoker));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    // already running workers stop after their in-flight request
                    pool.close();
                    tracing::error!(
                        worker,
                        spawned = handles.len(),
                        "failed to spawn bench worker, work pool closed: {source}"
                    );
                    return Err(BenchError::SpawnWorker { worker, source });
                }
            }
        }

        // join all workers before looking at the results,
        // a panicked worker that is left unjoined would panic the scope
        let joined: Vec<_> = handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .map_err(|_| BenchError::WorkerPanicked { worker })
            })
            .collect();
        joined
            .into_iter()
            .collect::<Result<Vec<LatencyRecord>, BenchError>>()
    })?;
    let total_time = start.elapsed();

    let result = BenchmarkResult::from_records(&records, total_time);

    tracing::info!(
        total_requests = result.total_requests,
        failed = result.failed,
        ?total_time,
        mean_latency = ?result.mean_latency,
        throughput = result.throughput,
        "benchmark run finished",
    );

    Ok(result)
}

#[derive(Debug)]
pub enum BenchError {
    InvalidConfig(ConfigError),
    SpawnWorker {
        worker: usize,
        source: std::io::Error,
    },
    WorkerPanicked {
        worker: usize,
    },
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::InvalidConfig(err) => write!(f, "BenchError: invalid config: {err}"),
            BenchError::SpawnWorker { worker, source } => {
                write!(f, "BenchError: failed to spawn worker #{worker}: {source}")
            }
            BenchError::WorkerPanicked { worker } => {
                write!(f, "BenchError: worker #{worker} panicked")
            }
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::InvalidConfig(err) => Some(err),
            BenchError::SpawnWorker { source, .. } => Some(source),
            BenchError::WorkerPanicked { .. } => None,
        }
    }
}
