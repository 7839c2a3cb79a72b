use std::time::Duration;

use rama::{
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    http::Uri,
    telemetry::tracing,
};

use clap::Args;
use lorax_bench_lib::{BenchConfig, BenchmarkResult, TargetId, run_benchmark};
use tokio::sync::oneshot;

use crate::{
    config::{BenchMode, ClientConfig, Scenario},
    lorax::{AdapterSource, BASE_MODEL_TARGET},
};

pub mod client;
pub mod reporter;

use self::{
    client::{GenerateOptions, LoraxInvoker},
    reporter::*,
};

const DEFAULT_PROMPT: &str = "[INST] Write a short poem about GPUs sharing their memory. [/INST]";

const DEFAULT_REQUESTS: usize = 300;
const DEFAULT_WORKERS: usize = 20;
const DEFAULT_ADAPTERS: usize = 50;

#[derive(Debug, Clone, Args)]
/// run benchmark against a LoRAX generate endpoint
pub struct RunCommand {
    /// uri of the generate endpoint (e.g. http://127.0.0.1:8080/generate)
    #[arg(value_name = "ENDPOINT", required = true)]
    endpoint: Uri,

    /// report json instead of a human-friendly format
    #[arg(long, default_value_t = false)]
    json: bool,

    #[clap(flatten)]
    config: Option<ClientConfig>,

    #[arg(long)]
    /// Scenario to run,
    /// manually defined parameters overwrite scenario parameters.
    scenario: Option<Scenario>,

    /// Prefix of the generated adapter ids (`{prefix}{index}`)
    #[arg(long, default_value = "adapter-")]
    adapter_prefix: String,

    /// Adapter id to use, can be repeated.
    ///
    /// Overwrites the generated adapter ids (and their count).
    #[arg(long = "adapter", value_name = "ID")]
    adapters: Vec<TargetId>,

    /// Where the server has to load the adapters from
    #[arg(long, value_enum, default_value_t = AdapterSource::S3)]
    adapter_source: AdapterSource,

    /// Prompt sent with every request
    #[arg(long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Max amount of tokens to generate per request
    #[arg(long, value_name = "N", default_value_t = 64)]
    max_new_tokens: u32,

    /// Timeout of a single request (e.g. `30s`, `2m`)
    #[arg(long, value_name = "DURATION", default_value = "60s")]
    timeout: humantime::Duration,

    /// Seed for the random adapter selection
    #[arg(long)]
    seed: Option<u64>,
}

pub async fn exec(guard: ShutdownGuard, args: RunCommand) -> Result<(), BoxError> {
    let merged_cfg = merge_client_cfg(args.scenario, args.config);

    let mut bench_config = new_bench_config(&merged_cfg, &args.adapter_prefix, args.adapters);
    bench_config.seed = args.seed;
    bench_config
        .validate()
        .context("validate benchmark configuration")?;

    let timeout: Duration = args.timeout.into();

    tracing::info!(
        endpoint = %args.endpoint,
        total_requests = bench_config.total_requests,
        num_workers = bench_config.num_workers,
        num_targets = bench_config.num_targets(),
        adapter_source = ?args.adapter_source,
        ?timeout,
        "benchmark config ready",
    );

    let invoker = LoraxInvoker::new(
        tokio::runtime::Handle::current(),
        client::http_client(timeout),
        args.endpoint,
        timeout,
        GenerateOptions {
            prompt: args.prompt,
            max_new_tokens: args.max_new_tokens,
            adapter_source: args.adapter_source,
        },
    );

    // a plain thread (instead of the blocking pool) so that
    // an early exit does not wait on the in-flight requests
    let (result_tx, result_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("lorabench-driver".to_owned())
        .spawn({
            let bench_config = bench_config.clone();
            move || {
                let _ = result_tx.send(run_benchmark(&bench_config, &invoker));
            }
        })
        .context("spawn benchmark driver thread")?;

    let result = tokio::select! {
        _ = guard.clone_weak().into_cancelled() => {
            tracing::error!("exit bench runner early: guard shutdown");
            return Ok(());
        }
        result = result_rx => {
            result
                .context("receive benchmark result from driver thread")?
                .context("run benchmark")?
        }
    };

    let mut reporter: Box<dyn Reporter> = if args.json {
        Box::new(JsonlReporter::new())
    } else {
        Box::new(HumanReporter::new())
    };
    reporter.report(&bench_config, &result);

    if result.failed > 0 {
        tracing::warn!(
            failed = result.failed,
            total = result.total_requests,
            "not all benchmark requests succeeded",
        );
    }
    if result.succeeded == 0 {
        return Err(BoxError::from("none of the benchmark requests succeeded")
            .context_field("first_error", first_error(&result)));
    }

    Ok(())
}

fn first_error(result: &BenchmarkResult) -> String {
    result
        .failures
        .first()
        .map(|failure| failure.error.clone())
        .unwrap_or_default()
}

fn new_bench_config(cfg: &ClientConfig, adapter_prefix: &str, adapters: Vec<TargetId>) -> BenchConfig {
    let total_requests = cfg.requests.unwrap_or(DEFAULT_REQUESTS);
    let num_workers = cfg.workers.unwrap_or(DEFAULT_WORKERS);

    let mut adapters = adapters.into_iter();
    match cfg.mode.unwrap_or(BenchMode::Multi) {
        BenchMode::Base => {
            warn_unused_adapters(BenchMode::Base, adapters);
            BenchConfig::single(total_requests, num_workers, TargetId::from(BASE_MODEL_TARGET))
        }
        BenchMode::Single => {
            let target = adapters
                .next()
                .unwrap_or_else(|| TargetId::new(format!("{adapter_prefix}0")));
            warn_unused_adapters(BenchMode::Single, adapters);
            BenchConfig::single(total_requests, num_workers, target)
        }
        BenchMode::Multi => {
            let explicit: Vec<_> = adapters.collect();
            let targets = if explicit.is_empty() {
                TargetId::numbered(
                    adapter_prefix,
                    cfg.adapter_count.unwrap_or(DEFAULT_ADAPTERS),
                )
            } else {
                explicit
            };
            BenchConfig::multi(total_requests, num_workers, targets)
        }
    }
}

fn warn_unused_adapters(mode: BenchMode, adapters: impl Iterator<Item = TargetId>) {
    let unused: Vec<_> = adapters.map(|adapter| adapter.to_string()).collect();
    if !unused.is_empty() {
        tracing::warn!(
            %mode,
            ?unused,
            "explicit adapters are not used in {mode} mode",
        );
    }
}

fn merge_client_cfg(scenario: Option<Scenario>, config: Option<ClientConfig>) -> ClientConfig {
    let scenario_cfg = scenario
        .map(|s| {
            tracing::info!("use scenario to define base config: {s:?}");
            s.client_config()
        })
        .unwrap_or_else(|| {
            tracing::info!("no scenario defined, use default as base config");
            Default::default()
        });

    let overwrite_cfg = config.unwrap_or_default();

    macro_rules! merge_config {
        ($scenario:ident, $overwrite:ident, {$($property:ident),+ $(,)?}) => {
            ClientConfig {
                $(
                    $property: if let Some(value) = $overwrite.$property {
                        tracing::info!("property '{}': use overwrite: {value}", stringify!($property));
                        Some(value)
                    } else if let Some(value) = $scenario.$property {
                        tracing::info!("property '{}': use scenario: {value}", stringify!($property));
                        Some(value)
                    } else {
                        tracing::info!("property '{}': undefined", stringify!($property));
                        None
                    },
                )+
            }
        };
    }

    merge_config!(
        scenario_cfg, overwrite_cfg,
        {
            requests,
            workers,
            adapter_count,
            mode,
        }
    )
}

#[cfg(test)]
mod tests;
