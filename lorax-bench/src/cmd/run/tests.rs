use std::convert::Infallible;

use rama::{
    Service,
    http::{Request, Response, Uri},
};
use tokio::runtime::Handle;
use tracing_test::traced_test;

use lorax_bench_lib::TargetMode;

use crate::{
    cmd::mock::{MockSettings, MockState, web_svc},
    config::ServerConfig,
};

use super::*;

#[test]
fn test_merge_client_cfg_defaults_to_nothing() {
    let cfg = merge_client_cfg(None, None);
    assert_eq!(cfg.requests, None);
    assert_eq!(cfg.workers, None);
    assert_eq!(cfg.adapter_count, None);
    assert_eq!(cfg.mode, None);
}

#[test]
#[traced_test]
fn test_merge_client_cfg_overwrite_wins() {
    let cfg = merge_client_cfg(
        Some(Scenario::RandomAdapters),
        Some(ClientConfig {
            requests: Some(1000),
            workers: None,
            adapter_count: Some(10),
            mode: None,
        }),
    );
    assert_eq!(cfg.requests, Some(1000));
    assert_eq!(cfg.workers, Some(20));
    assert_eq!(cfg.adapter_count, Some(10));
    assert_eq!(cfg.mode, Some(BenchMode::Multi));

    assert!(logs_contain("property 'requests': use overwrite: 1000"));
    assert!(logs_contain("property 'workers': use scenario: 20"));
    assert!(logs_contain("property 'mode': use scenario: multi"));
}

#[test]
fn test_new_bench_config_defaults() {
    let config = new_bench_config(&ClientConfig::default(), "adapter-", Vec::new());
    assert_eq!(config.total_requests, DEFAULT_REQUESTS);
    assert_eq!(config.num_workers, DEFAULT_WORKERS);
    assert_eq!(config.num_targets(), DEFAULT_ADAPTERS);
    assert_eq!(
        config.targets,
        TargetMode::Multi(TargetId::numbered("adapter-", DEFAULT_ADAPTERS))
    );
    assert!(config.validate().is_ok());
}

#[test]
#[traced_test]
fn test_new_bench_config_base_model() {
    let config = new_bench_config(&Scenario::BaseModel.client_config(), "adapter-", Vec::new());
    assert_eq!(
        config.targets,
        TargetMode::Single(TargetId::from(BASE_MODEL_TARGET))
    );
    assert!(!logs_contain("explicit adapters are not used"));
}

#[test]
#[traced_test]
fn test_new_bench_config_base_model_warns_on_explicit_adapters() {
    let config = new_bench_config(
        &Scenario::BaseModel.client_config(),
        "adapter-",
        vec![TargetId::from("my-org/adapter-a")],
    );
    assert_eq!(
        config.targets,
        TargetMode::Single(TargetId::from(BASE_MODEL_TARGET))
    );
    assert!(logs_contain("explicit adapters are not used in base mode"));
    assert!(logs_contain("my-org/adapter-a"));
}

#[test]
#[traced_test]
fn test_new_bench_config_single_adapter() {
    let cfg = Scenario::SingleAdapter.client_config();

    let config = new_bench_config(&cfg, "lora/", Vec::new());
    assert_eq!(config.targets, TargetMode::Single(TargetId::from("lora/0")));

    let config = new_bench_config(
        &cfg,
        "lora/",
        vec![TargetId::from("s3://bucket/a"), TargetId::from("s3://bucket/b")],
    );
    assert_eq!(
        config.targets,
        TargetMode::Single(TargetId::from("s3://bucket/a"))
    );
    assert!(logs_contain("explicit adapters are not used in single mode"));
    assert!(logs_contain("s3://bucket/b"));
}

#[test]
fn test_new_bench_config_explicit_adapters() {
    let cfg = ClientConfig {
        requests: Some(10),
        workers: Some(2),
        adapter_count: Some(50),
        mode: Some(BenchMode::Multi),
    };
    let adapters = vec![TargetId::from("a"), TargetId::from("b")];
    let config = new_bench_config(&cfg, "adapter-", adapters.clone());
    assert_eq!(config.total_requests, 10);
    assert_eq!(config.num_workers, 2);
    assert_eq!(config.targets, TargetMode::Multi(adapters));
}

fn mock_invoker(
    error_rate: f64,
) -> LoraxInvoker<impl Service<Request, Output = Response, Error = Infallible>> {
    let settings = MockSettings::try_from_config(ServerConfig {
        base_latency: Some(0.),
        jitter: Some(0.),
        adapter_load_latency: Some(0.),
        max_loaded_adapters: Some(2),
        error_rate: Some(error_rate),
    })
    .unwrap();

    LoraxInvoker::new(
        Handle::current(),
        web_svc(MockState::new(settings)),
        Uri::from_static("http://mock.local/generate"),
        Duration::from_secs(10),
        GenerateOptions {
            prompt: DEFAULT_PROMPT.to_owned(),
            max_new_tokens: 8,
            adapter_source: AdapterSource::Local,
        },
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_benchmark_against_mock_server() {
    let invoker = mock_invoker(0.);
    let config = BenchConfig::multi(40, 4, TargetId::numbered("adapter-", 5)).with_seed(7);

    let result = tokio::task::spawn_blocking(move || run_benchmark(&config, &invoker))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.total_requests, 40);
    assert_eq!(result.succeeded, 40);
    assert_eq!(result.failed, 0);
    assert_eq!(result.per_target.len(), 5);
    for summary in &result.per_target {
        assert_eq!(summary.requests, 8, "target: {}", summary.target);
    }
    assert_eq!(first_error(&result), "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_benchmark_against_failing_mock_server() {
    let invoker = mock_invoker(1.);
    let config = BenchConfig::single(6, 2, TargetId::from(BASE_MODEL_TARGET));

    let result = tokio::task::spawn_blocking(move || run_benchmark(&config, &invoker))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.total_requests, 6);
    assert_eq!(result.succeeded, 0);
    assert_eq!(result.failed, 6);
    assert_eq!(result.failures.len(), 6);
    assert!(!first_error(&result).is_empty());
}
