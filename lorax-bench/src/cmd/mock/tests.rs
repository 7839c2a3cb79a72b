use rama::http::{
    Body, BodyExtractExt as _, Method, Request, StatusCode, header::CONTENT_TYPE,
};

use lorax_bench_lib::TargetId;

use crate::lorax::{AdapterSource, BASE_MODEL_TARGET};

use super::*;

fn instant_settings(max_loaded_adapters: usize, error_rate: f64) -> MockSettings {
    MockSettings {
        base_latency: 0.,
        jitter: 0.,
        adapter_load_latency: 0.,
        max_loaded_adapters,
        error_rate,
    }
}

fn generate_request(target: &str) -> Request {
    let payload = GenerateRequest::new("hello", 16, &TargetId::from(target), AdapterSource::Hub);
    Request::builder()
        .method(Method::POST)
        .uri("http://mock.local/generate")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap()
}

async fn fetch_stats(svc: &impl Service<Request, Output = Response, Error = Infallible>) -> serde_json::Value {
    let req = Request::builder()
        .uri("http://mock.local/stats")
        .body(Body::empty())
        .unwrap();
    svc.serve(req).await.unwrap().try_into_json().await.unwrap()
}

#[test]
fn test_settings_defaults() {
    let settings = MockSettings::try_from_config(ServerConfig::default()).unwrap();
    assert_eq!(settings.base_latency, DEFAULT_BASE_LATENCY);
    assert_eq!(settings.jitter, DEFAULT_JITTER);
    assert_eq!(settings.adapter_load_latency, DEFAULT_ADAPTER_LOAD_LATENCY);
    assert_eq!(settings.max_loaded_adapters, DEFAULT_MAX_LOADED_ADAPTERS);
    assert_eq!(settings.error_rate, 0.);
}

#[test]
fn test_settings_rejects_invalid_values() {
    for cfg in [
        ServerConfig {
            error_rate: Some(1.5),
            ..Default::default()
        },
        ServerConfig {
            error_rate: Some(-0.1),
            ..Default::default()
        },
        ServerConfig {
            base_latency: Some(-1.),
            ..Default::default()
        },
        ServerConfig {
            jitter: Some(f64::NAN),
            ..Default::default()
        },
        ServerConfig {
            adapter_load_latency: Some(f64::INFINITY),
            ..Default::default()
        },
    ] {
        assert!(
            MockSettings::try_from_config(cfg.clone()).is_err(),
            "cfg: {cfg:?}"
        );
    }
}

#[test]
fn test_compute_delay() {
    let settings = MockSettings {
        base_latency: 0.1,
        jitter: 0.,
        adapter_load_latency: 0.2,
        max_loaded_adapters: 1,
        error_rate: 0.,
    };
    assert_eq!(settings.compute_delay(false), Duration::from_millis(100));
    assert_eq!(
        settings.compute_delay(true),
        Duration::from_secs_f64(0.1 + 0.2)
    );

    let settings = MockSettings {
        jitter: 0.5,
        ..settings
    };
    for _ in 0..32 {
        let delay = settings.compute_delay(false);
        assert!(delay >= Duration::from_millis(100), "delay: {delay:?}");
        assert!(delay < Duration::from_millis(151), "delay: {delay:?}");
    }
}

#[tokio::test]
async fn test_health() {
    let svc = web_svc(MockState::new(instant_settings(1, 0.)));
    let req = Request::builder()
        .uri("http://mock.local/health")
        .body(Body::empty())
        .unwrap();
    let resp = svc.serve(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.try_into_string().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_generate_counts_adapter_loads() {
    let svc = web_svc(MockState::new(instant_settings(1, 0.)));

    for target in ["adapter-0", "adapter-0", "adapter-1", "adapter-0", BASE_MODEL_TARGET] {
        let resp = svc.serve(generate_request(target)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "target: {target}");
        let body: GenerateResponse = resp.try_into_json().await.unwrap();
        assert_eq!(body.generated_text, "mock generation of 16 tokens");
    }

    assert_eq!(
        fetch_stats(&svc).await,
        serde_json::json!({
            "requests": 5,
            "adapter_loads": 3,
            "errors": 0,
        })
    );
}

#[tokio::test]
async fn test_generate_error_rate() {
    let svc = web_svc(MockState::new(instant_settings(4, 1.)));

    for _ in 0..3 {
        let resp = svc.serve(generate_request("adapter-0")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    assert_eq!(
        fetch_stats(&svc).await,
        serde_json::json!({
            "requests": 3,
            "adapter_loads": 1,
            "errors": 3,
        })
    );
}

#[tokio::test]
async fn test_generate_rejects_invalid_payload() {
    let svc = web_svc(MockState::new(instant_settings(1, 0.)));
    let req = Request::builder()
        .method(Method::POST)
        .uri("http://mock.local/generate")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"prompt":"missing inputs"}"#))
        .unwrap();
    let resp = svc.serve(req).await.unwrap();
    assert!(resp.status().is_client_error(), "status: {}", resp.status());
}

#[tokio::test]
async fn test_write_server_socket_address_as_file() {
    let dir = std::env::temp_dir().join(format!("lorabench-mock-test-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let addr: SocketAddress = "127.0.0.1:8080".parse().unwrap();
    write_server_socket_address_as_file(&dir, "lorabench.mock", addr)
        .await
        .unwrap();

    let content = tokio::fs::read_to_string(dir.join("lorabench.mock.addr.txt"))
        .await
        .unwrap();
    assert_eq!(content, "127.0.0.1:8080");

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
