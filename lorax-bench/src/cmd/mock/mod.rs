use std::{
    convert::Infallible,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use rama::{
    Layer as _, Service,
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    http::{
        HeaderValue, Request, Response, StatusCode,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
        service::web::{
            Router,
            extract::{Json, State},
            response::IntoResponse,
        },
    },
    layer::TimeoutLayer,
    net::{address::SocketAddress, socket::Interface},
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use clap::Args;
use parking_lot::Mutex;

use crate::{
    config::ServerConfig,
    lorax::{GenerateRequest, GenerateResponse},
};

mod adapters;

use self::adapters::LoadedAdapters;

const SERVER_HEADER: &str = concat!("lorabench-mock/", env!("CARGO_PKG_VERSION"));

const DEFAULT_BASE_LATENCY: f64 = 0.05;
const DEFAULT_JITTER: f64 = 0.5;
const DEFAULT_ADAPTER_LOAD_LATENCY: f64 = 0.2;
const DEFAULT_MAX_LOADED_ADAPTERS: usize = 8;

#[derive(Debug, Clone, Args)]
/// run a mock LoRAX generate server
pub struct MockCommand {
    #[clap(flatten)]
    config: Option<ServerConfig>,

    /// network interface to bind to
    #[arg(
        long,
        short = 'b',
        value_name = "INTERFACE",
        default_value = "127.0.0.1:0"
    )]
    pub bind: Interface,
}

pub async fn exec(data: PathBuf, guard: ShutdownGuard, args: MockCommand) -> Result<(), BoxError> {
    tokio::fs::create_dir_all(&data)
        .await
        .context("create data directory")
        .with_context_debug_field("path", || data.clone())?;

    let settings = MockSettings::try_from_config(args.config.unwrap_or_default())?;
    tracing::info!(?settings, "mock server settings ready");

    let http_svc = (
        TraceLayer::new_for_http(),
        AddRequiredResponseHeadersLayer::new()
            .with_server_header_value(HeaderValue::from_static(SERVER_HEADER)),
    )
        .into_layer(web_svc(MockState::new(settings)));

    let exec = Executor::graceful(guard);
    let http_server = HttpServer::auto(exec.clone()).service(Arc::new(http_svc));
    let tcp_svc = TimeoutLayer::new(Duration::from_secs(60)).into_layer(http_server);

    let tcp_listener = TcpListener::bind(args.bind, exec)
        .await
        .context("bind mock lorax http server")?;

    let server_addr = tcp_listener
        .local_addr()
        .context("get bound address for mock lorax http server")?;

    tracing::info!("mock lorax http server bound to: {server_addr}");
    write_server_socket_address_as_file(&data, "lorabench.mock", server_addr.into()).await?;

    tcp_listener.serve(tcp_svc).await;

    Ok(())
}

async fn write_server_socket_address_as_file(
    dir: &Path,
    name: &str,
    addr: SocketAddress,
) -> Result<(), BoxError> {
    let path = dir.join(format!("{name}.addr.txt"));
    tokio::fs::write(&path, addr.to_string())
        .await
        .context("write server's socket address to file")
        .context_field("address", addr)
        .with_context_debug_field("path", || path.to_owned())
}

#[derive(Debug, Clone)]
pub(crate) struct MockSettings {
    base_latency: f64,
    jitter: f64,
    adapter_load_latency: f64,
    max_loaded_adapters: usize,
    error_rate: f64,
}

impl MockSettings {
    pub(crate) fn try_from_config(cfg: ServerConfig) -> Result<Self, BoxError> {
        let settings = Self {
            base_latency: cfg.base_latency.unwrap_or(DEFAULT_BASE_LATENCY),
            jitter: cfg.jitter.unwrap_or(DEFAULT_JITTER),
            adapter_load_latency: cfg
                .adapter_load_latency
                .unwrap_or(DEFAULT_ADAPTER_LOAD_LATENCY),
            max_loaded_adapters: cfg
                .max_loaded_adapters
                .unwrap_or(DEFAULT_MAX_LOADED_ADAPTERS),
            error_rate: cfg.error_rate.unwrap_or_default(),
        };

        for (name, value) in [
            ("base_latency", settings.base_latency),
            ("jitter", settings.jitter),
            ("adapter_load_latency", settings.adapter_load_latency),
        ] {
            if !value.is_finite() || value < 0. {
                return Err(BoxError::from("mock setting must be a finite non-negative number")
                    .context_field("setting", name)
                    .context_field("value", value));
            }
        }
        if !(0. ..=1.).contains(&settings.error_rate) {
            return Err(BoxError::from("error_rate must be within [0.0, 1.0]")
                .context_field("value", settings.error_rate));
        }

        Ok(settings)
    }

    fn compute_delay(&self, adapter_loaded: bool) -> Duration {
        let mut secs = self.base_latency;
        if self.jitter > 0. {
            let u: f64 = rand::random();
            secs *= 1. + self.jitter * u;
        }
        if adapter_loaded {
            secs += self.adapter_load_latency;
        }
        Duration::from_secs_f64(secs)
    }

    fn pick_error(&self) -> bool {
        self.error_rate > 0. && rand::random::<f64>() < self.error_rate
    }
}

#[derive(Debug, Default)]
struct MockStats {
    requests: AtomicU64,
    adapter_loads: AtomicU64,
    errors: AtomicU64,
}

#[derive(Debug, Clone)]
pub(crate) struct MockState {
    settings: Arc<MockSettings>,
    adapters: Arc<Mutex<LoadedAdapters>>,
    stats: Arc<MockStats>,
}

impl MockState {
    pub(crate) fn new(settings: MockSettings) -> Self {
        Self {
            adapters: Arc::new(Mutex::new(LoadedAdapters::new(
                settings.max_loaded_adapters,
            ))),
            settings: Arc::new(settings),
            stats: Default::default(),
        }
    }
}

pub(crate) fn web_svc(
    state: MockState,
) -> impl Service<Request, Output = Response, Error = Infallible> {
    Router::new_with_state(state)
        .with_post("/generate", generate)
        .with_get("/health", "ok")
        .with_get("/stats", stats)
}

async fn generate(
    State(MockState {
        settings,
        adapters,
        stats,
    }): State<MockState>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    let _ = stats.requests.fetch_add(1, Ordering::Relaxed);

    let adapter_loaded = req
        .parameters
        .adapter_id
        .as_deref()
        .is_some_and(|adapter_id| adapters.lock().touch(adapter_id));
    if adapter_loaded {
        let _ = stats.adapter_loads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(adapter_id = ?req.parameters.adapter_id, "mock: load adapter");
    }

    let delay = settings.compute_delay(adapter_loaded);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if settings.pick_error() {
        let _ = stats.errors.fetch_add(1, Ordering::Relaxed);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    Json(GenerateResponse {
        generated_text: format!(
            "mock generation of {} tokens",
            req.parameters.max_new_tokens
        ),
    })
    .into_response()
}

async fn stats(State(MockState { stats, .. }): State<MockState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "requests": stats.requests.load(Ordering::Acquire),
        "adapter_loads": stats.adapter_loads.load(Ordering::Acquire),
        "errors": stats.errors.load(Ordering::Acquire),
    }))
}

#[cfg(test)]
mod tests;
