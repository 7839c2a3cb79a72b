use std::time::Duration;

use rama::{
    Layer as _, Service,
    error::{BoxError, ErrorContext as _},
    http::{
        BodyExtractExt as _, Request, Response, Uri,
        client::EasyHttpWebClient,
        layer::map_request_body::MapRequestBodyLayer,
        service::client::HttpClientExt as _,
    },
    layer::TimeoutLayer,
};
use tokio::runtime::Handle;

use lorax_bench_lib::{Invoke, TargetId};

use crate::lorax::{AdapterSource, GenerateRequest, GenerateResponse};

/// HTTP(S) client used to reach the generate endpoint.
///
/// No retries are applied, a retried request would distort the measured latency.
pub fn http_client(timeout: Duration) -> impl Service<Request, Output = Response, Error = BoxError> {
    (
        TimeoutLayer::new(timeout),
        MapRequestBodyLayer::new_boxed_streaming_body(),
    )
        .into_layer(EasyHttpWebClient::default())
}

/// Parameters of the generate requests sent for every unit of work.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub adapter_source: AdapterSource,
}

/// [`Invoke`] implementation which sends one generate request per call.
///
/// Benchmark workers are plain OS threads, the async request is driven
/// to completion on the tokio runtime via the provided handle.
/// The timeout bounds the entire exchange, response body included.
pub struct LoraxInvoker<S> {
    handle: Handle,
    client: S,
    endpoint: Uri,
    timeout: Duration,
    options: GenerateOptions,
}

impl<S> std::fmt::Debug for LoraxInvoker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoraxInvoker")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("options", &self.options)
            .finish()
    }
}

impl<S> LoraxInvoker<S>
where
    S: Service<Request, Output = Response, Error: Into<BoxError>>,
{
    pub fn new(
        handle: Handle,
        client: S,
        endpoint: Uri,
        timeout: Duration,
        options: GenerateOptions,
    ) -> Self {
        Self {
            handle,
            client,
            endpoint,
            timeout,
            options,
        }
    }

    async fn generate(&self, target: &TargetId) -> Result<(), BoxError> {
        let payload = GenerateRequest::new(
            &self.options.prompt,
            self.options.max_new_tokens,
            target,
            self.options.adapter_source,
        );

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .context("send generate request")
            .with_context_field("adapter", || target.clone())?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BoxError::from("generate endpoint returned non-success status")
                .context_debug_field("status", status)
                .context_field("adapter", target.clone()));
        }

        let _: GenerateResponse = resp
            .try_into_json()
            .await
            .context("collect and json-decode generate response payload")
            .with_context_field("adapter", || target.clone())?;

        Ok(())
    }
}

impl<S> Invoke for LoraxInvoker<S>
where
    S: Service<Request, Output = Response, Error: Into<BoxError>>,
{
    fn invoke(&self, target: &TargetId) -> Result<(), BoxError> {
        self.handle.block_on(async {
            tokio::time::timeout(self.timeout, self.generate(target))
                .await
                .context("generate request timed out")
                .with_context_debug_field("timeout", || self.timeout)
                .with_context_field("adapter", || target.clone())
                .and_then(|result| result)
        })
    }
}
