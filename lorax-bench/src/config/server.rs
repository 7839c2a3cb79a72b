/// Mock server behavior configuration.
/// This models generation cost and the cost of swapping adapters.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct ServerConfig {
    /// Base generation time before responding.
    #[arg(long, value_name = "SECONDS")]
    pub base_latency: Option<f64>,

    /// Random factor applied on top of base_latency.
    /// Models variable output lengths and batching effects.
    #[arg(long, value_name = "RATIO")]
    pub jitter: Option<f64>,

    /// Extra time spent when the requested adapter is not loaded yet.
    #[arg(long, value_name = "SECONDS")]
    pub adapter_load_latency: Option<f64>,

    /// Amount of adapters kept loaded (least recently used ones are evicted).
    #[arg(long, value_name = "N")]
    pub max_loaded_adapters: Option<usize>,

    /// Probability of returning an error response.
    #[arg(long)]
    pub error_rate: Option<f64>,
}
