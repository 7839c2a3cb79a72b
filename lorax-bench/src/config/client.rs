use std::fmt;

/// Client side load generation configuration.
/// This models how many requests are issued and against which adapters.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct ClientConfig {
    /// Total request budget of the run.
    #[arg(long, value_name = "N")]
    pub requests: Option<usize>,

    /// Amount of concurrent workers (threads).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Amount of distinct adapters to spread the requests over.
    /// Only used in multi adapter mode.
    #[arg(long = "adapters", value_name = "N")]
    pub adapter_count: Option<usize>,

    /// Which adapters are targeted by the workers.
    #[arg(long, value_enum)]
    pub mode: Option<BenchMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BenchMode {
    /// Every request targets the base model, no adapter.
    Base,
    /// Every request targets the same adapter.
    Single,
    /// Every request targets a random adapter with quota left.
    Multi,
}

impl fmt::Display for BenchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchMode::Base => write!(f, "base"),
            BenchMode::Single => write!(f, "single"),
            BenchMode::Multi => write!(f, "multi"),
        }
    }
}
