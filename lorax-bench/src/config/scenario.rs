use super::{BenchMode, ClientConfig};

/// High level benchmark scenarios.
/// Each scenario is a preset of the client behavior.
#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum Scenario {
    /// Requests spread randomly over many adapters.
    /// Used to measure adapter exchange overhead.
    #[default]
    RandomAdapters,

    /// All requests against one adapter.
    /// Used as reference for sustained single adapter access.
    SingleAdapter,

    /// All requests against the base model.
    /// Used to measure the cost of adapters altogether.
    BaseModel,
}

impl Scenario {
    /// Construct the concrete client configuration
    /// associated with this scenario.
    pub fn client_config(self) -> ClientConfig {
        match self {
            Scenario::RandomAdapters => ClientConfig {
                requests: Some(300),
                workers: Some(20),
                adapter_count: Some(50),
                mode: Some(BenchMode::Multi),
            },

            Scenario::SingleAdapter => ClientConfig {
                requests: Some(300),
                workers: Some(20),
                adapter_count: Some(1),
                mode: Some(BenchMode::Single),
            },

            Scenario::BaseModel => ClientConfig {
                requests: Some(300),
                workers: Some(20),
                adapter_count: None,
                mode: Some(BenchMode::Base),
            },
        }
    }
}
