mod client;
mod scenario;
mod server;

pub use self::{
    client::{BenchMode, ClientConfig},
    scenario::Scenario,
    server::ServerConfig,
};
