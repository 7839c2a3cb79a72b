use std::{io::IsTerminal as _, path::Path};

use rama::{
    error::{BoxError, ErrorContext as _},
    telemetry::tracing,
};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt::writer::BoxMakeWriter};

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig<'a> {
    pub verbose: bool,
    pub pretty: bool,
    pub output: Option<&'a Path>,
}

/// Install the global fmt subscriber.
///
/// INFO by default, DEBUG when verbose. `RUST_LOG` directives take precedence.
pub fn init_tracing(cfg: &TelemetryConfig<'_>) -> Result<(), BoxError> {
    let directive = if cfg.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
    .into();

    let make_writer = match cfg.output {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .context("open log file")
                .with_context_debug_field("path", || path.to_owned())?;

            BoxMakeWriter::new(file)
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_ansi(cfg.output.is_none() && std::io::stderr().is_terminal())
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(directive)
                .from_env_lossy(),
        )
        .with_thread_names(true)
        .with_writer(make_writer);

    if cfg.pretty {
        subscriber.pretty().try_init()?;
    } else {
        subscriber.try_init()?;
    }

    tracing::info!("Tracing is set up");
    Ok(())
}
