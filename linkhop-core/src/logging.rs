use std::fs::OpenOptions;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Crates whose events follow the configured level
const OWN_TARGETS: &[&str] = &["linkhop", "linkhop_core", "linkhop_hosts"];

/// Initialize structured logging for the host process.
///
/// Events go to stderr (stdout carries resolution output) or to an
/// append-mode file when `file_path` is set. `RUST_LOG` overrides the
/// directives built from the config. Library code only emits events.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = parse_log_level(&config.level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(log_level)))?;

    let (writer, to_file) = match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Arc::new(file)), true)
        }
        None => (BoxMakeWriter::new(std::io::stderr), false),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.format.as_str() == "json" {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_line_number(true)
            .with_writer(writer);
        registry.with(json_layer).try_init()?;
    } else {
        let pretty_layer = fmt::layer()
            .pretty()
            .with_target(true)
            .with_line_number(true)
            .with_file(false)
            .with_ansi(!to_file)
            .with_writer(writer);
        registry.with(pretty_layer).try_init()?;
    }

    Ok(())
}

/// Filter directives for a configured level.
///
/// Our crates log at `level`; HTTP and HTML parsing dependencies are capped
/// at `warn` so a `debug` run shows hops rather than connection chatter.
fn default_directives(level: Level) -> String {
    let deps = level.min(Level::WARN);
    let mut directives = lowercase(deps);
    for target in OWN_TARGETS {
        directives.push_str(&format!(",{target}={}", lowercase(level)));
    }
    directives
}

fn lowercase(level: Level) -> String {
    level.as_str().to_ascii_lowercase()
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}
