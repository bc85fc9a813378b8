//! Tracing/logging initialization.
//!
//! The filter comes from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Line format of emitted events.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per event, with timestamps.
    #[default]
    Json,
    /// Human-readable, for local runs.
    Pretty,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing/logging for the process with JSON output.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(OutputFormat::Json);
}

/// Initialize tracing/logging with the given output format.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_with(format: OutputFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    match format {
        OutputFormat::Json => builder.json().with_target(false).try_init().is_ok(),
        OutputFormat::Pretty => builder.pretty().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init_with(OutputFormat::Pretty);
        assert!(!init_with(OutputFormat::Json));
        init();
    }
}
