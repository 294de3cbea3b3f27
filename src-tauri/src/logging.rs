use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter.
/// Calling it again once a subscriber is installed is a no-op.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
    {
        tracing::debug!("Logging already initialized: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::init_logging;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_logging();
        init_logging();
        tracing::info!(target: "telemetry", "still logging");
    }
}
