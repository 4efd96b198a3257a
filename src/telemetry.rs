use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "cinematch=info";

/// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `cinematch=info`. Safe to call more than once.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::info!("still logging");
    }
}
