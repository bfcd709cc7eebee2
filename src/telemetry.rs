use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `minuta_pricing=info`. Later calls, or an already installed subscriber,
/// are left alone.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("minuta_pricing=info"));

        if fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::info!("minuta_pricing tracing initialized");
        }
    });
}
