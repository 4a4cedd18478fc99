use tokio::sync::RwLock;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

fn do_init(level: Level) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
        )))
        .init();
}

/// Initialize tracing at the given default level.
/// `RUST_LOG` overrides the default.
///
/// Will only initialize once, so tests may call this.
pub async fn init(level: Level) {
    static TRACING_IS_INITIALIZED: RwLock<bool> = RwLock::const_new(false);

    let initialized = { *TRACING_IS_INITIALIZED.read().await };

    if !initialized {
        let mut initialized = TRACING_IS_INITIALIZED.write().await;

        // To avoid race condition between the `.read()` and the
        // `.write()`.
        if *initialized {
            return;
        }

        do_init(level);

        *initialized = true;
    }
}
