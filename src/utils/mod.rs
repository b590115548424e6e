use dirs::home_dir;
use std::{env, path::PathBuf, sync::Once};

const DEFAULT_DIR_NAME: &str = ".outlay_core";
const CONFIG_FILE: &str = "config.json";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "outlay_core=info".parse() {
            filter = filter.add_directive(directive);
        }

        // A host may already own the global subscriber.
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

/// Returns the application-specific data directory, defaulting to `~/.outlay_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("OUTLAY_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Path to the persisted engine configuration.
pub fn config_file() -> PathBuf {
    app_data_dir().join(CONFIG_FILE)
}
