//! Settings file and logging setup for the command line.

use std::path::Path;

use engine::Settings;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Looked up in the template root when `--config` is not given.
pub const CONFIG_FILE: &str = "quill.toml";

/// Log to stderr, filtered by `QUILL_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(filter),
        )
        .init();
}

/// Read settings from `explicit`, or from `quill.toml` under `root` if that
/// exists. A missing default file means default settings.
pub fn load_settings(explicit: Option<&Path>, root: &Path) -> Result<Settings, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = root.join(CONFIG_FILE);
            if !candidate.is_file() {
                return Ok(Settings::default());
            }
            candidate
        }
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("invalid config '{}': {}", path.display(), e))
}
