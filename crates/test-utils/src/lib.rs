pub mod builders;
pub mod recording;

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Write `contents` to `Fibdag.toml` inside `dir` and return the path.
pub fn write_plan(dir: &Path, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join("Fibdag.toml");
    std::fs::write(&path, contents)
        .with_context(|| format!("writing plan to {}", path.display()))?;
    Ok(path)
}
