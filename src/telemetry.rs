//! Log-file dispatcher for conversation runs.
//!
//! Nothing here installs a global subscriber. Attach the returned
//! [`Dispatch`] to the future it should observe:
//!
//! ```no_run
//! use tracing::instrument::WithSubscriber;
//! # async fn demo(driver: parley::driver::ConversationDriver) -> parley::error::Result<()> {
//! let dispatch = parley::telemetry::file_dispatch("app.log", false)?;
//! let report = driver.run().with_subscriber(dispatch).await;
//! # Ok(())
//! # }
//! ```

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Build a plain-text dispatcher appending to `log_path`.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects debug output
/// for this crate instead of info.
pub fn file_dispatch(log_path: impl AsRef<Path>, verbose: bool) -> Result<Dispatch> {
    let log_path = log_path.as_ref();
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .finish();
    Ok(Dispatch::new(subscriber))
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "info,parley=debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
