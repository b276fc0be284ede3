//! File logging for dashboards.
//!
//! A running session owns the terminal, so anything written to stdout or
//! stderr would corrupt the screen. Log through `tracing` instead and send it
//! to a file.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Open `path` for appending and make it the global `tracing` sink.
///
/// The level comes from `RUST_LOG` (default [`DEFAULT_FILTER`]). Returns
/// whether this call installed the subscriber; if one is already installed
/// it is left in place and `false` is returned.
///
/// # Example
///
/// ```no_run
/// use trellis_core::logging::log_to_file;
///
/// log_to_file("dashboard.log").unwrap();
/// tracing::info!("written to dashboard.log");
/// ```
pub fn log_to_file(path: impl AsRef<Path>) -> Result<bool, std::io::Error> {
    let file = open_append(path.as_ref())?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .is_ok();
    Ok(installed)
}

fn open_append(path: &Path) -> Result<File, std::io::Error> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_append_creates_and_appends() {
        let path = std::env::temp_dir().join(format!("trellis-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);
        writeln!(open_append(&path).unwrap(), "one").unwrap();
        writeln!(open_append(&path).unwrap(), "two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let path = std::env::temp_dir().join("trellis-no-such-dir").join("x.log");
        assert!(log_to_file(path).is_err());
    }
}
