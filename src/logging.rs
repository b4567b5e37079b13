use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

/// Sends tracing output to `log_path`, truncating the previous run's log.
/// The terminal stays free for the form. Filtering follows `RUST_LOG`
/// (default `info`).
pub fn init_file_logging(log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // a second init in the same process keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Plain stderr logging for the one-shot CLI.
pub fn init_stderr_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}
