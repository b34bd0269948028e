//! File logging for desk-agent.
//!
//! The CLI's stdout belongs to the command output, so tracing goes to a
//! daily-rolled file under `~/.opsdesk/logs/`. The returned guard must stay
//! alive for the duration of `main` or buffered lines are lost. When the
//! log directory cannot be created we fall back to stderr rather than
//! dropping diagnostics.

use fs_err as fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn init() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "desk-agent.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn log_dir() -> Option<std::path::PathBuf> {
    let dir = desk_core::config::data_dir()?.join("logs");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
