//! Tracing subscriber setup for the binary

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Environment variable holding the log filter (e.g., "maven_resolve=debug")
pub const LOG_ENV: &str = "MAVEN_RESOLVE_LOG";

/// Installs the global subscriber. Logs go to stderr, and additionally to
/// `log_file` when given. Keep the returned guard alive until exit so buffered
/// file output is flushed.
pub fn init(log_file: Option<&Path>) -> std::io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(log_file) = log_file else {
        builder.with_writer(std::io::stderr).init();
        return Ok(None);
    };

    let dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = log_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "maven-resolve.log".into());

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    builder
        .with_ansi(false)
        .with_writer(std::io::stderr.and(writer))
        .init();

    Ok(Some(guard))
}
