use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialise logging. The level is `debug` when `debug` is set and `info`
/// otherwise; `RUST_LOG` can override it only when debug logging is on.
/// With `log_file` set, output is appended to that file instead of stdout.
pub fn init(debug: bool, log_file: Option<&Path>) {
    // Without debug logging we force `info` regardless of `RUST_LOG` so a
    // stray variable in the user's environment doesn't flood the output.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match log_file.and_then(|p| Some((p.parent()?, p.file_name()?))) {
        Some((dir, name)) => {
            let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
            builder
                .with_ansi(false)
                .with_writer(tracing_appender::rolling::never(dir, name))
                .try_init()
        }
        None => builder.try_init(),
    };
}
