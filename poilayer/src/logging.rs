//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays pipeable. An
//! optional file layer mirrors everything without ANSI colors through a
//! non-blocking appender; callers must hold the returned guard for the
//! process lifetime or buffered lines are lost on exit.
//!
//! `RUST_LOG` overrides the verbosity-derived filter when set.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Map a repeatable `-v` count to a filter directive.
fn directive_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,poilayer=info",
        1 => "info,poilayer=debug",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize the global subscriber.
///
/// Safe to call more than once; later calls keep the first subscriber.
/// Returns the appender guard when a log file was requested.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive_for(verbosity)));

    let (file_writer, guard) = match log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().unwrap_or_else(|| "poilayer.log".as_ref());
            let appender = tracing_appender::rolling::never(
                directory.unwrap_or_else(|| Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // Local timestamps need the UTC offset, which cannot always be
    // determined once threads are running; fall back to the default
    // (UTC) timer in that case.
    match OffsetTime::local_rfc_3339() {
        Ok(timer) => {
            let file_layer = file_writer
                .clone()
                .map(|writer| fmt::layer().with_writer(writer).with_ansi(false));
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr).with_timer(timer))
                .with(file_layer)
                .try_init();
        }
        Err(_) => {
            let file_layer = file_writer
                .clone()
                .map(|writer| fmt::layer().with_writer(writer).with_ansi(false));
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .with(file_layer)
                .try_init();
        }
    }

    guard
}
