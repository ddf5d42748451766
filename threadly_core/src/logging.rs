use std::env;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static LOG_ENV: &str = "THREADLY_LOG";
static LOG_FORMAT_ENV: &str = "THREADLY_LOG_FORMAT";
static DEFAULT_DIRECTIVES: &str = "threadly_core=info,warn";

/// Installs the global tracing subscriber.
///
/// `THREADLY_LOG` takes `EnvFilter` directives, `THREADLY_LOG_FORMAT=json`
/// switches to JSON lines. A second call is a no-op.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => registry
            .with(fmt::layer().json().with_ansi(false))
            .try_init(),
        _ => registry.with(fmt::layer().compact()).try_init(),
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
