//! Tracing subscriber setup for the server binary

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const FORMAT_VAR: &str = "SPENDLEDGER_LOG_FORMAT";

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG` (default `info`); `SPENDLEDGER_LOG_FORMAT=json`
/// switches to one JSON object per line.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if json_requested(std::env::var(FORMAT_VAR).ok().as_deref()) {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

fn json_requested(format: Option<&str>) -> bool {
    format.is_some_and(|value| value.trim().eq_ignore_ascii_case("json"))
}
