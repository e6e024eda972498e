use tracing_core::{Level, LevelFilter};
use tracing_subscriber::{
    filter::filter_fn, layer::SubscriberExt, registry, util::SubscriberInitExt, Layer,
};

/// Crates whose `info` output is noise for a prediction server.
const QUIET_CRATES: [&str; 2] = ["wgpu", "cubecl"];

/// Installs the global subscriber printing `info` and above, `log` records included.
///
/// Returns `false` when a subscriber was already installed, e.g. by an earlier test,
/// in which case that one stays in place.
pub fn init_logging() -> bool {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(LevelFilter::INFO)
        .with_filter(filter_fn(|metadata| {
            let quiet = metadata
                .module_path()
                .is_some_and(|path| QUIET_CRATES.iter().any(|name| path.starts_with(name)));

            !(quiet && *metadata.level() >= Level::INFO)
        }));

    match registry().with(layer).try_init() {
        Ok(()) => true,
        Err(err) => {
            log::debug!("Keeping the installed subscriber: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialization_keeps_the_first_subscriber() {
        init_logging();

        assert!(!init_logging());
    }
}
