//! Tracing setup for the driver.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a subscriber when `RUST_LOG` is set; otherwise do nothing.
///
/// `RUST_LOG=whorl_parse=debug` logs forks, merges, recoveries and reuse;
/// `trace` adds every parser action. With `WHORL_LOG_TREE=1` spans are
/// printed as an indented tree instead of flat lines.
///
/// Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let registry = tracing_subscriber::registry().with(filter);
        if std::env::var("WHORL_LOG_TREE").is_ok_and(|v| v == "1") {
            registry
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
