//! Driver for loading, linking and typing module files.
//!
//! [`run`] reads the files named by [`Options`], loads them in parallel,
//! seals them into one repository, links every module in a single
//! [`LinkSession`](xtc_part::LinkSession) and, with `--types`, computes the
//! structural type of every class. Problems come back as diagnostics in the
//! [`Outcome`]; nothing is printed here.

mod driver;
mod options;

use std::sync::Once;

pub use driver::{process, run, ClassType, Input, Outcome};
pub use options::{Options, UsageError, USAGE};

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Nothing is installed unless `RUST_LOG` is set. With `XTC_LOG_TREE` set,
/// output is an indented span tree instead of flat lines. Later calls do
/// nothing.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let registry = tracing_subscriber::registry().with(filter);
        if std::env::var_os("XTC_LOG_TREE").is_some() {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .init();
        } else {
            registry
                .with(fmt::layer().with_target(true).with_level(true))
                .init();
        }
    });
}
