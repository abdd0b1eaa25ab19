//! Logger setup for the command line entry point.

use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

/// Initialize the logger. `RUST_LOG` overrides the default level.
pub fn init_logger(verbose: bool) {
    let env = Env::default().filter_or("RUST_LOG", default_filter(verbose).as_str());

    Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}",
                level_tag(record.level()),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "install",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

/// Level implied by the verbose flag alone.
pub fn default_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
