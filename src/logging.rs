//! Logger setup for the `dupescan` binary.
//!
//! The library only talks to the `log` facade. The binary installs an
//! `env_logger` backend once at startup. The filter is chosen in this order:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only)
//! 3. `-v` (debug) or `-vv` (trace)
//! 4. info
//!
//! Debug builds prefix each line with a timestamp, and with the module path
//! once `-v` is given. Release builds print the level and the message.
//!
//! ```rust,no_run
//! dupescan::logging::init_logging(1, false);
//! log::debug!("now visible");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Install the global logger.
///
/// Call once per process, before the first scan. A second call is ignored
/// with a debug message instead of panicking.
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var_os("RUST_LOG").is_some();

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
        return;
    }

    if from_env {
        log::debug!("Log filter taken from RUST_LOG");
    } else {
        log::debug!("Log level set to {}", level_for(verbose, quiet));
    }
}

/// Level selected by the command-line flags alone.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    let with_module = verbose >= 1;
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let timestamp = buf.timestamp_seconds();
        if with_module {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                timestamp,
                record.level(),
                record.module_path().unwrap_or("?"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} {}",
                timestamp,
                record.level(),
                record.args()
            )
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
    });
}
