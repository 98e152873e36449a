use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Install the process-wide logger.
///
/// Logs go to stderr so stdout only carries payloads. `RUST_LOG` overrides
/// the level picked from `verbose`.
pub fn setup_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let _ = Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .try_init();
}
