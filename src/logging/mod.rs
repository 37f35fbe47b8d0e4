//! Minimal process-wide warning sink
//!
//! Parsing never fails on recoverable oddities (nonzero identifier padding,
//! reserved-range enumerant codes, unrecognized section types); it reports
//! them through the [log] facade instead. Applications embedding the crate
//! can install their own logger; [init] provides a small stderr sink for
//! hosts that have none.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// A logger that writes each record to standard error
///
/// Records are serialized by taking the stderr lock per write. The minimum
/// level is the process-wide [log::max_level] and may be lowered or raised at
/// any time with [set_level].
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut sink = std::io::stderr().lock();
            let _ = writeln!(
                sink,
                "[{:<5}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().lock().flush();
    }
}

/// Install the stderr logger with `level` as the minimum reported level
///
/// May be called at most once per process; a second call (or a call after any
/// other logger was installed) fails.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Change the minimum reported level
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_threshold() {
        // Installation may race with an embedding test harness; the level
        // mutator must work either way.
        let _ = init(LevelFilter::Warn);
        set_level(LevelFilter::Error);
        assert_eq!(log::max_level(), LevelFilter::Error);
        set_level(LevelFilter::Warn);
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }
}
