use anyhow::{anyhow, Result};
use log::{LevelFilter, Log, Metadata, Record};

/// Writes every record to stderr, tagged with its level and origin.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

pub fn init(level: LevelFilter) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow!("could not install logger: {e}"))?;
    log::set_max_level(level);
    Ok(())
}
