//! Command line helpers shared by the binaries.

use clap::ArgEnum;
use env_logger;
use log;

/// Logging level option value.
#[derive(Copy, Clone, clap::ArgEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Builds the `-l/--loglevel` argument with the provided default level.
pub fn log_level_arg(default: &'static str) -> clap::Arg<'static> {
    clap::Arg::new("log_level")
        .short('l')
        .long("loglevel")
        .help("logging level")
        .takes_value(true)
        .default_value(default)
        .possible_values(LogLevel::possible_values())
}

pub fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(log_level.into())
        .format_timestamp_millis()
        .init();
}
