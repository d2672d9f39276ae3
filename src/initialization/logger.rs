//! Logger setup for the geostat binary.

use std::io::Write;

use colored::*;
use env_logger::fmt::Formatter;
use log::{Level, LevelFilter, Record};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// HTTP stack crates that are too chatty at the pipeline's debug level.
const QUIET_MODULES: &[(&str, LevelFilter)] = &[
    ("reqwest", LevelFilter::Info),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    ("rustls", LevelFilter::Warn),
];

/// Installs the global logger.
///
/// Directives are layered so later ones win for the same module: the quiet
/// defaults for the HTTP stack, then `RUST_LOG`, then `level` for the default
/// filter and for `geostat` itself.
///
/// ```bash
/// RUST_LOG=reqwest=debug geostat access.log --log-level debug
/// ```
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&filter_spec(level, rust_log.as_deref()));

    match format {
        LogFormat::Json => builder.format(write_json),
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(write_plain)
        }
    };

    builder.try_init().map_err(InitializationError::from)
}

/// Builds the env_logger filter string for `level` and an optional `RUST_LOG`.
fn filter_spec(level: LevelFilter, rust_log: Option<&str>) -> String {
    let mut directives: Vec<String> = QUIET_MODULES
        .iter()
        .map(|(module, cap)| format!("{}={}", module, cap))
        .collect();

    let mut message_filter = None;
    if let Some(env) = rust_log.map(str::trim).filter(|env| !env.is_empty()) {
        let (env_directives, filter) = match env.split_once('/') {
            Some((directives, filter)) => (directives, Some(filter)),
            None => (env, None),
        };
        directives.extend(
            env_directives
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        );
        message_filter = filter;
    }

    directives.push(level.to_string());
    directives.push(format!("geostat={}", level));

    let mut spec = directives.join(",");
    if let Some(filter) = message_filter {
        spec.push('/');
        spec.push_str(filter);
    }
    spec
}

fn level_badge(level: Level) -> (&'static str, ColoredString) {
    let name = level.as_str();
    match level {
        Level::Error => ("❌", name.red()),
        Level::Warn => ("⚠️", name.yellow()),
        Level::Info => ("✔️", name.green()),
        Level::Debug => ("🔍", name.blue()),
        Level::Trace => ("🔬", name.purple()),
    }
}

fn write_plain(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    let (emoji, level) = level_badge(record.level());
    writeln!(
        buf,
        "{} {} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
        emoji,
        record.target().cyan(),
        level,
        record.args()
    )
}

fn json_line(record: &Record) -> serde_json::Value {
    serde_json::json!({
        "ts": chrono::Utc::now().timestamp_millis(),
        "level": record.level().as_str(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
}

fn write_json(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    writeln!(buf, "{}", json_line(record))
}
