use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use log::{Level, LevelFilter};

/// ログ行のタイムスタンプ形式 (`2024-01-05 07:08:09,123`)
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("logger already installed: {0}")]
    Install(#[from] log::SetLoggerError),
}

/// 数値のログレベルを `LevelFilter` に変換
///
/// 10: DEBUG, 20: INFO, 30: WARNING, 40: ERROR, 50: CRITICAL。0 はすべて出力。
pub fn level_filter(log_level: u32) -> LevelFilter {
    match log_level {
        0 => LevelFilter::Trace,
        1..=10 => LevelFilter::Debug,
        11..=20 => LevelFilter::Info,
        21..=30 => LevelFilter::Warn,
        31..=50 => LevelFilter::Error,
        _ => LevelFilter::Off,
    }
}

pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// `<timestamp> <LEVEL>: <message>`
pub fn format_log_line(time: NaiveDateTime, level: Level, message: &str) -> String {
    format!("{} {}: {}", time.format(LOG_TIME_FORMAT), level_name(level), message)
}

/// ログファイルへ追記するロガーを設定
pub fn init_file_logger(path: &Path, log_level: u32) -> Result<(), LoggingError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    env_logger::Builder::new()
        .filter_level(level_filter(log_level))
        .format(|buf, record| {
            let line = format_log_line(
                Local::now().naive_local(),
                record.level(),
                &record.args().to_string(),
            );
            writeln!(buf, "{}", line)
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;

    Ok(())
}
