/*!
 * # HEMS Temperature Recorder Library
 *
 * MCP3008 に接続したアナログ温度センサーを一定間隔でスキャンし、
 * 日次CSVファイルとログファイルに記録するためのライブラリ
 *
 * ## モジュール構成
 * - `core`: 設定、スキャン間隔の計算、停止要求、スキャンループ
 * - `hardware`: ADC読み取り（MCP3008 / Mock）とセンサー定義
 * - `storage`: 日次CSVファイルへの追記
 * - `logging`: ログファイルの設定
 */

pub mod core;
pub mod hardware;
pub mod logging;
pub mod storage;

pub use crate::core::{
    load_config, ConfigError, ScanConfig, ScanError, ScanLoop, ScanState, ScanSummary,
    ShutdownSignal,
};
pub use hardware::{AdcReader, SensorKind, SensorReadError, SensorTag, Unit};
pub use storage::{ScanRow, ScanWriter, StorageError};

/// ライブラリのバージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
