use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption, Properties};
use log::debug;

use crate::core::config_validation::{
    parse_channel, parse_location, parse_log_level, parse_positive_integer, parse_schedule_anchor,
    parse_sensor_kind, parse_unit, ValidationError,
};
use crate::core::schedule::ScheduleAnchor;
use crate::hardware::{SensorKind, SensorTag, Unit};

/// 共通設定のセクション名
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// 設定ファイルのデフォルトパス
pub const DEFAULT_CONFIG_PATH: &str = "hems.ini";

/// SPIデバイスのデフォルトパス
pub const DEFAULT_SPI_DEVICE: &str = "/dev/spidev0.0";

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("設定ファイルを読み込めません {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
    #[error("セクション [{0}] がありません")]
    MissingSection(String),
    #[error("[{section}] に {key} がありません (available keys: {})", .available.join(", "))]
    MissingKey {
        section: String,
        key: String,
        available: Vec<String>,
    },
    #[error("[{section}] {key} の値が無効です: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: ValidationError,
    },
}

impl ConfigError {
    /// 診断用に、見つかった [DEFAULT] のキー一覧を返す
    pub fn available_keys(&self) -> &[String] {
        match self {
            ConfigError::MissingKey { available, .. } => available,
            _ => &[],
        }
    }
}

/// スキャン設定
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// スキャン間隔（秒）
    pub interval_seconds: u32,
    /// CSVとログの出力先ディレクトリ
    pub data_dir: PathBuf,
    /// 日付の後ろに付くデータファイル名 (例: `_hems.csv`)
    pub data_file_base_name: String,
    /// ログファイル名
    pub log_file_name: String,
    /// センサー数
    pub sensor_count: usize,
    /// ログレベル (数値)
    pub log_level: u32,
    /// 既定の単位
    pub units: Unit,
    /// 次のスキャン時刻の基準
    pub schedule_anchor: ScheduleAnchor,
    /// MCP3008 を接続したSPIデバイス
    pub spi_device: String,
}

impl ScanConfig {
    /// ログファイルのパス (`<DATA_DIR>/<LOG_FILENAME>`)
    pub fn log_file_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file_name)
    }
}

/// 設定ファイルを読み込み、スキャン設定とセンサー一覧を返します
pub fn load_config(path: &Path) -> Result<(ScanConfig, Vec<SensorTag>), ConfigError> {
    let option = ParseOption {
        enabled_escape: false,
        ..Default::default()
    };
    let ini = Ini::load_from_file_opt(path, option).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&ini)
}

/// 読み込み済みのINIから設定を組み立てます
///
/// センサーセクションに無いキーは [DEFAULT] から引き継ぎます。
pub fn parse_config(ini: &Ini) -> Result<(ScanConfig, Vec<SensorTag>), ConfigError> {
    let defaults = default_section(ini);
    let lookup = SectionLookup {
        name: DEFAULT_SECTION,
        section: None,
        defaults,
    };

    let config = ScanConfig {
        interval_seconds: lookup.parse("LOG_INTERVAL", parse_positive_integer)?,
        data_dir: PathBuf::from(lookup.required("DATA_DIR")?),
        data_file_base_name: lookup.required("DATA_FILENAME")?.to_string(),
        log_file_name: lookup.required("LOG_FILENAME")?.to_string(),
        sensor_count: lookup.parse("SENSOR_COUNT", parse_positive_integer)? as usize,
        log_level: lookup.parse("LOGLEVEL", parse_log_level)?,
        units: lookup.parse("UNITS", parse_unit)?,
        schedule_anchor: lookup
            .parse_optional("SCHEDULE_ANCHOR", parse_schedule_anchor)?
            .unwrap_or_default(),
        spi_device: lookup
            .optional("SPI_DEVICE")
            .unwrap_or(DEFAULT_SPI_DEVICE)
            .to_string(),
    };

    let mut sensors: Vec<SensorTag> = Vec::with_capacity(config.sensor_count);
    for index in 0..config.sensor_count {
        let name = format!("SENSOR{}", index);
        let section = ini
            .section(Some(name.as_str()))
            .ok_or_else(|| ConfigError::MissingSection(name.clone()))?;
        let lookup = SectionLookup {
            name: &name,
            section: Some(section),
            defaults,
        };

        let channel = lookup.parse("CHANNEL", parse_channel)?;
        // 同じチャンネルが2回あるとCSVの列名が重複する
        if sensors.iter().any(|s| s.channel() == channel) {
            return Err(lookup.invalid("CHANNEL", ValidationError::DuplicateChannel(channel)));
        }
        let location = lookup.parse("LOCATION", parse_location)?;
        let unit = lookup.parse("UNITS", parse_unit)?;
        let kind = lookup
            .parse_optional("KIND", parse_sensor_kind)?
            .unwrap_or(SensorKind::Temperature);

        let tag = SensorTag::new(channel, location, unit, kind);
        debug!("Configured sensor {}: {}", index, tag);
        sensors.push(tag);
    }

    Ok((config, sensors))
}

fn default_section(ini: &Ini) -> Option<&Properties> {
    ini.section(Some(DEFAULT_SECTION))
        .or_else(|| ini.section(None::<String>))
}

fn find_key<'a>(properties: &'a Properties, key: &str) -> Option<&'a str> {
    properties
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// セクション + [DEFAULT] のフォールバック付きキー検索
struct SectionLookup<'a> {
    name: &'a str,
    section: Option<&'a Properties>,
    defaults: Option<&'a Properties>,
}

impl<'a> SectionLookup<'a> {
    fn optional(&self, key: &str) -> Option<&'a str> {
        self.section
            .and_then(|s| find_key(s, key))
            .or_else(|| self.defaults.and_then(|d| find_key(d, key)))
    }

    fn required(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.optional(key).ok_or_else(|| ConfigError::MissingKey {
            section: self.name.to_string(),
            key: key.to_string(),
            available: self
                .defaults
                .map(|d| d.iter().map(|(k, _)| k.to_string()).collect())
                .unwrap_or_default(),
        })
    }

    fn parse<T>(
        &self,
        key: &str,
        parser: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Result<T, ConfigError> {
        let value = self.required(key)?;
        parser(value).map_err(|reason| self.invalid(key, reason))
    }

    fn parse_optional<T>(
        &self,
        key: &str,
        parser: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Result<Option<T>, ConfigError> {
        self.optional(key)
            .map(|value| parser(value).map_err(|reason| self.invalid(key, reason)))
            .transpose()
    }

    fn invalid(&self, key: &str, reason: ValidationError) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            reason,
        }
    }
}
