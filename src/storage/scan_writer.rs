/// 日次CSVファイルへのスキャン結果の追記
///
/// ## ファイル
///
/// - パス: `<DATA_DIR>/<YYYYMMDD><DATA_FILENAME>`
/// - ヘッダー: `ScanTime,chn_<c0>,chn_<c1>,...`（ファイル新規作成時のみ）
/// - 行: `YYYY-MM-DD HH:MM:SS,<値>,...`（ローカル時刻、値は小数点以下2桁）
///
/// 日付が変わると自動的に新しいファイルになります。ファイルハンドルは
/// `append_row` の中だけで使われ、戻る前にフラッシュ・同期して閉じられます。
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};

use crate::core::config::ScanConfig;
use crate::hardware::SensorTag;

/// 時刻列の列名
pub const SCAN_TIME_COLUMN: &str = "ScanTime";

/// 時刻列のフォーマット
pub const SCAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// ファイル名の日付部分のフォーマット
pub const FILE_DATE_FORMAT: &str = "%Y%m%d";

/// 保存エラー
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("data directory {} does not exist or is not a directory", .0.display())]
    MissingDirectory(PathBuf),
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot flush {}: {source}", .path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("row does not match the configured sensors: expected {expected:?}, got {actual:?}")]
    ColumnMismatch { expected: Vec<u8>, actual: Vec<u8> },
    #[error("cannot parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

/// 1回のスキャン結果
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    scan_time: NaiveDateTime,
    values: Vec<(u8, f64)>,
}

impl ScanRow {
    pub fn new(scan_time: NaiveDateTime) -> Self {
        Self {
            scan_time,
            values: Vec::new(),
        }
    }

    pub fn with_capacity(scan_time: NaiveDateTime, capacity: usize) -> Self {
        Self {
            scan_time,
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, channel: u8, value: f64) {
        self.values.push((channel, value));
    }

    pub fn scan_time(&self) -> NaiveDateTime {
        self.scan_time
    }

    pub fn values(&self) -> &[(u8, f64)] {
        &self.values
    }

    fn to_record(&self) -> Vec<String> {
        std::iter::once(self.scan_time.format(SCAN_TIME_FORMAT).to_string())
            .chain(self.values.iter().map(|(_, value)| format!("{:.2}", value)))
            .collect()
    }
}

/// CSVヘッダーの列名
pub fn header_fields(sensors: &[SensorTag]) -> Vec<String> {
    std::iter::once(SCAN_TIME_COLUMN.to_string())
        .chain(sensors.iter().map(SensorTag::column_name))
        .collect()
}

/// 指定日のデータファイルのパス
pub fn data_file_path(data_dir: &Path, date: NaiveDate, base_name: &str) -> PathBuf {
    data_dir.join(format!("{}{}", date.format(FILE_DATE_FORMAT), base_name))
}

/// 日次CSVライター
#[derive(Debug, Clone, PartialEq)]
pub struct ScanWriter {
    data_dir: PathBuf,
    base_name: String,
}

impl ScanWriter {
    pub fn new(data_dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            base_name: base_name.into(),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.data_dir.clone(), config.data_file_base_name.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 指定日のファイルパス
    pub fn file_path_for(&self, date: NaiveDate) -> PathBuf {
        data_file_path(&self.data_dir, date, &self.base_name)
    }

    /// 1行追記します。ファイルが無ければ先にヘッダーを書きます
    ///
    /// 書き込んだファイルのパスを返します。
    pub fn append_row(&self, row: &ScanRow, sensors: &[SensorTag]) -> Result<PathBuf, StorageError> {
        let expected: Vec<u8> = sensors.iter().map(SensorTag::channel).collect();
        let actual: Vec<u8> = row.values().iter().map(|(channel, _)| *channel).collect();
        if expected != actual {
            return Err(StorageError::ColumnMismatch { expected, actual });
        }

        if !self.data_dir.is_dir() {
            return Err(StorageError::MissingDirectory(self.data_dir.clone()));
        }

        let path = self.file_path_for(row.scan_time().date());
        let is_new_file = !path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StorageError::Open {
                path: path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new_file {
            let header = header_fields(sensors);
            debug!("Header: {:?}", header);
            writer
                .write_record(&header)
                .map_err(|source| StorageError::Write {
                    path: path.clone(),
                    source,
                })?;
            info!("New file opened: {}", path.display());
        }

        let record = row.to_record();
        debug!("Row: {:?}", record);
        writer
            .write_record(&record)
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        let file: File = writer.into_inner().map_err(|e| StorageError::Flush {
            path: path.clone(),
            source: std::io::Error::new(e.error().kind(), e.error().to_string()),
        })?;
        file.sync_data().map_err(|source| StorageError::Flush {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

/// データファイルを読み戻します（ヘッダーと行）
pub fn read_scan_file(path: &Path) -> Result<(Vec<String>, Vec<ScanRow>), StorageError> {
    let parse_error = |reason: String| StorageError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| parse_error(e.to_string()))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if header.first().map(String::as_str) != Some(SCAN_TIME_COLUMN) {
        return Err(parse_error(format!("unexpected header {:?}", header)));
    }

    let channels = header[1..]
        .iter()
        .map(|column| {
            column
                .strip_prefix("chn_")
                .and_then(|c| c.parse::<u8>().ok())
                .ok_or_else(|| parse_error(format!("unexpected column {}", column)))
        })
        .collect::<Result<Vec<u8>, StorageError>>()?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(e.to_string()))?;
        let scan_time = record
            .get(0)
            .and_then(|t| NaiveDateTime::parse_from_str(t, SCAN_TIME_FORMAT).ok())
            .ok_or_else(|| parse_error(format!("bad scan time in {:?}", record)))?;

        let mut row = ScanRow::with_capacity(scan_time, channels.len());
        for (index, channel) in channels.iter().enumerate() {
            let value = record
                .get(index + 1)
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or_else(|| parse_error(format!("bad value in {:?}", record)))?;
            row.push(*channel, value);
        }
        rows.push(row);
    }

    Ok((header, rows))
}
