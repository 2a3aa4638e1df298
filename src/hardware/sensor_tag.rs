use std::fmt;

use log::debug;

use super::adc::{AdcError, AdcReader};

/// 温度の単位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Celsius,
    Fahrenheit,
}

impl Unit {
    /// 設定ファイル上の表記 (`C` / `F`)
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "C",
            Unit::Fahrenheit => "F",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// センサーの種類
///
/// 新しい種類（湿度など）はここに追加し、`SensorTag::reading` で換算を定義します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// 正規化されたADC値をそのまま記録する
    Raw,
    /// アナログ温度センサー (TMP36 互換: 10mV/°C, 0.5V オフセット)
    Temperature,
}

/// センサー読み取りエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorReadError {
    #[error("channel {channel} ({location}): {source}")]
    Hardware {
        channel: u8,
        location: String,
        #[source]
        source: AdcError,
    },
    #[error("channel {channel} ({location}): sample {value} is outside [0, 1]")]
    OutOfRange {
        channel: u8,
        location: String,
        value: f64,
    },
}

/// ADCの基準電圧 (V)
const ADC_REFERENCE_VOLTS: f64 = 3.3;

/// 0°C 時のセンサー出力電圧 (V)
const TEMPERATURE_OFFSET_VOLTS: f64 = 0.5;

/// 1V あたりの温度 (°C)
const DEGREES_PER_VOLT: f64 = 100.0;

/// 摂氏を華氏に変換
pub fn c_to_f(celsius: f64) -> f64 {
    9.0 * celsius / 5.0 + 32.0
}

/// 小数点以下2桁に丸める
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 正規化されたADC値を摂氏に換算
pub fn normalized_to_celsius(normalized: f64) -> f64 {
    DEGREES_PER_VOLT * (normalized * ADC_REFERENCE_VOLTS - TEMPERATURE_OFFSET_VOLTS)
}

/// 測定点（ADCチャンネル + 設置場所 + 単位 + 種類）
///
/// 起動時に設定から作成され、プロセス終了まで変更されません。
#[derive(Debug, Clone, PartialEq)]
pub struct SensorTag {
    channel: u8,
    location: String,
    unit: Unit,
    kind: SensorKind,
}

impl SensorTag {
    pub fn new(channel: u8, location: impl Into<String>, unit: Unit, kind: SensorKind) -> Self {
        Self {
            channel,
            location: location.into(),
            unit,
            kind,
        }
    }

    /// 温度センサーとして作成
    pub fn temperature(channel: u8, location: impl Into<String>, unit: Unit) -> Self {
        Self::new(channel, location, unit, SensorKind::Temperature)
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// CSVヘッダー上の列名 (`chn_<channel>`)
    pub fn column_name(&self) -> String {
        format!("chn_{}", self.channel)
    }

    /// 1回サンプリングして工学単位の値を返す（小数点以下2桁）
    ///
    /// ハードウェアエラーや [0, 1] 外のサンプルは `SensorReadError` になります。
    pub fn reading<A: AdcReader + ?Sized>(&self, adc: &mut A) -> Result<f64, SensorReadError> {
        let raw = adc
            .read_normalized(self.channel)
            .map_err(|source| SensorReadError::Hardware {
                channel: self.channel,
                location: self.location.clone(),
                source,
            })?;

        if !raw.is_finite() || !(0.0..=1.0).contains(&raw) {
            return Err(SensorReadError::OutOfRange {
                channel: self.channel,
                location: self.location.clone(),
                value: raw,
            });
        }

        let value = match self.kind {
            SensorKind::Raw => raw,
            SensorKind::Temperature => {
                let celsius = normalized_to_celsius(raw);
                match self.unit {
                    Unit::Celsius => celsius,
                    Unit::Fahrenheit => c_to_f(celsius),
                }
            }
        };

        let rounded = round_to_hundredths(value);
        debug!(
            "channel {} ({}): raw {:.4} -> {}{}",
            self.channel, self.location, raw, rounded, self.unit
        );
        Ok(rounded)
    }
}

impl fmt::Display for SensorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel {} is placed at: {}", self.channel, self.location)
    }
}
