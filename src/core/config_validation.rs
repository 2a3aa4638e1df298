use crate::core::schedule::ScheduleAnchor;
use crate::hardware::adc::ADC_CHANNEL_COUNT;
use crate::hardware::{SensorKind, Unit};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NotAnInteger(String),
    NotPositive(i64),
    InvalidUnit(String),
    InvalidChannel(String),
    DuplicateChannel(u8),
    InvalidScheduleAnchor(String),
    InvalidSensorKind(String),
    Empty,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NotAnInteger(v) => write!(f, "'{}' is not an integer", v),
            ValidationError::NotPositive(v) => write!(f, "{} must be greater than 0", v),
            ValidationError::InvalidUnit(v) => write!(f, "'{}' is not a unit (C or F)", v),
            ValidationError::InvalidChannel(v) => {
                write!(f, "'{}' is not an ADC channel (0-{})", v, ADC_CHANNEL_COUNT - 1)
            }
            ValidationError::DuplicateChannel(c) => {
                write!(f, "channel {} is already assigned to another sensor", c)
            }
            ValidationError::InvalidScheduleAnchor(v) => {
                write!(f, "'{}' is not a schedule anchor (grid or scan)", v)
            }
            ValidationError::InvalidSensorKind(v) => {
                write!(f, "'{}' is not a sensor kind (temperature or raw)", v)
            }
            ValidationError::Empty => write!(f, "value is empty"),
        }
    }
}

fn parse_integer(value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger(value.to_string()))
}

/// 正の整数 (LOG_INTERVAL, SENSOR_COUNT)
pub fn parse_positive_integer(value: &str) -> Result<u32, ValidationError> {
    let parsed = parse_integer(value)?;
    if parsed <= 0 {
        return Err(ValidationError::NotPositive(parsed));
    }
    u32::try_from(parsed).map_err(|_| ValidationError::NotAnInteger(value.to_string()))
}

/// ログレベル (10: DEBUG, 20: INFO, 30: WARNING, 40: ERROR, 50: CRITICAL)
pub fn parse_log_level(value: &str) -> Result<u32, ValidationError> {
    let parsed = parse_integer(value)?;
    u32::try_from(parsed).map_err(|_| ValidationError::NotAnInteger(value.to_string()))
}

pub fn parse_unit(value: &str) -> Result<Unit, ValidationError> {
    match value.trim() {
        "C" | "c" => Ok(Unit::Celsius),
        "F" | "f" => Ok(Unit::Fahrenheit),
        other => Err(ValidationError::InvalidUnit(other.to_string())),
    }
}

pub fn parse_channel(value: &str) -> Result<u8, ValidationError> {
    match value.trim().parse::<u8>() {
        Ok(channel) if channel < ADC_CHANNEL_COUNT => Ok(channel),
        _ => Err(ValidationError::InvalidChannel(value.to_string())),
    }
}

pub fn parse_location(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn parse_schedule_anchor(value: &str) -> Result<ScheduleAnchor, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "grid" => Ok(ScheduleAnchor::Grid),
        "scan" | "last_scan" => Ok(ScheduleAnchor::LastScan),
        _ => Err(ValidationError::InvalidScheduleAnchor(value.to_string())),
    }
}

pub fn parse_sensor_kind(value: &str) -> Result<SensorKind, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "temperature" | "temp" => Ok(SensorKind::Temperature),
        "raw" => Ok(SensorKind::Raw),
        _ => Err(ValidationError::InvalidSensorKind(value.to_string())),
    }
}
