/// ハードウェア制御モジュール
pub mod adc;
pub mod sensor_tag;

pub use adc::{AdcError, AdcReader};
pub use sensor_tag::{c_to_f, SensorKind, SensorReadError, SensorTag, Unit};
