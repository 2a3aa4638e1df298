//! ScanLoop テスト共通のシミュレーション部品
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use hems_recorder::core::{
    Clock, PauseOutcome, PausePlatform, ScanConfig, ScheduleAnchor, ShutdownSignal,
};
use hems_recorder::hardware::adc::mock::MockAdc;
use hems_recorder::hardware::adc::AdcResult;
use hems_recorder::hardware::{AdcReader, SensorTag, Unit};

/// 1スキャンあたりの処理時間（now() 呼び出しごとに進む時間）
pub const STEP_MILLIS: i64 = 100;

/// シミュレーション時計: now() で処理時間分、pause で待機時間分進む
#[derive(Clone)]
pub struct SimClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl SimClock {
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += TimeDelta::from_std(duration).unwrap();
    }
}

impl Clock for SimClock {
    fn now(&self) -> NaiveDateTime {
        let mut now = self.now.lock().unwrap();
        let current = *now;
        *now += TimeDelta::milliseconds(STEP_MILLIS);
        current
    }
}

/// 指定回数目の待機中に停止要求を出すテスト用プラットフォーム
pub struct InterruptAfter {
    pub clock: SimClock,
    pub shutdown: ShutdownSignal,
    pub interrupt_on: usize,
    pub pauses: Mutex<Vec<Duration>>,
}

impl InterruptAfter {
    pub fn new(clock: &SimClock, shutdown: &ShutdownSignal, interrupt_on: usize) -> Self {
        Self {
            clock: clock.clone(),
            shutdown: shutdown.clone(),
            interrupt_on,
            pauses: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

impl PausePlatform for InterruptAfter {
    fn pause(&self, duration: Duration) -> PauseOutcome {
        let mut pauses = self.pauses.lock().unwrap();
        pauses.push(duration);
        if pauses.len() >= self.interrupt_on {
            self.shutdown.trigger();
            return PauseOutcome::Interrupted;
        }
        self.clock.advance(duration);
        PauseOutcome::Elapsed
    }
}

/// 指定回数目の読み取りの直後に停止要求を出すADC（Ctrl-C がスキャン途中に届いた場合）
pub struct InterruptOnRead {
    pub inner: MockAdc,
    pub shutdown: ShutdownSignal,
    pub trigger_on: usize,
    reads: usize,
}

impl InterruptOnRead {
    pub fn new(inner: MockAdc, shutdown: &ShutdownSignal, trigger_on: usize) -> Self {
        Self {
            inner,
            shutdown: shutdown.clone(),
            trigger_on,
            reads: 0,
        }
    }
}

impl AdcReader for InterruptOnRead {
    fn read_normalized(&mut self, channel: u8) -> AdcResult<f64> {
        let value = self.inner.read_normalized(channel);
        self.reads += 1;
        if self.reads == self.trigger_on {
            self.shutdown.trigger();
        }
        value
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_milli_opt(12, 0, 3, 250)
        .unwrap()
}

/// 60秒間隔、毎分0秒に揃えるグリッド基準の設定
pub fn test_config(data_dir: &std::path::Path) -> ScanConfig {
    ScanConfig {
        interval_seconds: 60,
        data_dir: data_dir.to_path_buf(),
        data_file_base_name: "_hems.csv".to_string(),
        log_file_name: "hems.log".to_string(),
        sensor_count: 3,
        log_level: 20,
        units: Unit::Celsius,
        schedule_anchor: ScheduleAnchor::Grid,
        spi_device: "/dev/null".to_string(),
    }
}

pub fn test_sensors() -> Vec<SensorTag> {
    vec![
        SensorTag::temperature(0, "Attic", Unit::Celsius),
        SensorTag::temperature(1, "Basement", Unit::Celsius),
        SensorTag::temperature(2, "Garage", Unit::Fahrenheit),
    ]
}

pub fn test_adc() -> MockAdc {
    let adc = MockAdc::new();
    adc.set_value(0, 0.25); // 32.5°C
    adc.set_value(1, 0.2); // 16.0°C
    adc.set_value(2, 0.25); // 90.5°F
    adc
}
