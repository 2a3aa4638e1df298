use log::{debug, error, info};

use crate::core::config::ScanConfig;
use crate::core::schedule::{pause_until, Clock, ScheduleClock};
use crate::core::shutdown::{PauseOutcome, PausePlatform, ShutdownSignal};
use crate::hardware::{AdcReader, SensorReadError, SensorTag};
use crate::storage::{ScanRow, ScanWriter, StorageError};

/// スキャンループの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Writing,
    Sleeping,
    Terminated,
}

/// ループ終了時の集計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// 書き込みまで完了したスキャン数
    pub completed_scans: u64,
    /// センサー読み取りエラーで中止したスキャン数
    pub failed_scans: u64,
}

/// スキャンループの致命的エラー
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("storage failure after {completed_scans} scans: {source}")]
    Storage {
        completed_scans: u64,
        #[source]
        source: StorageError,
    },
}

/// 1回のスキャン（全センサーの読み取り）の結果
enum ScanOutcome {
    Completed(ScanRow),
    Aborted(SensorReadError),
    Interrupted,
}

/// 制御ループ: 全センサー読み取り → 1行書き込み → 待ち時間計算 → 待機
///
/// 停止要求はどの状態からでも `Terminated` へ遷移させます。読み取り途中で
/// 停止した行は書き込まず、ファイルハンドルは書き込みごとに閉じられるため
/// 終了時に開いたままのハンドルは残りません。
pub struct ScanLoop<A: AdcReader, C: Clock, P: PausePlatform> {
    sensors: Vec<SensorTag>,
    adc: A,
    clock: C,
    pause: P,
    shutdown: ShutdownSignal,
    writer: ScanWriter,
    schedule: ScheduleClock,
    state: ScanState,
    summary: ScanSummary,
}

impl<A: AdcReader, C: Clock, P: PausePlatform> ScanLoop<A, C, P> {
    pub fn new(
        config: &ScanConfig,
        sensors: Vec<SensorTag>,
        adc: A,
        clock: C,
        pause: P,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            sensors,
            adc,
            clock,
            pause,
            shutdown,
            writer: ScanWriter::from_config(config),
            schedule: ScheduleClock::new(config.interval_seconds, config.schedule_anchor),
            state: ScanState::Idle,
            summary: ScanSummary::default(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn summary(&self) -> ScanSummary {
        self.summary
    }

    /// 停止要求があるまでスキャンを繰り返します
    ///
    /// 停止要求による終了は `Ok`、保存の失敗は `Err` です。
    pub fn run(&mut self) -> Result<ScanSummary, ScanError> {
        info!("Entering DataLoop");
        self.transition(ScanState::Idle);

        loop {
            if self.shutdown.is_triggered() {
                return Ok(self.terminate());
            }

            let scan_start = self.clock.now();
            self.transition(ScanState::Scanning);

            match self.scan(scan_start) {
                ScanOutcome::Interrupted => return Ok(self.terminate()),
                ScanOutcome::Aborted(e) => {
                    self.summary.failed_scans += 1;
                    error!("Scan at {} aborted, no row written: {}", scan_start, e);
                }
                ScanOutcome::Completed(row) => {
                    self.transition(ScanState::Writing);
                    if let Err(source) = self.writer.append_row(&row, &self.sensors) {
                        self.transition(ScanState::Terminated);
                        error!(
                            "Data logging stopped by storage failure after {} scans: {}",
                            self.summary.completed_scans, source
                        );
                        return Err(ScanError::Storage {
                            completed_scans: self.summary.completed_scans,
                            source,
                        });
                    }
                    self.summary.completed_scans += 1;
                }
            }

            self.transition(ScanState::Sleeping);
            let boundary = self.schedule.next_boundary(scan_start);
            let pause = pause_until(boundary, self.clock.now());
            debug!(
                "{}: {},{:.3}",
                self.summary.completed_scans,
                scan_start,
                pause.as_secs_f64()
            );

            if self.pause.pause(pause) == PauseOutcome::Interrupted {
                return Ok(self.terminate());
            }
        }
    }

    /// 宣言順に全センサーを読み取る
    fn scan(&mut self, scan_start: chrono::NaiveDateTime) -> ScanOutcome {
        let mut row = ScanRow::with_capacity(scan_start, self.sensors.len());

        for sensor in &self.sensors {
            if self.shutdown.is_triggered() {
                return ScanOutcome::Interrupted;
            }
            match sensor.reading(&mut self.adc) {
                Ok(value) => row.push(sensor.channel(), value),
                Err(e) => return ScanOutcome::Aborted(e),
            }
        }

        ScanOutcome::Completed(row)
    }

    fn terminate(&mut self) -> ScanSummary {
        self.transition(ScanState::Terminated);
        info!(
            "Data logging interrupted by ctl-c after {} scans",
            self.summary.completed_scans
        );
        if self.summary.failed_scans > 0 {
            info!("{} scans were aborted by sensor errors", self.summary.failed_scans);
        }
        self.summary
    }

    fn transition(&mut self, next: ScanState) {
        if self.state != next {
            debug!("ScanLoop: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

/// 起動時のバナーとセンサー一覧をログに出力
pub fn log_startup(config: &ScanConfig, sensors: &[SensorTag]) {
    info!("Starting HEMS - logging temperature data");
    info!("{} sensors being monitored:", sensors.len());
    for sensor in sensors {
        info!("channel {} at {}", sensor.channel(), sensor.location());
    }
    info!("{:?}", config);
}
