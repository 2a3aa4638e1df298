/// ScanLoop Integration Tests
///
/// Mock ADC とシミュレーション時計を使い、スキャン → 書き込み → 待機 → 停止までの
/// 流れをホストマシンで検証します。

mod common;

use std::time::Duration;

use hems_recorder::core::{ScanError, ScanLoop, ScanState, ScheduleAnchor, ShutdownSignal};
use hems_recorder::storage::read_scan_file;
use hems_recorder::StorageError;
use tempfile::TempDir;

use common::{
    start_time, test_adc, test_config, test_sensors, InterruptAfter, InterruptOnRead, SimClock,
};

#[test]
fn test_interrupt_during_sleep_after_five_scans() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let shutdown = ShutdownSignal::new();
    let clock = SimClock::starting_at(start_time());
    let pause = InterruptAfter::new(&clock, &shutdown, 5);
    let adc = test_adc();

    let mut scan_loop = ScanLoop::new(&config, test_sensors(), adc.clone(), clock, pause, shutdown);
    let summary = scan_loop.run().unwrap();

    assert_eq!(summary.completed_scans, 5);
    assert_eq!(summary.failed_scans, 0);
    assert_eq!(scan_loop.summary(), summary);
    assert_eq!(scan_loop.state(), ScanState::Terminated);

    let path = dir.path().join("20240315_hems.csv");
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "ScanTime,chn_0,chn_1,chn_2");
    assert_eq!(lines[1], "2024-03-15 12:00:03,32.50,16.00,90.50");

    // 2回目以降は毎分0秒に揃う
    let (_, rows) = read_scan_file(&path).unwrap();
    let times: Vec<String> = rows
        .iter()
        .map(|r| r.scan_time().format("%H:%M:%S").to_string())
        .collect();
    assert_eq!(
        times,
        vec!["12:00:03", "12:01:00", "12:02:00", "12:03:00", "12:04:00"]
    );

    // センサーは宣言順に読まれる
    assert_eq!(adc.get_read_log(), [0u8, 1, 2].repeat(5));
}

#[test]
fn test_interrupt_between_sensor_reads_drops_partial_row() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let shutdown = ShutdownSignal::new();
    let clock = SimClock::starting_at(start_time());
    let pause = InterruptAfter::new(&clock, &shutdown, 10);
    let mock = test_adc();
    // 6回目のスキャンの2チャンネル目 (通算17回目) を読んだ直後に Ctrl-C
    let adc = InterruptOnRead::new(mock.clone(), &shutdown, 17);

    let mut scan_loop = ScanLoop::new(&config, test_sensors(), adc, clock, &pause, shutdown);
    let summary = scan_loop.run().unwrap();

    assert_eq!(summary.completed_scans, 5);
    assert_eq!(summary.failed_scans, 0);
    assert_eq!(scan_loop.state(), ScanState::Terminated);

    // 残りのセンサーは読まない
    let mut expected_reads = [0u8, 1, 2].repeat(5);
    expected_reads.extend([0u8, 1]);
    assert_eq!(mock.get_read_log(), expected_reads);

    // 途中まで読んだ行は書かれない
    let path = dir.path().join("20240315_hems.csv");
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 6);
    let (_, rows) = read_scan_file(&path).unwrap();
    assert_eq!(
        rows.last().unwrap().scan_time().format("%H:%M:%S").to_string(),
        "12:04:00"
    );
    assert_eq!(pause.recorded().len(), 5);
}

#[test]
fn test_pause_compensates_for_processing_time() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let shutdown = ShutdownSignal::new();
    let clock = SimClock::starting_at(start_time());
    let pause = InterruptAfter::new(&clock, &shutdown, 2);

    let mut scan_loop = ScanLoop::new(&config, test_sensors(), test_adc(), clock, &pause, shutdown);
    scan_loop.run().unwrap();

    // 12:00:03.250 開始、書き込み後の now() は 12:00:03.350 -> 12:01:00 まで 56.65 秒
    let pauses = pause.recorded();
    assert_eq!(pauses[0], Duration::from_millis(56_650));
    assert_eq!(pauses[1], Duration::from_millis(59_800));
}

#[test]
fn test_last_scan_anchor_waits_full_interval_from_scan() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.schedule_anchor = ScheduleAnchor::LastScan;
    let shutdown = ShutdownSignal::new();
    let clock = SimClock::starting_at(start_time());
    let pause = InterruptAfter::new(&clock, &shutdown, 1);

    let mut scan_loop = ScanLoop::new(&config, test_sensors(), test_adc(), clock, &pause, shutdown);
    scan_loop.run().unwrap();

    // 12:00:03 + 60秒 = 12:01:03 まで
    assert_eq!(pause.recorded(), vec![Duration::from_millis(59_650)]);
}

#[test]
fn test_sensor_failure_aborts_only_that_scan() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let shutdown = ShutdownSignal::new();
    let clock = SimClock::starting_at(start_time());
    let pause = InterruptAfter::new(&clock, &shutdown, 3);
    let adc = test_adc();
    // 1回目は正常、2回目は範囲外、3回目は正常
    adc.queue_value(1, 0.2);
    adc.queue_value(1, 1.7);

    let mut scan_loop = ScanLoop::new(&config, test_sensors(), adc.clone(), clock, pause, shutdown);
    let summary = scan_loop.run().unwrap();

    assert_eq!(summary.completed_scans, 2);
    assert_eq!(summary.failed_scans, 1);

    // 失敗したスキャンでは残りのセンサーを読まない
    assert_eq!(adc.get_read_log(), vec![0u8, 1, 2, 0, 1, 0, 1, 2]);

    let (header, rows) = read_scan_file(&dir.path().join("20240315_hems.csv")).unwrap();
    assert_eq!(header, vec!["ScanTime", "chn_0", "chn_1", "chn_2"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1].scan_time().format("%H:%M:%S").to_string(),
        "12:02:00"
    );
}

#[test]
fn test_interrupt_before_first_scan_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    let clock = SimClock::starting_at(start_time());
    let pause = InterruptAfter::new(&clock, &shutdown, 1);
    let adc = test_adc();

    let mut scan_loop = ScanLoop::new(&config, test_sensors(), adc.clone(), clock, pause, shutdown);
    let summary = scan_loop.run().unwrap();

    assert_eq!(summary.completed_scans, 0);
    assert!(adc.get_read_log().is_empty());
    assert!(!dir.path().join("20240315_hems.csv").exists());
}

#[test]
fn test_missing_data_directory_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir.path().join("missing"));
    let shutdown = ShutdownSignal::new();
    let clock = SimClock::starting_at(start_time());
    let pause = InterruptAfter::new(&clock, &shutdown, 10);

    let mut scan_loop = ScanLoop::new(&config, test_sensors(), test_adc(), clock, &pause, shutdown);
    let result = scan_loop.run();

    match result {
        Err(ScanError::Storage {
            completed_scans,
            source: StorageError::MissingDirectory(_),
        }) => assert_eq!(completed_scans, 0),
        other => panic!("Expected storage failure, got {:?}", other),
    }
    assert_eq!(scan_loop.state(), ScanState::Terminated);
    assert!(pause.recorded().is_empty());
}
