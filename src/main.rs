use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{error, info};

use hems_recorder::core::config::DEFAULT_CONFIG_PATH;
use hems_recorder::core::{load_config, log_startup, ScanConfig, ScanLoop, ShutdownSignal, SystemClock};
use hems_recorder::hardware::AdcReader;
use hems_recorder::logging::init_file_logger;

/// ADCを開く（実機ドライバ）
#[cfg(feature = "mcp3008")]
fn open_adc(config: &ScanConfig) -> Result<Box<dyn AdcReader>> {
    let adc = hems_recorder::hardware::adc::mcp3008::Mcp3008::open(&config.spi_device)
        .with_context(|| format!("MCP3008 を開けません: {}", config.spi_device))?;
    Ok(Box::new(adc))
}

/// ADCを開く（実機ドライバなしのビルドではMockを使う）
#[cfg(not(feature = "mcp3008"))]
fn open_adc(_config: &ScanConfig) -> Result<Box<dyn AdcReader>> {
    log::warn!("Built without the mcp3008 feature, using the mock ADC");
    Ok(Box::new(hems_recorder::hardware::adc::mock::MockAdc::new()))
}

fn run() -> Result<()> {
    // 設定ファイルのパスは第1引数（省略時は hems.ini）
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let (config, sensors) = match load_config(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            if !e.available_keys().is_empty() {
                eprintln!("Available keys in [DEFAULT]: {:?}", e.available_keys());
            }
            return Err(e).with_context(|| format!("設定の読み込みに失敗: {}", config_path.display()));
        }
    };

    let log_path = config.log_file_path();
    init_file_logger(&log_path, config.log_level)?;
    println!("Logging to {}", log_path.display());

    log_startup(&config, &sensors);

    let shutdown = ShutdownSignal::new();
    shutdown
        .install_ctrlc_handler()
        .context("Ctrl-C ハンドラの登録に失敗")?;

    let adc = open_adc(&config)?;

    println!("HEMS recording temperature data. Press <Control-C> to terminate");
    let mut scan_loop = ScanLoop::new(
        &config,
        sensors,
        adc,
        SystemClock,
        shutdown.clone(),
        shutdown,
    );
    let summary = scan_loop.run()?;

    info!(
        "HEMS stopped: {} scans written, {} aborted",
        summary.completed_scans, summary.failed_scans
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("hems_recorder: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
