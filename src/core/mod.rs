/// コアシステムモジュール
pub mod config;
pub mod config_validation;
pub mod scan_loop;
pub mod schedule;
pub mod shutdown;

pub use config::{load_config, ConfigError, ScanConfig};
pub use scan_loop::{log_startup, ScanError, ScanLoop, ScanState, ScanSummary};
pub use schedule::{pause_until_next_boundary, Clock, ScheduleAnchor, ScheduleClock, SystemClock};
pub use shutdown::{PauseOutcome, PausePlatform, ShutdownSignal};
