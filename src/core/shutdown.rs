use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{info, warn};

/// 待機の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// 指定時間が経過した
    Elapsed,
    /// 停止要求で中断された
    Interrupted,
}

/// スキャン間の待機を抽象化するトレイト
///
/// 実機では `ShutdownSignal` が Ctrl-C で起こされる待機を提供し、
/// テストでは時間を進めずに即座に戻る実装に差し替えます。
pub trait PausePlatform {
    fn pause(&self, duration: Duration) -> PauseOutcome;
}

impl<P: PausePlatform + ?Sized> PausePlatform for &P {
    fn pause(&self, duration: Duration) -> PauseOutcome {
        (**self).pause(duration)
    }
}

#[derive(Debug, Default)]
struct SignalState {
    triggered: Mutex<bool>,
    condvar: Condvar,
}

/// 停止要求フラグ
///
/// Ctrl-C ハンドラから `trigger` され、スキャンループは各フェーズの区切りと
/// 待機中にこれを確認します。
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<SignalState>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// SIGINT (Ctrl-C) で停止要求を出すハンドラを登録
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping after the current step");
            signal.trigger();
        })?;
        info!("Ctrl-C handler installed");
        Ok(())
    }

    /// 停止要求を出し、待機中のスレッドを起こす
    pub fn trigger(&self) {
        let mut triggered = self
            .state
            .triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *triggered = true;
        self.state.condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self
            .state
            .triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 最大 `timeout` 待つ。停止要求があれば `true`
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut triggered = self
            .state
            .triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // spurious wakeup 対策で期限まで待ち直す
        while !*triggered {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = self
                .state
                .condvar
                .wait_timeout(triggered, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            triggered = guard;
        }

        *triggered
    }
}

impl PausePlatform for ShutdownSignal {
    fn pause(&self, duration: Duration) -> PauseOutcome {
        if self.wait_timeout(duration) {
            PauseOutcome::Interrupted
        } else {
            PauseOutcome::Elapsed
        }
    }
}
