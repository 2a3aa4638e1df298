use super::{AdcError, AdcReader, AdcResult, ADC_CHANNEL_COUNT};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// テスト用のADCモック実装
///
/// 実際のSPIハードウェアを使わずにMCP3008の読み取りをシミュレートします。
/// チャンネルごとに固定値またはキューに積んだ値を返し、読み取り順序を記録します。
#[derive(Debug, Clone, Default)]
pub struct MockAdc {
    /// チャンネルごとの固定値
    pub fixed_values: Arc<Mutex<HashMap<u8, f64>>>,
    /// チャンネルごとの読み取り値キュー（固定値より優先される）
    pub queued_values: Arc<Mutex<HashMap<u8, VecDeque<f64>>>>,
    /// 読み取られたチャンネルの記録
    pub read_log: Arc<Mutex<Vec<u8>>>,
    /// 読み取りエラーをシミュレートするチャンネル
    pub failing_channels: Arc<Mutex<Vec<u8>>>,
}

impl MockAdc {
    /// 新しいMockAdcインスタンスを作成します
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用: チャンネルの固定値を設定
    pub fn set_value(&self, channel: u8, value: f64) {
        self.fixed_values.lock().unwrap().insert(channel, value);
    }

    /// テスト用: 次回以降の読み取り値をキューに追加
    pub fn queue_value(&self, channel: u8, value: f64) {
        self.queued_values
            .lock()
            .unwrap()
            .entry(channel)
            .or_default()
            .push_back(value);
    }

    /// テスト用: 読み取りエラーをシミュレート
    pub fn set_read_error(&self, channel: u8, enable: bool) {
        let mut failing = self.failing_channels.lock().unwrap();
        failing.retain(|&c| c != channel);
        if enable {
            failing.push(channel);
        }
    }

    /// テスト用: 読み取られたチャンネルの履歴を取得
    pub fn get_read_log(&self) -> Vec<u8> {
        self.read_log.lock().unwrap().clone()
    }
}

impl AdcReader for MockAdc {
    fn read_normalized(&mut self, channel: u8) -> AdcResult<f64> {
        if channel >= ADC_CHANNEL_COUNT {
            return Err(AdcError::InvalidChannel(channel));
        }

        self.read_log.lock().unwrap().push(channel);

        if self.failing_channels.lock().unwrap().contains(&channel) {
            return Err(AdcError::TransferError(format!(
                "Simulated read error on channel {}",
                channel
            )));
        }

        if let Some(value) = self
            .queued_values
            .lock()
            .unwrap()
            .get_mut(&channel)
            .and_then(|queue| queue.pop_front())
        {
            return Ok(value);
        }

        // 未設定のチャンネルは中間値
        Ok(self
            .fixed_values
            .lock()
            .unwrap()
            .get(&channel)
            .copied()
            .unwrap_or(0.5))
    }
}
