#[cfg(feature = "mcp3008")]
pub mod mcp3008;

// Mock実装（テストと実機なしの動作確認で使用）
pub mod mock;

/// ADC読み取りの結果の型
pub type AdcResult<T> = Result<T, AdcError>;

/// MCP3008 のチャンネル数
pub const ADC_CHANNEL_COUNT: u8 = 8;

/// ADC読み取りのエラーを表す列挙型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdcError {
    /// 初期化エラー（デバイスファイルが開けない等）
    #[error("ADC initialization error: {0}")]
    InitError(String),
    /// 存在しないチャンネル
    #[error("ADC channel {0} is out of range (0-{max})", max = ADC_CHANNEL_COUNT - 1)]
    InvalidChannel(u8),
    /// 転送エラー
    #[error("ADC transfer error: {0}")]
    TransferError(String),
}

/// 単一チャンネルのサンプルを読み取るインターフェース
///
/// 実機用 (MCP3008) とテスト用 (Mock) の実装を切り替えるためのトレイトです。
pub trait AdcReader {
    /// 指定チャンネルを1回サンプリングし、[0, 1] に正規化した値を返す
    fn read_normalized(&mut self, channel: u8) -> AdcResult<f64>;
}

impl<T: AdcReader + ?Sized> AdcReader for &mut T {
    fn read_normalized(&mut self, channel: u8) -> AdcResult<f64> {
        (**self).read_normalized(channel)
    }
}

impl<T: AdcReader + ?Sized> AdcReader for Box<T> {
    fn read_normalized(&mut self, channel: u8) -> AdcResult<f64> {
        (**self).read_normalized(channel)
    }
}
