use super::{AdcError, AdcReader, AdcResult, ADC_CHANNEL_COUNT};
use log::{debug, info};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

/// MCP3008 の分解能 (10bit) の最大値
const MCP3008_MAX_VALUE: u16 = 1023;

/// SPIクロック (Hz)。MCP3008 は 2.7V 駆動で 1.35MHz まで
const SPI_CLOCK_HZ: u32 = 1_000_000;

/// MCP3008 ADC ドライバ
///
/// Raspberry Pi の spidev 経由でシングルエンド入力を読み取ります。
///
/// # 配線例（Raspberry Pi）
/// ```text
/// MCP3008:
/// - VDD/VREF -> 3.3V
/// - CLK  -> SCLK (GPIO11)
/// - DOUT -> MISO (GPIO9)
/// - DIN  -> MOSI (GPIO10)
/// - CS   -> CE0  (GPIO8)
/// ```
pub struct Mcp3008 {
    spi: Spidev,
}

impl Mcp3008 {
    /// SPIデバイスを開いて MCP3008 ドライバを作成
    pub fn open(device_path: &str) -> AdcResult<Self> {
        info!("Opening MCP3008 on {}", device_path);

        let mut spi = Spidev::open(device_path)
            .map_err(|e| AdcError::InitError(format!("{}: {}", device_path, e)))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(SPI_CLOCK_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options)
            .map_err(|e| AdcError::InitError(format!("{}: {}", device_path, e)))?;

        Ok(Self { spi })
    }
}

impl AdcReader for Mcp3008 {
    fn read_normalized(&mut self, channel: u8) -> AdcResult<f64> {
        if channel >= ADC_CHANNEL_COUNT {
            return Err(AdcError::InvalidChannel(channel));
        }

        // スタートビット, シングルエンド + チャンネル番号, ダミー
        let tx = [0x01, (0x08 | channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        {
            let mut transfer = SpidevTransfer::read_write(&tx, &mut rx);
            self.spi
                .transfer(&mut transfer)
                .map_err(|e| AdcError::TransferError(e.to_string()))?;
        }

        let raw = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        debug!("MCP3008 channel {} raw value {}", channel, raw);

        Ok(f64::from(raw) / f64::from(MCP3008_MAX_VALUE))
    }
}
