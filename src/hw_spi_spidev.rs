// src/hw_spi_spidev.rs
use ghost_radio_lib::config::Config;
use ghost_radio_lib::mcp3008::{AdcError, SpiTransfer};
use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

/// MCP3008 transport over the kernel spidev driver (CS handled by the kernel).
pub struct SpidevAdc {
    dev: Spidev,
}

impl SpidevAdc {
    pub fn open(config: &Config) -> Result<Self, AdcError> {
        let path = config.spi_device();
        let mut dev = Spidev::open(&path)
            .map_err(|e| AdcError::Transport(format!("{}: {}", path.display(), e)))?;

        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(config.hardware.spi_clock_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&opts)
            .map_err(|e| AdcError::Transport(e.to_string()))?;
        Ok(Self { dev })
    }
}

impl SpiTransfer for SpidevAdc {
    fn transfer(&mut self, tx: &[u8; 3]) -> Result<[u8; 3], AdcError> {
        let mut rx = [0u8; 3];
        let mut tr = SpidevTransfer::read_write(tx, &mut rx);
        self.dev
            .transfer(&mut tr)
            .map_err(|e| AdcError::Transport(e.to_string()))?;
        Ok(rx)
    }
}
