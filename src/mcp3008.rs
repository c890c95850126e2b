//! # MCP3008 Analog Inputs
//!
//! The tuner and volume potentiometers are wired to an MCP3008 8-channel,
//! 10-bit ADC on the Pi's SPI bus.
//!
//! ## Wire Protocol
//!
//! Each conversion is one 3-byte full-duplex transfer:
//!
//! ```text
//! tx: 0x01              start bit
//!     0x80 | ch << 4    single-ended mode + channel number
//!     0x00              don't care
//! rx: ignored, 0b0000_00HH, LLLL_LLLL   -> 10-bit result
//! ```
//!
//! The SPI transport itself is a trait so the protocol can be tested on any
//! machine; the Linux `spidev` implementation lives in the binary.

use crate::controller::AnalogInput;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Largest value a 10-bit conversion can return.
pub const FULL_SCALE: u16 = 1023;

/// Number of single-ended input channels.
pub const CHANNELS: u8 = 8;

#[derive(Error, Debug)]
pub enum AdcError {
    #[error("MCP3008 has no channel {0} (valid: 0-7)")]
    InvalidChannel(u8),

    #[error("SPI transfer failed: {0}")]
    Transport(String),
}

/// Full-duplex 3-byte SPI exchange with chip select handled by the transport.
pub trait SpiTransfer {
    fn transfer(&mut self, tx: &[u8; 3]) -> Result<[u8; 3], AdcError>;
}

/// MCP3008 driver over any [`SpiTransfer`].
pub struct Mcp3008<S> {
    spi: S,
}

impl<S: SpiTransfer> Mcp3008<S> {
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    /// Read the raw 10-bit value of `channel`.
    pub fn read_raw(&mut self, channel: u8) -> Result<u16, AdcError> {
        if channel >= CHANNELS {
            return Err(AdcError::InvalidChannel(channel));
        }
        let tx = [0x01, 0x80 | (channel << 4), 0x00];
        let rx = self.spi.transfer(&tx)?;
        Ok((u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]))
    }

    /// Read `channel` normalized to 0.0 to 1.0.
    pub fn read_normalized(&mut self, channel: u8) -> Result<f64, AdcError> {
        Ok(f64::from(self.read_raw(channel)?) / f64::from(FULL_SCALE))
    }
}

/// One ADC channel exposed as a console knob.
///
/// Several channels share the same chip. A failed conversion logs once and
/// keeps returning the last good reading until the ADC recovers.
pub struct Mcp3008Channel<S> {
    adc: Rc<RefCell<Mcp3008<S>>>,
    channel: u8,
    invert: bool,
    last: f64,
    failing: bool,
}

impl<S: SpiTransfer> Mcp3008Channel<S> {
    pub fn new(adc: Rc<RefCell<Mcp3008<S>>>, channel: u8, invert: bool) -> Result<Self, AdcError> {
        if channel >= CHANNELS {
            return Err(AdcError::InvalidChannel(channel));
        }
        Ok(Self {
            adc,
            channel,
            invert,
            last: 0.0,
            failing: false,
        })
    }
}

impl<S: SpiTransfer> AnalogInput for Mcp3008Channel<S> {
    fn read(&mut self) -> f64 {
        let result = self.adc.borrow_mut().read_normalized(self.channel);
        match result {
            Ok(value) => {
                if self.failing {
                    log::info!("ADC channel {} recovered", self.channel);
                    self.failing = false;
                }
                // Tuner pot is mounted backwards on the original cabinet
                self.last = if self.invert { 1.0 - value } else { value };
            }
            Err(e) => {
                if !self.failing {
                    log::warn!(
                        "ADC channel {} read failed, holding {:.3}: {}",
                        self.channel,
                        self.last,
                        e
                    );
                    self.failing = true;
                }
            }
        }
        self.last
    }
}
