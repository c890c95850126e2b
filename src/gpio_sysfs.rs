// src/gpio_sysfs.rs
//
// Pull-up bias is not requestable through this API; enable it in
// /boot/config.txt (e.g. `gpio=17=ip,pu`).
use ghost_radio_lib::config::Config;
use ghost_radio_lib::DigitalInput;
use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};

/// Power switch on a GPIO line. Read errors hold the last known position.
pub struct PowerSwitch {
    line: LineHandle,
    active_low: bool,
    last: bool,
    failing: bool,
}

impl PowerSwitch {
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let hw = &config.hardware;
        let mut chip = Chip::new(&hw.gpio_chip)?;
        let line = chip
            .get_line(hw.power_pin)?
            .request(LineRequestFlags::INPUT, 0, "ghost-radio")?;
        Ok(Self {
            line,
            active_low: hw.power_active_low,
            last: false,
            failing: false,
        })
    }
}

impl DigitalInput for PowerSwitch {
    fn read(&mut self) -> bool {
        match self.line.get_value() {
            Ok(value) => {
                self.failing = false;
                self.last = (value == 0) == self.active_low;
            }
            Err(e) => {
                if !self.failing {
                    log::warn!("Power switch read failed, holding {}: {}", self.last, e);
                    self.failing = true;
                }
            }
        }
        self.last
    }
}
