use anyhow::{Context, Result};
use clap::Args;
use linux_embedded_hal::{Delay, I2cdev};

use crate::bus::I2cBus;
use crate::pwm::{DeviceConfig, PwmController};
use crate::registers::{DEFAULT_ADDRESS, INTERNAL_OSC_HZ};

/// Which PCA9685 to talk to and how to clock it; flattened into every tool
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// I2C character device
    #[arg(long, default_value = "/dev/i2c-1")]
    pub device: String,

    /// PCA9685 bus address (decimal or 0x-prefixed hex)
    #[arg(long, default_value_t = DEFAULT_ADDRESS, value_parser = parse_byte)]
    pub address: u8,

    /// Oscillator frequency in Hz (25 MHz internal, or EXTCLK)
    #[arg(long, default_value_t = INTERNAL_OSC_HZ)]
    pub clock: u32,

    /// PWM output frequency in Hz
    #[arg(long, default_value_t = 50)]
    pub freq: u32,

    /// Calibrated prescale to write instead of the calculated one, e.g. 0x7C for 50 Hz
    #[arg(long, value_parser = parse_byte)]
    pub prescale: Option<u8>,
}

impl DeviceArgs {
    pub fn config(&self) -> Result<DeviceConfig> {
        let config = DeviceConfig::new(self.address, self.clock, self.freq)
            .context("Invalid PWM frequency")?;
        match self.prescale {
            Some(prescale) => Ok(config
                .with_prescale_override(prescale)
                .context("Invalid prescale override")?),
            None => Ok(config),
        }
    }

    pub fn open_bus(&self) -> Result<I2cBus<I2cdev>> {
        I2cBus::open(&self.device)
    }

    /// Open the bus without touching the chip's configuration
    pub fn attach(&self) -> Result<(PwmController, I2cBus<I2cdev>)> {
        let controller = PwmController::new(self.config()?);
        let bus = self.open_bus()?;
        Ok((controller, bus))
    }

    /// Open the bus and write the frequency configuration
    pub fn connect(&self) -> Result<(PwmController, I2cBus<I2cdev>)> {
        let (controller, mut bus) = self.attach()?;
        let config = controller.config();

        println!(
            "Configuring PCA9685 at 0x{:02X} on {}: prescale 0x{:02X} ({:.2} Hz)",
            config.address(),
            self.device,
            config.prescale(),
            config.output_frequency_hz()
        );
        controller
            .apply(&mut bus, &mut Delay)
            .context("Failed to configure PWM frequency")?;
        println!("✓ PCA9685 awake, auto-increment enabled");

        Ok((controller, bus))
    }
}

/// Parse `64` or `0x40`
pub fn parse_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("'{}' is not a byte value: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        device: DeviceArgs,
    }

    #[test]
    fn test_parse_byte() {
        assert_eq!(parse_byte("0x40"), Ok(0x40));
        assert_eq!(parse_byte("0X7c"), Ok(0x7C));
        assert_eq!(parse_byte("65"), Ok(65));
        assert!(parse_byte("0x100").is_err());
        assert!(parse_byte("forty").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        assert_eq!(cli.device.device, "/dev/i2c-1");
        assert_eq!(cli.device.address, 0x40);

        let config = cli.device.config().unwrap();
        assert_eq!(config.freq_hz(), 50);
        assert_eq!(config.prescale(), 0x79);
    }

    #[test]
    fn test_prescale_override_flag() {
        let cli = TestCli::try_parse_from(["test", "--address", "0x41", "--prescale", "0x7C"]).unwrap();
        let config = cli.device.config().unwrap();
        assert_eq!(config.address(), 0x41);
        assert_eq!(config.prescale(), 0x7C);
    }

    #[test]
    fn test_bad_frequency_rejected() {
        let cli = TestCli::try_parse_from(["test", "--freq", "2000"]).unwrap();
        assert!(cli.device.config().is_err());
    }
}
