//! PCA9685 register map and bit masks.
//!
//! The datasheet calls the outputs "LED" channels; they are plain PWM outputs here.

use std::time::Duration;

/// Default address with A0-A5 all low
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// LED All Call address, answered by every PCA9685 on the bus
pub const ALL_CALL_ADDRESS: u8 = 0x70;

pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const SUBADR1: u8 = 0x02;
pub const SUBADR2: u8 = 0x03;
pub const SUBADR3: u8 = 0x04;

/// Channel 0 sub-registers; channel N lives `CHANNEL_STRIDE * N` bytes further on
pub const LED0_ON_L: u8 = 0x06;
pub const LED0_ON_H: u8 = 0x07;
pub const LED0_OFF_L: u8 = 0x08;
pub const LED0_OFF_H: u8 = 0x09;

pub const ALL_LED_ON_L: u8 = 0xFA;
pub const ALL_LED_ON_H: u8 = 0xFB;
pub const ALL_LED_OFF_L: u8 = 0xFC;
pub const ALL_LED_OFF_H: u8 = 0xFD;

/// Only writable while MODE1.SLEEP is set
pub const PRE_SCALE: u8 = 0xFE;

// MODE1 bits
pub const MODE1_RESTART: u8 = 0x80;
pub const MODE1_EXTCLK: u8 = 0x40;
pub const MODE1_AI: u8 = 0x20;
pub const MODE1_SLEEP: u8 = 0x10;
pub const MODE1_SUB1: u8 = 0x08;
pub const MODE1_SUB2: u8 = 0x04;
pub const MODE1_SUB3: u8 = 0x02;
pub const MODE1_ALLCALL: u8 = 0x01;

// MODE2 bits
pub const MODE2_INVRT: u8 = 0x10;
pub const MODE2_OUTDRV: u8 = 0x04;

/// Full on / full off override bit in the `_H` registers
pub const FULL_OVERRIDE: u8 = 0x10;

/// Internal oscillator frequency
pub const INTERNAL_OSC_HZ: u32 = 25_000_000;

/// Counts per PWM period (12-bit counter)
pub const COUNTS_PER_PERIOD: u32 = 4096;

/// Largest on/off count
pub const MAX_COUNT: u16 = 4095;

pub const PRESCALE_MIN: u8 = 3;
pub const PRESCALE_MAX: u8 = 255;

pub const CHANNEL_COUNT: u8 = 16;
pub const CHANNEL_STRIDE: u8 = 4;

/// Wait after setting MODE1.SLEEP before PRE_SCALE may be written
pub const OSC_SETTLE: Duration = Duration::from_millis(250);

/// Sub-register of a channel, given as the channel 0 address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubRegister {
    OnLow,
    OnHigh,
    OffLow,
    OffHigh,
}

impl SubRegister {
    fn base(self) -> u8 {
        match self {
            SubRegister::OnLow => LED0_ON_L,
            SubRegister::OnHigh => LED0_ON_H,
            SubRegister::OffLow => LED0_OFF_L,
            SubRegister::OffHigh => LED0_OFF_H,
        }
    }
}

/// Register address of `sub` for `channel`, `None` past the last channel
pub fn channel_register(sub: SubRegister, channel: u8) -> Option<u8> {
    (channel < CHANNEL_COUNT).then(|| sub.base() + CHANNEL_STRIDE * channel)
}

/// Every address a PCA9685 can be strapped to, highest first.
///
/// Skips the All Call address and the reserved 0x7E/0x7F range.
pub fn candidate_addresses() -> impl Iterator<Item = u8> {
    (DEFAULT_ADDRESS..=0x7F)
        .rev()
        .filter(|&addr| addr != ALL_CALL_ADDRESS && addr < 0x7E)
}
