//! PCA9685 PWM channel controller.
//!
//! Frequency setup is a sleep / prescale / wake bracket on MODE1; every
//! channel is four registers (ON_L, ON_H, OFF_L, OFF_H) at a fixed stride.
//! The controller never owns the bus, it borrows one for each call.

use embedded_hal::delay::DelayNs;

use crate::bus::Bus;
use crate::error::{ConfigurationError, Error, InvalidArgument};
use crate::registers::{
    self, SubRegister, COUNTS_PER_PERIOD, FULL_OVERRIDE, MAX_COUNT, MODE1,
    MODE1_AI, MODE1_SLEEP, OSC_SETTLE, PRESCALE_MAX, PRESCALE_MIN, PRE_SCALE,
};

/// Lowest and highest output frequency (Hz, rounded) reachable from `clock_hz`
pub fn frequency_range(clock_hz: u32) -> (u32, u32) {
    let per_count = clock_hz as f64 / COUNTS_PER_PERIOD as f64;
    let min_hz = (per_count / (PRESCALE_MAX as f64 + 1.0)).round() as u32;
    let max_hz = (per_count / (PRESCALE_MIN as f64 + 1.0)).round() as u32;
    (min_hz, max_hz)
}

/// PRE_SCALE value for `freq_hz`: `round(clock / (4096 * freq)) - 1`,
/// clamped to 3..=255.
pub fn prescale_for(clock_hz: u32, freq_hz: u32) -> Result<u8, ConfigurationError> {
    let (min_hz, max_hz) = frequency_range(clock_hz);
    if freq_hz == 0 || freq_hz < min_hz || freq_hz > max_hz {
        return Err(ConfigurationError::FrequencyOutOfRange {
            clock_hz,
            freq_hz,
            min_hz,
            max_hz,
        });
    }

    let divisor = COUNTS_PER_PERIOD as f64 * freq_hz as f64;
    let prescale = (clock_hz as f64 / divisor).round() - 1.0;
    Ok(prescale.clamp(PRESCALE_MIN as f64, PRESCALE_MAX as f64) as u8)
}

/// Per-device settings, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    address: u8,
    clock_hz: u32,
    freq_hz: u32,
    prescale: u8,
}

impl DeviceConfig {
    /// Validate the frequency and derive the prescale
    pub fn new(address: u8, clock_hz: u32, freq_hz: u32) -> Result<Self, ConfigurationError> {
        let prescale = prescale_for(clock_hz, freq_hz)?;
        Ok(Self {
            address,
            clock_hz,
            freq_hz,
            prescale,
        })
    }

    /// Use a calibrated prescale instead of the calculated one.
    ///
    /// Some boards run measurably slow: at 50 Hz the calculation gives 0x79
    /// while 0x7C was measured to be closer.
    pub fn with_prescale_override(self, prescale: u8) -> Result<Self, ConfigurationError> {
        if prescale < PRESCALE_MIN {
            return Err(ConfigurationError::PrescaleOutOfRange(prescale));
        }
        Ok(Self { prescale, ..self })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Requested frequency; see [`Self::output_frequency_hz`] for the real one
    pub fn freq_hz(&self) -> u32 {
        self.freq_hz
    }

    pub fn prescale(&self) -> u8 {
        self.prescale
    }

    /// Frequency the chip produces with the chosen prescale
    pub fn output_frequency_hz(&self) -> f64 {
        self.clock_hz as f64 / (COUNTS_PER_PERIOD as f64 * (self.prescale as f64 + 1.0))
    }
}

/// Put the chip to sleep, write PRE_SCALE, wake it with auto-increment on.
///
/// Blocks for [`OSC_SETTLE`] between the sleep write and the prescale write.
/// A failed write aborts the sequence: if the prescale or wake write fails
/// the chip is left asleep with outputs off, and that state is the caller's
/// to recover. Nothing is retried.
pub fn apply<B, D>(bus: &mut B, delay: &mut D, address: u8, prescale: u8) -> Result<(), Error<B::Error>>
where
    B: Bus,
    D: DelayNs,
{
    if prescale < PRESCALE_MIN {
        return Err(ConfigurationError::PrescaleOutOfRange(prescale).into());
    }

    bus.write_byte(address, MODE1, MODE1_SLEEP)
        .map_err(Error::Transport)?;

    delay.delay_ms(OSC_SETTLE.as_millis() as u32);

    bus.write_byte(address, PRE_SCALE, prescale)
        .map_err(Error::Transport)?;

    // Word writes to the channel registers rely on AI
    bus.write_byte(address, MODE1, MODE1_AI)
        .map_err(Error::Transport)?;

    Ok(())
}

/// What a channel output does each period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Held low through the full-off override
    Off,
    /// Held high through the full-on override
    On,
    /// Goes high at count `on` and low at count `off`
    Timed { on: u16, off: u16 },
}

impl ChannelState {
    /// High from the start of the period for `width` counts
    pub fn pulse(width: u16) -> Self {
        ChannelState::Timed { on: 0, off: width }
    }

    /// Build from the flag form used by [`set_channel_raw`].
    /// Counts are ignored, and not checked, when an override is requested.
    pub fn from_flags(
        on_time: u16,
        off_time: u16,
        full_on: bool,
        full_off: bool,
    ) -> Result<Self, InvalidArgument> {
        match (full_on, full_off) {
            (true, true) => Err(InvalidArgument::ConflictingOverrides),
            (false, true) => Ok(ChannelState::Off),
            (true, false) => Ok(ChannelState::On),
            (false, false) => Ok(ChannelState::Timed {
                on: on_time,
                off: off_time,
            }),
        }
    }

    fn validate(&self) -> Result<(), InvalidArgument> {
        if let ChannelState::Timed { on, off } = *self {
            for count in [on, off] {
                if count > MAX_COUNT {
                    return Err(InvalidArgument::CountOutOfRange(count));
                }
            }
        }
        Ok(())
    }
}

/// The four registers of one output, or of the ALL_LED group
#[derive(Debug, Clone, Copy)]
struct OutputRegisters {
    on_l: u8,
    on_h: u8,
    off_l: u8,
    off_h: u8,
}

impl OutputRegisters {
    fn channel(channel: u8) -> Result<Self, InvalidArgument> {
        let register = |sub| {
            registers::channel_register(sub, channel)
                .ok_or(InvalidArgument::ChannelOutOfRange(channel))
        };
        Ok(Self {
            on_l: register(SubRegister::OnLow)?,
            on_h: register(SubRegister::OnHigh)?,
            off_l: register(SubRegister::OffLow)?,
            off_h: register(SubRegister::OffHigh)?,
        })
    }

    fn all() -> Self {
        Self {
            on_l: registers::ALL_LED_ON_L,
            on_h: registers::ALL_LED_ON_H,
            off_l: registers::ALL_LED_OFF_L,
            off_h: registers::ALL_LED_OFF_H,
        }
    }
}

// Each sequence clears the opposing override before setting anything, so
// full on and full off are never set together.
fn write_state<B: Bus>(
    bus: &mut B,
    address: u8,
    regs: OutputRegisters,
    state: ChannelState,
) -> Result<(), B::Error> {
    match state {
        ChannelState::Off => {
            bus.write_byte(address, regs.on_h, 0)?;
            bus.write_byte(address, regs.off_h, FULL_OVERRIDE)?;
        }
        ChannelState::On => {
            bus.write_byte(address, regs.off_h, 0)?;
            bus.write_byte(address, regs.on_l, 0)?;
            bus.write_byte(address, regs.on_h, FULL_OVERRIDE)?;
        }
        ChannelState::Timed { on, off } => {
            bus.write_byte(address, regs.on_h, 0)?;
            bus.write_byte(address, regs.off_h, 0)?;
            bus.write_word(address, regs.on_l, on)?;
            bus.write_word(address, regs.off_l, off)?;
        }
    }
    Ok(())
}

/// Drive one channel. Everything is validated before the first write.
pub fn set_channel<B: Bus>(
    bus: &mut B,
    address: u8,
    channel: u8,
    state: ChannelState,
) -> Result<(), Error<B::Error>> {
    let regs = OutputRegisters::channel(channel)?;
    state.validate()?;

    write_state(bus, address, regs, state).map_err(Error::Transport)
}

/// [`set_channel`] taking counts plus override flags
pub fn set_channel_raw<B: Bus>(
    bus: &mut B,
    address: u8,
    channel: u8,
    on_time: u16,
    off_time: u16,
    full_on: bool,
    full_off: bool,
) -> Result<(), Error<B::Error>> {
    let state = ChannelState::from_flags(on_time, off_time, full_on, full_off)?;
    set_channel(bus, address, channel, state)
}

/// Drive every channel at once through the ALL_LED registers
pub fn set_all<B: Bus>(bus: &mut B, address: u8, state: ChannelState) -> Result<(), Error<B::Error>> {
    state.validate()?;
    write_state(bus, address, OutputRegisters::all(), state).map_err(Error::Transport)
}

/// One PCA9685 with its session configuration
#[derive(Debug, Clone, Copy)]
pub struct PwmController {
    config: DeviceConfig,
}

impl PwmController {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Write the configured frequency, see [`apply`]
    pub fn apply<B: Bus, D: DelayNs>(&self, bus: &mut B, delay: &mut D) -> Result<(), Error<B::Error>> {
        apply(bus, delay, self.config.address, self.config.prescale)
    }

    pub fn set_channel<B: Bus>(
        &self,
        bus: &mut B,
        channel: u8,
        state: ChannelState,
    ) -> Result<(), Error<B::Error>> {
        set_channel(bus, self.config.address, channel, state)
    }

    pub fn set_all<B: Bus>(&self, bus: &mut B, state: ChannelState) -> Result<(), Error<B::Error>> {
        set_all(bus, self.config.address, state)
    }
}
