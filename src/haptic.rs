//! DRV8601 haptic driver wired to three PCA9685 outputs used as logic lines.
//!
//! EN low disables the output stage. With EN high the differential output
//! follows IN1/IN2: IN1 high and IN2 low spins the motor clockwise, the
//! opposite spins it counter-clockwise, and equal inputs give a reduced
//! positive output.

use std::fmt;

use crate::bus::Bus;
use crate::error::Error;
use crate::pwm::{ChannelState, PwmController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Enable,
    In1,
    In2,
}

impl Line {
    pub const ALL: [Line; 3] = [Line::Enable, Line::In1, Line::In2];

    pub fn name(&self) -> &'static str {
        match self {
            Line::Enable => "en",
            Line::In1 => "in1",
            Line::In2 => "in2",
        }
    }

    fn index(&self) -> usize {
        match self {
            Line::Enable => 0,
            Line::In1 => 1,
            Line::In2 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Stopped,
    Clockwise,
    CounterClockwise,
    /// Enabled with IN1 == IN2
    Reduced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverseError {
    NotEnabled,
    InputsNotConfigured,
}

impl fmt::Display for ReverseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReverseError::NotEnabled => write!(f, "motor not enabled"),
            ReverseError::InputsNotConfigured => write!(f, "inputs not configured"),
        }
    }
}

impl std::error::Error for ReverseError {}

/// Line levels of one DRV8601, all low on creation
#[derive(Debug, Clone)]
pub struct HapticDriver {
    channels: [u8; 3],
    levels: [bool; 3],
}

impl Default for HapticDriver {
    fn default() -> Self {
        Self::new(1, 2, 3)
    }
}

impl HapticDriver {
    /// PWM channels wired to EN, IN1 and IN2
    pub fn new(enable: u8, in1: u8, in2: u8) -> Self {
        Self {
            channels: [enable, in1, in2],
            levels: [false; 3],
        }
    }

    pub fn channel(&self, line: Line) -> u8 {
        self.channels[line.index()]
    }

    pub fn level(&self, line: Line) -> bool {
        self.levels[line.index()]
    }

    pub fn toggle(&mut self, line: Line) {
        self.levels[line.index()] = !self.levels[line.index()];
    }

    /// Swap IN1 and IN2. Only allowed while the motor is actually driven one way.
    pub fn reverse(&mut self) -> Result<(), ReverseError> {
        if !self.level(Line::Enable) {
            return Err(ReverseError::NotEnabled);
        }
        if self.level(Line::In1) == self.level(Line::In2) {
            return Err(ReverseError::InputsNotConfigured);
        }
        self.toggle(Line::In1);
        self.toggle(Line::In2);
        Ok(())
    }

    pub fn direction(&self) -> Direction {
        match (self.level(Line::Enable), self.level(Line::In1), self.level(Line::In2)) {
            (false, _, _) => Direction::Stopped,
            (true, true, false) => Direction::Clockwise,
            (true, false, true) => Direction::CounterClockwise,
            (true, _, _) => Direction::Reduced,
        }
    }

    /// `(channel, state)` for every line, EN first
    pub fn states(&self) -> [(u8, ChannelState); 3] {
        Line::ALL.map(|line| {
            let state = if self.level(line) {
                ChannelState::On
            } else {
                ChannelState::Off
            };
            (self.channel(line), state)
        })
    }

    /// Write all three lines
    pub fn write<B: Bus>(&self, controller: &PwmController, bus: &mut B) -> Result<(), Error<B::Error>> {
        for (channel, state) in self.states() {
            controller.set_channel(bus, channel, state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::MockBus;
    use crate::pwm::DeviceConfig;
    use crate::registers::{DEFAULT_ADDRESS, FULL_OVERRIDE, INTERNAL_OSC_HZ};

    fn driven_clockwise() -> HapticDriver {
        let mut driver = HapticDriver::default();
        driver.toggle(Line::Enable);
        driver.toggle(Line::In1);
        driver
    }

    #[test]
    fn test_starts_low() {
        let driver = HapticDriver::default();
        assert!(Line::ALL.iter().all(|&line| !driver.level(line)));
        assert_eq!(driver.direction(), Direction::Stopped);
    }

    #[test]
    fn test_direction() {
        let mut driver = driven_clockwise();
        assert_eq!(driver.direction(), Direction::Clockwise);

        driver.toggle(Line::In2);
        assert_eq!(driver.direction(), Direction::Reduced);

        driver.toggle(Line::In1);
        assert_eq!(driver.direction(), Direction::CounterClockwise);
    }

    #[test]
    fn test_reverse() {
        let mut driver = driven_clockwise();
        driver.reverse().unwrap();
        assert_eq!(driver.direction(), Direction::CounterClockwise);
        driver.reverse().unwrap();
        assert_eq!(driver.direction(), Direction::Clockwise);
    }

    #[test]
    fn test_reverse_refused() {
        let mut driver = HapticDriver::default();
        driver.toggle(Line::In1);
        assert_eq!(driver.reverse(), Err(ReverseError::NotEnabled));

        driver.toggle(Line::Enable);
        driver.toggle(Line::In2);
        assert_eq!(driver.reverse(), Err(ReverseError::InputsNotConfigured));
        // Unchanged after a refusal
        assert!(driver.level(Line::In1) && driver.level(Line::In2));
    }

    #[test]
    fn test_write_lines() {
        let config = DeviceConfig::new(DEFAULT_ADDRESS, INTERNAL_OSC_HZ, 200).unwrap();
        let controller = PwmController::new(config);
        let mut bus = MockBus::new();

        driven_clockwise().write(&controller, &mut bus).unwrap();

        // EN (ch1) and IN1 (ch2) full on, IN2 (ch3) full off
        assert_eq!(bus.registers[0x0B], FULL_OVERRIDE);
        assert_eq!(bus.registers[0x0F], FULL_OVERRIDE);
        assert_eq!(bus.registers[0x13], 0);
        assert_eq!(bus.registers[0x15], FULL_OVERRIDE);
    }
}
