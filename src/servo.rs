use std::time::Duration;

use crate::pwm::ChannelState;
use crate::registers::{COUNTS_PER_PERIOD, MAX_COUNT};

/// Pulse width for 0 degrees
pub const PULSE_MIN: Duration = Duration::from_micros(1000);
/// Pulse width for 45 degrees
pub const PULSE_MID: Duration = Duration::from_micros(1500);
/// Pulse width for 90 degrees
pub const PULSE_MAX: Duration = Duration::from_micros(2000);

/// Travel covered between PULSE_MIN and PULSE_MAX
pub const DEFAULT_RANGE_DEGREES: f64 = 90.0;

/// Counts a pulse of `pulse` spans at `freq_hz`, saturated at the 12-bit limit.
///
/// At 50 Hz one count is ~4.9 us, so 1 ms is 205 counts and 2 ms is 410.
pub fn pulse_to_counts(pulse: Duration, freq_hz: f64) -> u16 {
    let counts = (pulse.as_secs_f64() * freq_hz * COUNTS_PER_PERIOD as f64).round();
    counts.clamp(0.0, MAX_COUNT as f64) as u16
}

/// Pulse width of `counts` at `freq_hz`
pub fn counts_to_pulse(counts: u16, freq_hz: f64) -> Duration {
    if freq_hz <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(counts as f64 / (freq_hz * COUNTS_PER_PERIOD as f64))
}

/// Pulse width `fraction` of the way from `min` to `max`, fraction clamped to 0..=1
pub fn interpolate_pulse(min: Duration, max: Duration, fraction: f64) -> Duration {
    let fraction = fraction.clamp(0.0, 1.0);
    let min = min.as_nanos() as f64;
    let max = max.as_nanos() as f64;
    Duration::from_nanos((min + (max - min) * fraction).round() as u64)
}

/// One stop of the bench sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStep {
    pub label: &'static str,
    pub degrees: f64,
    pub hold: Duration,
}

/// Mid, min, mid, max over `range_degrees`. The ends are held for `hold`,
/// the mid stops for half of it.
pub fn sweep_steps(range_degrees: f64, hold: Duration) -> [SweepStep; 4] {
    let mid = range_degrees / 2.0;
    [
        SweepStep { label: "mid", degrees: mid, hold: hold / 2 },
        SweepStep { label: "min", degrees: 0.0, hold },
        SweepStep { label: "mid", degrees: mid, hold: hold / 2 },
        SweepStep { label: "max", degrees: range_degrees, hold },
    ]
}

/// Hobby servo on one PWM channel
#[derive(Debug, Clone, Copy)]
pub struct Servo {
    channel: u8,
    min_pulse: Duration,
    max_pulse: Duration,
    range_degrees: f64,
}

impl Servo {
    /// Servo with the 1 ms .. 2 ms / 90 degree profile
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            min_pulse: PULSE_MIN,
            max_pulse: PULSE_MAX,
            range_degrees: DEFAULT_RANGE_DEGREES,
        }
    }

    pub fn with_pulse_range(self, min_pulse: Duration, max_pulse: Duration, range_degrees: f64) -> Self {
        Self {
            min_pulse,
            max_pulse,
            range_degrees,
            ..self
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Pulse width for `degrees`, clamped into the servo's travel
    pub fn pulse_for_angle(&self, degrees: f64) -> Duration {
        if self.range_degrees <= 0.0 {
            return self.min_pulse;
        }
        interpolate_pulse(self.min_pulse, self.max_pulse, degrees / self.range_degrees)
    }

    /// Channel state holding the servo at `degrees`
    pub fn state_for_angle(&self, degrees: f64, freq_hz: f64) -> ChannelState {
        ChannelState::pulse(pulse_to_counts(self.pulse_for_angle(degrees), freq_hz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_counts_at_50hz() {
        assert_eq!(pulse_to_counts(PULSE_MIN, 50.0), 205);
        assert_eq!(pulse_to_counts(PULSE_MID, 50.0), 307);
        assert_eq!(pulse_to_counts(PULSE_MAX, 50.0), 410);
    }

    #[test]
    fn test_pulse_counts_saturate() {
        // Longer than a whole 50 Hz period
        assert_eq!(pulse_to_counts(Duration::from_millis(25), 50.0), MAX_COUNT);
    }

    #[test]
    fn test_counts_to_pulse() {
        let pulse = counts_to_pulse(300, 50.0);
        assert!((pulse.as_secs_f64() - 0.001465).abs() < 1e-6);
        assert_eq!(counts_to_pulse(300, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_angle_clamped() {
        let servo = Servo::new(0);
        assert_eq!(servo.pulse_for_angle(-10.0), PULSE_MIN);
        assert_eq!(servo.pulse_for_angle(45.0), PULSE_MID);
        assert_eq!(servo.pulse_for_angle(200.0), PULSE_MAX);
    }

    #[test]
    fn test_state_for_angle() {
        let servo = Servo::new(2).with_pulse_range(
            Duration::from_micros(500),
            Duration::from_micros(2500),
            180.0,
        );
        assert_eq!(servo.channel(), 2);
        assert_eq!(
            servo.state_for_angle(90.0, 50.0),
            ChannelState::Timed { on: 0, off: 307 }
        );
    }

    #[test]
    fn test_interpolate_pulse() {
        assert_eq!(interpolate_pulse(PULSE_MIN, PULSE_MAX, 0.5), PULSE_MID);
        assert_eq!(interpolate_pulse(PULSE_MIN, PULSE_MAX, 1.5), PULSE_MAX);
        assert_eq!(interpolate_pulse(PULSE_MIN, PULSE_MAX, -1.0), PULSE_MIN);
    }

    #[test]
    fn test_sweep_order() {
        let steps = sweep_steps(DEFAULT_RANGE_DEGREES, Duration::from_secs(1));

        let labels: Vec<_> = steps.iter().map(|s| s.label).collect();
        assert_eq!(labels, ["mid", "min", "mid", "max"]);

        let pulses: Vec<_> = steps
            .iter()
            .map(|s| Servo::new(0).pulse_for_angle(s.degrees))
            .collect();
        assert_eq!(pulses, [PULSE_MID, PULSE_MIN, PULSE_MID, PULSE_MAX]);

        assert_eq!(steps[0].hold, Duration::from_millis(500));
        assert_eq!(steps[3].hold, Duration::from_secs(1));
    }
}
