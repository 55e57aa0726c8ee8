use anyhow::{bail, Context, Result};
use clap::Parser;
use rppal::pwm::{Channel, Polarity, Pwm};
use servo_bench::servo::{self, DEFAULT_RANGE_DEGREES, PULSE_MAX, PULSE_MIN};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Sweep a servo wired straight to the Pi header (no PCA9685): mid, min, mid, max
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// BCM pin carrying the servo signal: 18 (PWM0) or 19 (PWM1)
    #[arg(long, default_value_t = 18)]
    pin: u8,

    /// Pulse period in milliseconds
    #[arg(long, default_value_t = 20)]
    period_ms: u64,

    /// Pulse width at minimum travel, in microseconds
    #[arg(long, default_value_t = PULSE_MIN.as_micros() as u64)]
    min_us: u64,

    /// Pulse width at maximum travel, in microseconds
    #[arg(long, default_value_t = PULSE_MAX.as_micros() as u64)]
    max_us: u64,

    /// Time spent at each end of travel, in milliseconds (half of it at mid)
    #[arg(long, default_value_t = 1000)]
    hold_ms: u64,

    /// Number of sweeps to run (0 = until Ctrl+C)
    #[arg(long, default_value_t = 0)]
    cycles: u32,
}

/// Hardware PWM channel routed to `pin` with the default pin mux
fn pwm_channel(pin: u8) -> Result<Channel> {
    match pin {
        18 => Ok(Channel::Pwm0),
        19 => Ok(Channel::Pwm1),
        _ => bail!("GPIO{} has no hardware PWM channel, use 18 or 19", pin),
    }
}

fn wait(duration: Duration, shutdown: &AtomicBool) {
    let start = Instant::now();
    while start.elapsed() < duration && !shutdown.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(20));
    }
}

fn main() -> Result<()> {
    println!("=== GPIO Servo Sweep ===\n");

    let args = Args::parse();
    let channel = pwm_channel(args.pin)?;
    let min_pulse = Duration::from_micros(args.min_us);
    let max_pulse = Duration::from_micros(args.max_us);
    let period = Duration::from_millis(args.period_ms);
    if min_pulse >= max_pulse || max_pulse >= period {
        bail!(
            "Pulse range {}..{} us does not fit a {} ms period",
            args.min_us,
            args.max_us,
            args.period_ms
        );
    }

    let mid = servo::interpolate_pulse(min_pulse, max_pulse, 0.5);
    let pwm = Pwm::with_period(channel, period, mid, Polarity::Normal, true)
        .with_context(|| format!("Failed to enable hardware PWM on GPIO{}", args.pin))?;
    println!("✓ PWM enabled on GPIO{} ({} ms period)", args.pin, args.period_ms);

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, shutting down...");
        shutdown_flag_clone.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let steps = servo::sweep_steps(DEFAULT_RANGE_DEGREES, Duration::from_millis(args.hold_ms));
    let mut completed = 0u32;
    while !shutdown_flag.load(Ordering::SeqCst) {
        for step in &steps {
            if shutdown_flag.load(Ordering::SeqCst) {
                break;
            }
            let pulse = servo::interpolate_pulse(min_pulse, max_pulse, step.degrees / DEFAULT_RANGE_DEGREES);
            pwm.set_pulse_width(pulse)
                .with_context(|| format!("Failed to move servo to {}", step.label))?;
            println!("{:<4} {:4} us", step.label, pulse.as_micros());
            wait(step.hold, &shutdown_flag);
        }
        if shutdown_flag.load(Ordering::SeqCst) {
            break;
        }

        completed += 1;
        if args.cycles != 0 && completed >= args.cycles {
            break;
        }
    }

    pwm.disable().context("Failed to disable PWM")?;
    println!("✓ {} sweep(s) completed, PWM disabled", completed);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pwm_channel_for_pin() {
        assert!(matches!(pwm_channel(18), Ok(Channel::Pwm0)));
        assert!(matches!(pwm_channel(19), Ok(Channel::Pwm1)));
        assert!(pwm_channel(17).is_err());
    }

    #[test]
    fn test_defaults_match_servo_profile() {
        let args = Args::try_parse_from(["gpio_servo"]).unwrap();
        assert_eq!(args.pin, 18);
        assert_eq!(Duration::from_micros(args.min_us), PULSE_MIN);
        assert_eq!(Duration::from_micros(args.max_us), PULSE_MAX);
    }
}
