use anyhow::{Context, Result};
use clap::Parser;
use linux_embedded_hal::I2cdev;
use servo_bench::cli::DeviceArgs;
use servo_bench::servo::{self, Servo, DEFAULT_RANGE_DEGREES};
use servo_bench::{ChannelState, I2cBus, PwmController};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Servo sweep bench: mid, min, mid, max, repeat
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    device: DeviceArgs,

    /// PWM channel the servo signal is wired to
    #[arg(short, long, default_value_t = 0)]
    channel: u8,

    /// Time spent at each end of travel, in milliseconds (half of it at mid)
    #[arg(long, default_value_t = 1000)]
    hold_ms: u64,

    /// Number of sweeps to run (0 = until Ctrl+C)
    #[arg(long, default_value_t = 0)]
    cycles: u32,
}

struct Runtime {
    controller: PwmController,
    bus: I2cBus<I2cdev>,
    servo: Servo,
    output_freq: f64,
    hold: Duration,
}

impl Runtime {
    fn new(args: &Args) -> Result<Self> {
        println!("Initializing servo bench...");

        let (controller, bus) = args.device.connect()
            .context("Failed to initialize PCA9685")?;
        let output_freq = controller.config().output_frequency_hz();

        let servo = Servo::new(args.channel);
        println!(
            "✓ Servo on channel {}: {} counts (min) .. {} counts (max)",
            args.channel,
            servo::pulse_to_counts(servo.pulse_for_angle(0.0), output_freq),
            servo::pulse_to_counts(servo.pulse_for_angle(DEFAULT_RANGE_DEGREES), output_freq),
        );

        Ok(Self {
            controller,
            bus,
            servo,
            output_freq,
            hold: Duration::from_millis(args.hold_ms),
        })
    }

    fn move_to(&mut self, degrees: f64, label: &str) -> Result<()> {
        let state = self.servo.state_for_angle(degrees, self.output_freq);
        self.controller
            .set_channel(&mut self.bus, self.servo.channel(), state)
            .with_context(|| format!("Failed to move servo to {}", label))?;
        if let ChannelState::Timed { off, .. } = state {
            println!("{:<4} {:5.1}°  {:4} counts", label, degrees, off);
        }
        Ok(())
    }

    /// Sleep for `duration`, returning early once shutdown is requested
    fn wait(duration: Duration, shutdown: &AtomicBool) {
        let start = Instant::now();
        while start.elapsed() < duration && !shutdown.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn run(&mut self, shutdown: Arc<AtomicBool>, cycles: u32) -> Result<()> {
        let steps = servo::sweep_steps(DEFAULT_RANGE_DEGREES, self.hold);

        let mut completed = 0u32;
        while !shutdown.load(Ordering::SeqCst) {
            for step in &steps {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                self.move_to(step.degrees, step.label)?;
                Self::wait(step.hold, &shutdown);
            }
            if shutdown.load(Ordering::SeqCst) {
                break;
            }

            completed += 1;
            if cycles != 0 && completed >= cycles {
                break;
            }
        }

        println!("✓ {} sweep(s) completed", completed);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        println!("Shutting down servo bench...");

        // Stop driving the servo rather than leave it holding a position
        self.controller
            .set_channel(&mut self.bus, self.servo.channel(), ChannelState::Off)
            .context("Failed to switch channel off")?;

        println!("✓ Channel {} forced off", self.servo.channel());
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== PCA9685 Servo Bench ===\n");

    let args = Args::parse();

    let mut runtime = Runtime::new(&args)?;

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, shutting down...");
        shutdown_flag_clone.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let result = runtime.run(shutdown_flag, args.cycles);
    if let Err(ref e) = result {
        eprintln!("Error during sweep: {:#}", e);
    }

    // Release the servo even when the sweep failed part way
    runtime.shutdown()?;

    result
}
