use anyhow::{Context, Result};
use clap::Parser;
use servo_bench::cli::DeviceArgs;
use servo_bench::input::{self, StepCommand};
use servo_bench::servo::{self, PULSE_MID};
use servo_bench::ChannelState;
use std::io::{self, BufRead, Write};

/// Step a servo's pulse width from the keyboard.
///
/// `+` / `-` move one count, a number moves by that many counts, `x` quits.
/// At 50 Hz roughly 200 counts separate the two ends of a 90 degree servo.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    device: DeviceArgs,

    /// PWM channel the servo signal is wired to
    #[arg(short, long, default_value_t = 0)]
    channel: u8,

    /// Starting pulse width in counts (defaults to 1.5 ms)
    #[arg(long)]
    start: Option<u16>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (controller, mut bus) = args.device.connect()
        .context("Failed to initialize PCA9685")?;
    let freq = controller.config().output_frequency_hz();

    let mut counts = args
        .start
        .unwrap_or_else(|| servo::pulse_to_counts(PULSE_MID, freq));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        controller
            .set_channel(&mut bus, args.channel, ChannelState::pulse(counts))
            .context("Failed to set pulse width")?;
        println!(
            "steps in pulse {} ({:.3} ms)",
            counts,
            servo::counts_to_pulse(counts, freq).as_secs_f64() * 1000.0
        );

        print!("--> ");
        io::stdout().flush()?;

        let Some(entry) = lines.next() else {
            break;
        };
        match input::parse_step(&entry.context("Failed to read input")?) {
            StepCommand::Quit => break,
            StepCommand::Adjust(delta) => counts = input::apply_step(counts, delta),
            StepCommand::Ignore => {}
        }
    }

    Ok(())
}
