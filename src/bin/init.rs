use anyhow::{Context, Result};
use clap::Parser;
use servo_bench::cli::DeviceArgs;

/// Write the PWM frequency configuration and leave the outputs alone
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    device: DeviceArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (controller, _bus) = args.device.connect()
        .context("Failed to initialize PCA9685")?;

    let config = controller.config();
    println!(
        "PCA9685 at 0x{:02X} running at {:.2} Hz (requested {} Hz).",
        config.address(),
        config.output_frequency_hz(),
        config.freq_hz()
    );

    Ok(())
}
