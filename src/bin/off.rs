use anyhow::{Context, Result};
use clap::Parser;
use servo_bench::cli::DeviceArgs;
use servo_bench::ChannelState;

/// Force every channel full off through the ALL_LED registers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    device: DeviceArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // No frequency write: this has to work on a chip in any state
    let (controller, mut bus) = args.device.attach()
        .context("Failed to open PCA9685")?;

    controller
        .set_all(&mut bus, ChannelState::Off)
        .context("Failed to switch all channels off")?;

    println!("All channels forced off.");

    Ok(())
}
