use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use servo_bench::registers::{self, MODE1, MODE1_SLEEP};

/// Look for PCA9685 chips by reading MODE1 at every strappable address
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// I2C character device
    #[arg(long, default_value = "/dev/i2c-1")]
    device: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("PCA9685 Address Probe");
    println!("=====================\n");

    println!("Opening I2C device {}...", args.device);
    let mut i2c = I2cdev::new(&args.device)
        .context(format!("Failed to open I2C device: {}", args.device))?;
    println!("✓ I2C device opened\n");

    let mut found = 0;
    for address in registers::candidate_addresses() {
        let mut mode1 = [0u8; 1];
        // No ACK means nothing is strapped to this address
        if i2c.write_read(address, &[MODE1], &mut mode1).is_ok() {
            found += 1;
            let state = if mode1[0] & MODE1_SLEEP != 0 { "asleep" } else { "awake" };
            println!("✓ 0x{:02X}: MODE1 = 0x{:02X} ({})", address, mode1[0], state);
        }
    }

    println!();
    if found == 0 {
        println!("⚠ No device answered. Check power, SDA/SCL wiring and pull-ups.");
    } else {
        println!("{} device(s) found.", found);
    }

    Ok(())
}
