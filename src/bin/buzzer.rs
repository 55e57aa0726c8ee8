use anyhow::{Context, Result};
use clap::Parser;
use servo_bench::cli::DeviceArgs;
use servo_bench::haptic::{HapticDriver, Line};
use servo_bench::input::{self, HapticCommand};
use std::io::{self, BufRead, Write};

/// Drive a DRV8601 haptic driver through three PCA9685 outputs.
///
/// Type a line name (en, in1, in2) to toggle it, `<>` to reverse the
/// motor, `x` to quit. All lines start low.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    device: DeviceArgs,

    /// Channel wired to EN
    #[arg(long, default_value_t = 1)]
    en: u8,

    /// Channel wired to IN1
    #[arg(long, default_value_t = 2)]
    in1: u8,

    /// Channel wired to IN2
    #[arg(long, default_value_t = 3)]
    in2: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (controller, mut bus) = args.device.connect()
        .context("Failed to initialize PCA9685")?;

    let mut driver = HapticDriver::new(args.en, args.in1, args.in2);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        driver
            .write(&controller, &mut bus)
            .context("Failed to write haptic lines")?;

        for line in Line::ALL {
            println!(
                "{:<3} channel {:2} is {}",
                line.name().to_uppercase(),
                driver.channel(line),
                if driver.level(line) { "on" } else { "off" }
            );
        }
        println!("motor: {:?}", driver.direction());
        println!();

        print!("Line to toggle ");
        io::stdout().flush()?;

        let Some(entry) = lines.next() else {
            break;
        };
        match input::parse_haptic(&entry.context("Failed to read input")?) {
            HapticCommand::Quit => break,
            HapticCommand::Toggle(line) => driver.toggle(line),
            HapticCommand::Reverse => {
                if let Err(e) = driver.reverse() {
                    println!("{}", e);
                    println!();
                }
            }
            HapticCommand::Unrecognized => println!("unrecognized input"),
        }
    }

    Ok(())
}
