use anyhow::{Context, Result};
use clap::Parser;
use servo_bench::cli::DeviceArgs;
use servo_bench::pwm;

/// Set one channel's on/off counts, or force it full on / full off
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    device: DeviceArgs,

    /// PWM channel (0-15)
    #[arg(short, long)]
    channel: u8,

    /// Count (0-4095) at which the output goes high.
    /// Counts are written as words and need MODE1.AI: pass --configure or run `init` first
    #[arg(long, default_value_t = 0)]
    on: u16,

    /// Count (0-4095) at which the output goes low. Needs MODE1.AI, see --on
    #[arg(long, default_value_t = 0)]
    off: u16,

    /// Hold the output high
    #[arg(long)]
    full_on: bool,

    /// Hold the output low
    #[arg(long)]
    full_off: bool,

    /// Also write the frequency configuration first (sets MODE1.AI)
    #[arg(long)]
    configure: bool,
}

impl Args {
    /// Timed counts written to a chip this tool did not configure
    fn relies_on_existing_auto_increment(&self) -> bool {
        !self.configure && !self.full_on && !self.full_off
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (controller, mut bus) = if args.configure {
        args.device.connect().context("Failed to initialize PCA9685")?
    } else {
        args.device.attach().context("Failed to open PCA9685")?
    };

    if args.relies_on_existing_auto_increment() {
        eprintln!(
            "Warning: chip not configured by this run; counts are only correct if MODE1.AI is \
             already set (use --configure or run `init`)"
        );
    }

    pwm::set_channel_raw(
        &mut bus,
        controller.config().address(),
        args.channel,
        args.on,
        args.off,
        args.full_on,
        args.full_off,
    )
    .with_context(|| format!("Failed to set channel {}", args.channel))?;

    if args.full_on {
        println!("Channel {} full on.", args.channel);
    } else if args.full_off {
        println!("Channel {} full off.", args.channel);
    } else {
        println!("Channel {}: on at {}, off at {}.", args.channel, args.on, args.off);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_counts_without_configure_warn() {
        let args = Args::try_parse_from(["set_channel", "-c", "1", "--off", "300"]).unwrap();
        assert!(args.relies_on_existing_auto_increment());

        let args = Args::try_parse_from(["set_channel", "-c", "1", "--off", "300", "--configure"]).unwrap();
        assert!(!args.relies_on_existing_auto_increment());
    }

    #[test]
    fn test_overrides_never_warn() {
        // Override sequences are byte writes only
        let args = Args::try_parse_from(["set_channel", "-c", "1", "--full-on"]).unwrap();
        assert!(!args.relies_on_existing_auto_increment());

        let args = Args::try_parse_from(["set_channel", "-c", "1", "--full-off"]).unwrap();
        assert!(!args.relies_on_existing_auto_increment());
    }
}
