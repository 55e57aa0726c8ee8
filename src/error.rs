use std::fmt;

/// Requested configuration the chip cannot represent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Output frequency outside what PRE_SCALE can reach for this clock
    FrequencyOutOfRange {
        clock_hz: u32,
        freq_hz: u32,
        min_hz: u32,
        max_hz: u32,
    },
    /// Externally supplied prescale below the hardware minimum
    PrescaleOutOfRange(u8),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::FrequencyOutOfRange { clock_hz, freq_hz, min_hz, max_hz } => write!(
                f,
                "PWM frequency {} Hz out of range {}..={} Hz for a {} Hz clock",
                freq_hz, min_hz, max_hz, clock_hz
            ),
            ConfigurationError::PrescaleOutOfRange(value) => write!(
                f,
                "prescale 0x{:02X} below the hardware minimum 0x{:02X}",
                value,
                crate::registers::PRESCALE_MIN
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Malformed channel request, rejected before anything touches the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    ChannelOutOfRange(u8),
    CountOutOfRange(u16),
    /// Full on and full off requested together
    ConflictingOverrides,
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidArgument::ChannelOutOfRange(ch) => write!(
                f,
                "channel {} out of range 0..{}",
                ch,
                crate::registers::CHANNEL_COUNT
            ),
            InvalidArgument::CountOutOfRange(count) => write!(
                f,
                "count {} out of range 0..={}",
                count,
                crate::registers::MAX_COUNT
            ),
            InvalidArgument::ConflictingOverrides => {
                write!(f, "full on and full off are mutually exclusive")
            }
        }
    }
}

impl std::error::Error for InvalidArgument {}

/// Error from a controller operation; `E` is the transport's own error,
/// passed through untouched and never retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    Configuration(ConfigurationError),
    InvalidArgument(InvalidArgument),
    Transport(E),
}

impl<E> From<ConfigurationError> for Error<E> {
    fn from(e: ConfigurationError) -> Self {
        Error::Configuration(e)
    }
}

impl<E> From<InvalidArgument> for Error<E> {
    fn from(e: InvalidArgument) -> Self {
        Error::InvalidArgument(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "configuration error: {}", e),
            Error::InvalidArgument(e) => write!(f, "invalid argument: {}", e),
            Error::Transport(e) => write!(f, "bus transfer failed: {:?}", e),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for Error<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e: Error<()> = InvalidArgument::ChannelOutOfRange(16).into();
        assert_eq!(e.to_string(), "invalid argument: channel 16 out of range 0..16");

        let e: Error<()> = ConfigurationError::PrescaleOutOfRange(2).into();
        assert_eq!(
            e.to_string(),
            "configuration error: prescale 0x02 below the hardware minimum 0x03"
        );
    }

    #[test]
    fn test_context_keeps_transport_error() {
        use anyhow::Context;
        use std::io::ErrorKind;

        let result: Result<(), Error<ErrorKind>> = Err(Error::Transport(ErrorKind::TimedOut));
        let err = result.context("Failed to configure PWM frequency").unwrap_err();

        assert_eq!(
            format!("{:#}", err),
            "Failed to configure PWM frequency: bus transfer failed: TimedOut"
        );
        assert_eq!(
            err.downcast_ref::<Error<ErrorKind>>(),
            Some(&Error::Transport(ErrorKind::TimedOut))
        );
    }
}
