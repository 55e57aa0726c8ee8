pub mod bus;
pub mod cli;
pub mod error;
pub mod haptic;
pub mod input;
pub mod pwm;
pub mod registers;
pub mod servo;

pub use bus::{Bus, I2cBus};
pub use error::{ConfigurationError, Error, InvalidArgument};
pub use pwm::{ChannelState, DeviceConfig, PwmController};
