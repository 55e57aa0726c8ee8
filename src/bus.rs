use anyhow::{Context, Result};
use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use std::fmt::Debug;

/// Register-addressed two-wire bus, write side only.
///
/// Every call blocks until the transfer completes or fails. Nothing here
/// spans more than one transfer, so a caller sharing one bus between threads
/// has to lock around whole register sequences, not single writes.
pub trait Bus {
    type Error: Debug;

    /// Write one byte to `register` of the device at `address`
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error>;

    /// SMBus word write: `register`, low byte, high byte in one transfer.
    /// The high byte lands in `register + 1` only while the device auto-increments.
    fn write_word(&mut self, address: u8, register: u8, value: u16) -> Result<(), Self::Error>;
}

impl<B: Bus + ?Sized> Bus for &mut B {
    type Error = B::Error;

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        (**self).write_byte(address, register, value)
    }

    fn write_word(&mut self, address: u8, register: u8, value: u16) -> Result<(), Self::Error> {
        (**self).write_word(address, register, value)
    }
}

/// [`Bus`] over any embedded-hal I2C master
pub struct I2cBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> I2cBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }
}

impl I2cBus<I2cdev> {
    /// Open a Linux I2C character device
    /// path: e.g. "/dev/i2c-1"
    pub fn open(path: &str) -> Result<Self> {
        let i2c = I2cdev::new(path)
            .context(format!("Failed to open I2C device: {}", path))?;
        Ok(Self::new(i2c))
    }
}

impl<I2C: I2c> Bus for I2cBus<I2C> {
    type Error = I2C::Error;

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(address, &[register, value])
    }

    fn write_word(&mut self, address: u8, register: u8, value: u16) -> Result<(), Self::Error> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c.write(address, &[register, lo, hi])
    }
}

/// Recording transport and delay that model a single PCA9685 register file
#[cfg(test)]
pub(crate) mod mock {
    use super::Bus;
    use embedded_hal::delay::DelayNs;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Event {
        Byte { address: u8, register: u8, value: u8 },
        Word { address: u8, register: u8, value: u16 },
        Delay(Duration),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BusFault;

    pub struct MockBus {
        log: Rc<RefCell<Vec<Event>>>,
        pub registers: [u8; 256],
        /// Register file after every successful write
        pub snapshots: Vec<[u8; 256]>,
        /// Number of bus writes attempted, failed ones included
        pub attempts: usize,
        fail_at: Option<usize>,
    }

    impl MockBus {
        pub fn new() -> Self {
            Self {
                log: Rc::new(RefCell::new(Vec::new())),
                registers: [0; 256],
                snapshots: Vec::new(),
                attempts: 0,
                fail_at: None,
            }
        }

        /// Fail the `index`-th (0-based) bus write
        pub fn failing_at(index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Self::new()
            }
        }

        pub fn delay(&self) -> MockDelay {
            MockDelay {
                log: Rc::clone(&self.log),
            }
        }

        pub fn events(&self) -> Vec<Event> {
            self.log.borrow().clone()
        }

        pub fn writes(&self) -> Vec<Event> {
            self.events()
                .into_iter()
                .filter(|e| !matches!(e, Event::Delay(_)))
                .collect()
        }

        pub fn clear(&mut self) {
            self.log.borrow_mut().clear();
            self.snapshots.clear();
        }

        fn attempt(&mut self) -> Result<(), BusFault> {
            let index = self.attempts;
            self.attempts += 1;
            if self.fail_at == Some(index) {
                Err(BusFault)
            } else {
                Ok(())
            }
        }
    }

    impl Bus for MockBus {
        type Error = BusFault;

        fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusFault> {
            self.attempt()?;
            self.registers[register as usize] = value;
            self.snapshots.push(self.registers);
            self.log.borrow_mut().push(Event::Byte { address, register, value });
            Ok(())
        }

        fn write_word(&mut self, address: u8, register: u8, value: u16) -> Result<(), BusFault> {
            self.attempt()?;
            let [lo, hi] = value.to_le_bytes();
            self.registers[register as usize] = lo;
            self.registers[register.wrapping_add(1) as usize] = hi;
            self.snapshots.push(self.registers);
            self.log.borrow_mut().push(Event::Word { address, register, value });
            Ok(())
        }
    }

    pub struct MockDelay {
        log: Rc<RefCell<Vec<Event>>>,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.log
                .borrow_mut()
                .push(Event::Delay(Duration::from_nanos(ns as u64)));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.log
                .borrow_mut()
                .push(Event::Delay(Duration::from_millis(ms as u64)));
        }
    }
}
