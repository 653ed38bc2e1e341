//! HD44780 4-bit Bus Driver
//!
//! A bit-banged driver for HD44780-family character LCD controllers wired in
//! 4-bit mode (D4..D7, RS, RW, E).
//!
//! ## Features
//!
//! - `no_std` compatible
//! - `embedded-hal` v1.0 support
//! - Datasheet cold-start sequence with configurable, validated delays
//! - Busy-flag synchronization instead of worst-case fixed delays
//! - Optional bounded busy-wait for displays that may be absent
//! - [`core::fmt::Write`] adapter for formatted output
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use hd44780_nibble::{Builder, Lcd, ParallelBus};
//!
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let (rs, rw, en) = (MockPin, MockPin, MockPin);
//! # let (d4, d5, d6, d7) = (MockPin, MockPin, MockPin, MockPin);
//! # let mut delay = MockDelay;
//! let bus = ParallelBus::new(rs, rw, en, [d4, d5, d6, d7]);
//! let config = match Builder::new().build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut lcd = Lcd::new(bus, config);
//! let _ = lcd.init(&mut delay);
//! let _ = lcd.write("Temp:", &mut delay);
//! let _ = lcd.set_cursor(0, 1, &mut delay);
//! let _ = lcd.write_number(-12, &mut delay);
//! ```

#![no_std]

#[cfg(test)]
extern crate alloc;

/// HD44780 instruction encoding
pub mod command;
/// Display configuration types and builder
pub mod config;
/// Error types for the driver
pub mod error;
/// Cold-start sequence
pub mod init;
/// Hardware interface abstraction
pub mod interface;
/// Core display operations
pub mod lcd;

pub use command::ShiftDirection;
pub use config::{
    Builder, Config, Font, Lines, MIN_FIRST_PROBE_DELAY_US, MIN_POWER_ON_DELAY_US,
    MIN_SECOND_PROBE_DELAY_US, PulseTiming, Timing,
};
pub use error::{BuilderError, Error};
pub use init::InitStep;
pub use interface::{Bus, Direction, InterfaceError, ParallelBus, Register};
pub use lcd::{Lcd, Writer};
