//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and display operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors during display operations
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level GPIO errors
//!
//! With the default configuration the only runtime errors are GPIO failures
//! reported by the HAL. A controller that never clears its busy flag blocks
//! the caller; set [`Builder::busy_poll_limit`](crate::Builder::busy_poll_limit)
//! to get [`Error::BusyTimeout`] instead.
//!
//! ## Example
//!
//! ```
//! use hd44780_nibble::{Builder, BuilderError, Timing};
//!
//! // The first reset probe needs at least 4.1ms
//! let timing = Timing { first_probe_us: 1_000, ..Timing::default() };
//! let result = Builder::new().timing(timing).build();
//! assert!(matches!(result, Err(BuilderError::DelayTooShort { .. })));
//! ```

use crate::config::{Font, Lines};
use crate::init::InitStep;
use crate::interface::Bus;

/// Errors that can occur when driving the display
///
/// Generic over the bus type to preserve the specific error type.
#[derive(Debug)]
pub enum Error<B: Bus> {
    /// Bus error (GPIO)
    ///
    /// Wraps the underlying hardware error from the [`Bus`] implementation.
    Bus(B::Error),
    /// The busy flag stayed set for the whole configured poll budget
    ///
    /// Only returned when a poll limit is configured. The bus has already
    /// been switched back to write direction.
    BusyTimeout {
        /// Number of polls performed
        polls: u32,
    },
}

impl<B: Bus> core::fmt::Display for Error<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "Bus error: {e:?}"),
            Self::BusyTimeout { polls } => {
                write!(f, "Controller still busy after {polls} polls")
            }
        }
    }
}

impl<B: Bus + core::fmt::Debug> core::error::Error for Error<B> {}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the driver is created.
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// A cold-start delay is shorter than the datasheet allows
    DelayTooShort {
        /// Step the delay follows
        step: InitStep,
        /// Datasheet minimum in microseconds
        minimum_us: u32,
        /// Configured value in microseconds
        provided_us: u32,
    },
    /// The font is not available with this many lines
    ///
    /// The controller only draws 5x10 characters in one-line mode.
    UnsupportedFont {
        /// Configured line count
        lines: Lines,
        /// Configured font
        font: Font,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DelayTooShort {
                step,
                minimum_us,
                provided_us,
            } => write!(
                f,
                "Delay after {step} too short: {provided_us}us (min {minimum_us}us)"
            ),
            Self::UnsupportedFont { lines, font } => {
                write!(f, "Font {font:?} not available with {lines:?} lines")
            }
        }
    }
}

impl core::error::Error for BuilderError {}
