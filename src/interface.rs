//! Hardware interface abstraction
//!
//! This module provides the [`Bus`] trait and the [`ParallelBus`] struct
//! for driving an HD44780 over a 4-bit parallel bus.
//!
//! ## Hardware Requirements
//!
//! The 4-bit bus uses 7 GPIO pins:
//! - **RS**: Register select (output, low=instruction, high=data)
//! - **RW**: Read/write direction (output, low=write, high=read)
//! - **E**: Enable strobe (output, data latched on the falling edge)
//! - **D4..D7**: Data nibble (open-drain output with pull-up, read back as input)
//!
//! D0..D3 of the module are left unconnected.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use hd44780_nibble::{Bus, Direction, ParallelBus, PulseTiming, Register};
//! # use core::convert::Infallible;
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
//! # let mut delay = MockDelay;
//! let mut bus = ParallelBus::new(MockPin, MockPin, MockPin, [MockPin, MockPin, MockPin, MockPin]);
//!
//! // Latch the upper nibble of a clear instruction
//! let _ = bus.set_direction(Direction::Write);
//! let _ = bus.set_register(Register::Instruction);
//! let _ = bus.write_nibble(0x0);
//! let _ = bus.pulse_enable(&mut delay, PulseTiming::default());
//! ```

use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::PulseTiming;

type BusResult<T, E> = core::result::Result<T, E>;

/// Direction of the data lines and the RW line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Data lines driven by the MCU, RW low
    #[default]
    Write,
    /// Data lines released to their pull-ups, RW high
    Read,
}

/// Controller register selected by the RS line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Register {
    /// Instruction register (RS low), also selects the busy flag on reads
    #[default]
    Instruction,
    /// Data register (RS high)
    Data,
}

/// Trait for the 4-bit bus to an HD44780 controller
///
/// This trait abstracts over different hardware implementations, allowing
/// the [`Lcd`](crate::lcd::Lcd) to work with GPIO pins, a port register
/// wrapper, or an in-memory recorder in tests.
///
/// ## Implementing
///
/// For most cases, use the provided [`ParallelBus`] struct. Implement this
/// trait on your own type to write whole port registers at once.
pub trait Bus {
    /// Error type for bus operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Switch the data lines and the RW line between writing and reading
    ///
    /// Switching to [`Direction::Read`] must release the data lines before
    /// RW goes high, so the MCU and the controller never drive them at once.
    fn set_direction(&mut self, direction: Direction) -> BusResult<(), Self::Error>;

    /// Drive the RS line
    fn set_register(&mut self, register: Register) -> BusResult<(), Self::Error>;

    /// Drive the low four bits of `nibble` onto D4..D7
    ///
    /// Only valid while the bus is in [`Direction::Write`].
    fn write_nibble(&mut self, nibble: u8) -> BusResult<(), Self::Error>;

    /// Sample D4..D7 into the low four bits of the result
    ///
    /// Only meaningful while the bus is in [`Direction::Read`] with E high.
    fn read_nibble(&mut self) -> BusResult<u8, Self::Error>;

    /// Drive the E line
    fn set_enable(&mut self, high: bool) -> BusResult<(), Self::Error>;

    /// Strobe the E line once
    ///
    /// Waits for the lines to settle, raises E, holds it, and lowers it
    /// again. The controller latches on the falling edge. The order of these
    /// four steps is the timing contract with the controller.
    fn pulse_enable<D: DelayNs>(
        &mut self,
        delay: &mut D,
        timing: PulseTiming,
    ) -> BusResult<(), Self::Error> {
        delay.delay_ns(timing.setup_ns);
        self.set_enable(true)?;
        delay.delay_ns(timing.hold_ns);
        self.set_enable(false)
    }
}

/// Errors that can occur at the interface level
#[derive(Debug)]
pub enum InterfaceError<PinErr> {
    /// GPIO pin error
    Pin(PinErr),
}

impl<PinErr: Debug> core::fmt::Display for InterfaceError<PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
        }
    }
}

impl<PinErr: Debug> core::error::Error for InterfaceError<PinErr> {}

/// GPIO implementation of [`Bus`]
///
/// Implements [`Bus`] for embedded-hal v1.0 digital pins. The data pins must
/// be configured as open-drain outputs with pull-ups (or an equivalent
/// bidirectional mode): reading releases them high and samples the level the
/// controller drives.
///
/// ## Type Parameters
///
/// * `RS` - Register select pin implementing [`OutputPin`]
/// * `RW` - Read/write pin implementing [`OutputPin`]
/// * `EN` - Enable pin implementing [`OutputPin`]
/// * `D` - Data pins D4..D7 implementing [`OutputPin`] + [`InputPin`]
pub struct ParallelBus<RS, RW, EN, D> {
    /// Register select pin
    rs: RS,
    /// Read/write direction pin
    rw: RW,
    /// Enable strobe pin
    en: EN,
    /// D4, D5, D6, D7
    data: [D; 4],
    /// Current direction of the data lines
    direction: Direction,
}

impl<RS, RW, EN, D> ParallelBus<RS, RW, EN, D>
where
    RS: OutputPin,
    RW: OutputPin,
    EN: OutputPin,
    D: OutputPin + InputPin,
{
    /// Create a new ParallelBus
    ///
    /// # Arguments
    ///
    /// * `rs` - Register select pin
    /// * `rw` - Read/write pin
    /// * `en` - Enable pin
    /// * `data` - Data pins in order `[D4, D5, D6, D7]`
    pub fn new(rs: RS, rw: RW, en: EN, data: [D; 4]) -> Self {
        Self {
            rs,
            rw,
            en,
            data,
            direction: Direction::Write,
        }
    }

    /// Current direction of the data lines
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Give the pins back
    pub fn release(self) -> (RS, RW, EN, [D; 4]) {
        (self.rs, self.rw, self.en, self.data)
    }
}

impl<RS, RW, EN, D, PinErr> Bus for ParallelBus<RS, RW, EN, D>
where
    RS: OutputPin<Error = PinErr>,
    RW: OutputPin<Error = PinErr>,
    EN: OutputPin<Error = PinErr>,
    D: OutputPin<Error = PinErr> + InputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<PinErr>;

    fn set_direction(&mut self, direction: Direction) -> BusResult<(), Self::Error> {
        match direction {
            Direction::Read => {
                // Release the open-drain lines to the pull-ups first
                for pin in &mut self.data {
                    pin.set_high().map_err(InterfaceError::Pin)?;
                }
                self.rw.set_high().map_err(InterfaceError::Pin)?;
            }
            Direction::Write => {
                self.rw.set_low().map_err(InterfaceError::Pin)?;
            }
        }
        self.direction = direction;
        Ok(())
    }

    fn set_register(&mut self, register: Register) -> BusResult<(), Self::Error> {
        let result = match register {
            Register::Instruction => self.rs.set_low(),
            Register::Data => self.rs.set_high(),
        };
        result.map_err(InterfaceError::Pin)
    }

    fn write_nibble(&mut self, nibble: u8) -> BusResult<(), Self::Error> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high().map_err(InterfaceError::Pin)?;
            } else {
                pin.set_low().map_err(InterfaceError::Pin)?;
            }
        }
        Ok(())
    }

    fn read_nibble(&mut self) -> BusResult<u8, Self::Error> {
        let mut nibble = 0;
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if pin.is_high().map_err(InterfaceError::Pin)? {
                nibble |= 1 << bit;
            }
        }
        Ok(nibble)
    }

    fn set_enable(&mut self, high: bool) -> BusResult<(), Self::Error> {
        let result = if high {
            self.en.set_high()
        } else {
            self.en.set_low()
        };
        result.map_err(InterfaceError::Pin)
    }
}
