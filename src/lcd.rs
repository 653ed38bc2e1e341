//! Core display operations
//!
//! Every public operation funnels through two primitives: a byte transfer
//! (two nibbles, one enable pulse each) and a busy-flag wait. The busy-flag
//! wait is the only place the bus leaves write direction, and it always puts
//! it back before returning.

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::command::{
    self, BUSY_FLAG, CLEAR_DISPLAY, FOUR_BIT_NIBBLE, RESET_NIBBLE, ShiftDirection,
};
use crate::config::Config;
use crate::error::Error;
use crate::init::InitStep;
use crate::interface::{Bus, Direction, Register};

type LcdResult<B> = core::result::Result<(), Error<B>>;

/// Decimal text for `value`, at most six bytes including the sign
fn format_number(buffer: &mut itoa::Buffer, value: i16) -> &str {
    buffer.format(value)
}

/// HD44780 driver over a 4-bit bus
///
/// The driver owns the bus, so two drivers can never share the same lines.
/// It does not mirror the controller's cursor or display state.
///
/// [`Lcd::init`] must run before any other operation; the controller's
/// behavior is undefined otherwise.
///
/// ## Example
///
/// ```rust,no_run
/// use embedded_hal::delay::DelayNs;
/// use embedded_hal::digital::{InputPin, OutputPin};
/// use hd44780_nibble::{Builder, Lcd, ParallelBus};
/// # use core::convert::Infallible;
/// # struct MockPin;
/// # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
/// # impl OutputPin for MockPin {
/// #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl InputPin for MockPin {
/// #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(false) }
/// #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(true) }
/// # }
/// # struct MockDelay;
/// # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
/// # let mut delay = MockDelay;
/// let bus = ParallelBus::new(MockPin, MockPin, MockPin, [MockPin, MockPin, MockPin, MockPin]);
/// let config = match Builder::new().build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
///
/// let mut lcd = Lcd::new(bus, config);
/// let _ = lcd.init(&mut delay);
/// let _ = lcd.write("catapus", &mut delay);
/// let _ = lcd.write_number(123, &mut delay);
/// let _ = lcd.write_byte(b'@', &mut delay);
/// ```
pub struct Lcd<B>
where
    B: Bus,
{
    /// Hardware bus
    bus: B,
    /// Display configuration
    config: Config,
}

impl<B> Lcd<B>
where
    B: Bus,
{
    /// Create a new Lcd instance
    ///
    /// Does not touch the bus; call [`Lcd::init`] next.
    pub fn new(bus: B, config: Config) -> Self {
        Self { bus, config }
    }

    /// Run the cold-start sequence
    ///
    /// Leaves the controller in 4-bit mode with the configured lines and
    /// font, cursor at (0, 0), display cleared and switched on. Calling it
    /// again repeats the whole sequence.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<B> {
        let mut step = Some(InitStep::LinesConfigured);
        while let Some(current) = step {
            debug!("LCD init: {current}");
            self.run_step(current, delay)?;
            step = current.next();
        }
        Ok(())
    }

    /// Execute a single cold-start step, including the wait that ends it
    fn run_step<D: DelayNs>(&mut self, step: InitStep, delay: &mut D) -> LcdResult<B> {
        match step {
            InitStep::LinesConfigured => {
                self.bus.set_enable(false).map_err(Error::Bus)?;
                self.bus
                    .set_direction(Direction::Write)
                    .map_err(Error::Bus)?;
                self.bus
                    .set_register(Register::Instruction)
                    .map_err(Error::Bus)?;
            }
            InitStep::ResetPulse1 | InitStep::ResetPulse2 | InitStep::ResetPulse3 => {
                self.send_nibble(RESET_NIBBLE, delay)?;
            }
            InitStep::ModeSwitch => self.send_nibble(FOUR_BIT_NIBBLE, delay)?,
            InitStep::FunctionSet => {
                let function_set = command::function_set(self.config.lines, self.config.font);
                self.transfer(function_set, Register::Instruction, delay)?;
            }
            InitStep::CursorHomed => {
                self.transfer(command::set_cursor(0, 0), Register::Instruction, delay)?;
            }
            InitStep::Cleared => self.transfer(CLEAR_DISPLAY, Register::Instruction, delay)?,
            InitStep::DisplayOn => {
                let control = self.display_control(true);
                self.transfer(control, Register::Instruction, delay)?;
            }
        }

        if step.uses_busy_flag() {
            return self.wait_ready(delay);
        }
        if let Some(us) = self.config.timing.delay_after(step) {
            delay.delay_us(us);
        }
        Ok(())
    }

    /// Write a string at the cursor position
    ///
    /// Each byte is sent as a character code and waited on before the next.
    /// An empty string does not touch the bus.
    pub fn write<D: DelayNs>(&mut self, text: &str, delay: &mut D) -> LcdResult<B> {
        self.write_bytes(text.as_bytes(), delay)
    }

    /// Write raw character codes at the cursor position
    ///
    /// Useful for the controller's non-ASCII glyphs (e.g. 0xDF, the degree sign
    /// on the A00 ROM).
    pub fn write_bytes<D: DelayNs>(&mut self, bytes: &[u8], delay: &mut D) -> LcdResult<B> {
        for &byte in bytes {
            self.write_byte(byte, delay)?;
        }
        Ok(())
    }

    /// Write a single character code at the cursor position
    pub fn write_byte<D: DelayNs>(&mut self, byte: u8, delay: &mut D) -> LcdResult<B> {
        self.transfer(byte, Register::Data, delay)?;
        self.wait_ready(delay)
    }

    /// Write a signed number in decimal
    ///
    /// No leading zeros, a minus sign for negative values, and `"0"` for zero.
    pub fn write_number<D: DelayNs>(&mut self, value: i16, delay: &mut D) -> LcdResult<B> {
        let mut buffer = itoa::Buffer::new();
        self.write(format_number(&mut buffer, value), delay)
    }

    /// Move the cursor to `col` on line `row`
    ///
    /// Row 0 is the top line, row 1 the bottom line. Values are passed to
    /// the controller without validation.
    pub fn set_cursor<D: DelayNs>(&mut self, col: u8, row: u8, delay: &mut D) -> LcdResult<B> {
        self.command(command::set_cursor(col, row), delay)
    }

    /// Clear the display and home the cursor
    ///
    /// This is one of the slow instructions; the busy-flag wait absorbs it.
    pub fn clear<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<B> {
        self.command(CLEAR_DISPLAY, delay)
    }

    /// Move the cursor to (0, 0)
    ///
    /// Sends a set-cursor instruction instead of the controller's own
    /// return-home, which takes up to 1.5ms for the same effect.
    pub fn return_home<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<B> {
        self.set_cursor(0, 0, delay)
    }

    /// Switch the display on or off
    ///
    /// Switching on restores the configured cursor and blink settings.
    /// Display memory is kept either way.
    pub fn toggle_display<D: DelayNs>(&mut self, on: bool, delay: &mut D) -> LcdResult<B> {
        let control = self.display_control(on);
        self.command(control, delay)
    }

    fn display_control(&self, on: bool) -> u8 {
        if on {
            command::display_control(true, self.config.cursor, self.config.blink)
        } else {
            command::display_control(false, false, false)
        }
    }

    /// Move the cursor one position left or right
    pub fn shift_cursor<D: DelayNs>(
        &mut self,
        direction: ShiftDirection,
        delay: &mut D,
    ) -> LcdResult<B> {
        self.command(command::cursor_shift(direction), delay)
    }

    /// Block until the controller clears its busy flag
    ///
    /// Switches the bus to read direction, then for each poll raises E,
    /// samples D7, lowers E, and clocks out the unused low status nibble
    /// with a second pulse. When this returns, E is low and the bus is back
    /// in write direction, whether the wait succeeded or not. E is lowered
    /// before R/W changes.
    ///
    /// # Errors
    ///
    /// With `busy_poll_limit` at 0 this only fails on bus errors. Otherwise
    /// returns [`Error::BusyTimeout`] once the limit is reached. The first
    /// error wins if restoring the bus also fails.
    pub fn wait_ready<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<B> {
        let result = self.poll_busy(delay);
        let released = self.bus.set_enable(false).map_err(Error::Bus);
        let restored = self
            .bus
            .set_direction(Direction::Write)
            .map_err(Error::Bus);
        result?;
        released?;
        restored
    }

    fn poll_busy<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<B> {
        let limit = self.config.busy_poll_limit;
        let pulse = self.config.timing.pulse;

        self.bus.set_direction(Direction::Read).map_err(Error::Bus)?;
        self.bus
            .set_register(Register::Instruction)
            .map_err(Error::Bus)?;

        let mut polls = 0u32;
        loop {
            delay.delay_ns(pulse.setup_ns);
            self.bus.set_enable(true).map_err(Error::Bus)?;
            delay.delay_ns(pulse.hold_ns);
            let status = self.bus.read_nibble().map_err(Error::Bus)?;
            self.bus.set_enable(false).map_err(Error::Bus)?;
            self.bus.pulse_enable(delay, pulse).map_err(Error::Bus)?;
            polls = polls.saturating_add(1);

            if status & BUSY_FLAG == 0 {
                trace!("LCD ready after {polls} polls");
                return Ok(());
            }
            if limit > 0 && polls >= limit {
                warn!("LCD busy flag still set after {polls} polls");
                return Err(Error::BusyTimeout { polls });
            }
        }
    }

    /// Get a [`core::fmt::Write`] adapter bound to a delay provider
    ///
    /// ```rust,ignore
    /// use core::fmt::Write;
    /// write!(lcd.writer(&mut delay), "T={}C", 21)?;
    /// ```
    pub fn writer<'a, D: DelayNs>(&'a mut self, delay: &'a mut D) -> Writer<'a, B, D> {
        Writer {
            lcd: self,
            delay,
            error: None,
        }
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    /// Send an instruction and wait for it to complete
    fn command<D: DelayNs>(&mut self, command: u8, delay: &mut D) -> LcdResult<B> {
        self.transfer(command, Register::Instruction, delay)?;
        self.wait_ready(delay)
    }

    /// Send one byte as two nibbles, high nibble first
    ///
    /// Fire-and-forget: the controller does not acknowledge, so the caller
    /// must wait for completion before the next transfer.
    fn transfer<D: DelayNs>(
        &mut self,
        byte: u8,
        register: Register,
        delay: &mut D,
    ) -> LcdResult<B> {
        trace!("LCD {register:?} <- {byte:#04x}");
        self.bus.set_register(register).map_err(Error::Bus)?;
        self.send_nibble(byte >> 4, delay)?;
        self.send_nibble(byte & 0x0F, delay)
    }

    fn send_nibble<D: DelayNs>(&mut self, nibble: u8, delay: &mut D) -> LcdResult<B> {
        self.bus.write_nibble(nibble).map_err(Error::Bus)?;
        self.bus
            .pulse_enable(delay, self.config.timing.pulse)
            .map_err(Error::Bus)
    }
}

/// [`core::fmt::Write`] adapter returned by [`Lcd::writer`]
///
/// `core::fmt::Error` carries no payload, so the last bus error is kept
/// and can be retrieved with [`Writer::take_error`].
pub struct Writer<'a, B, D>
where
    B: Bus,
{
    lcd: &'a mut Lcd<B>,
    delay: &'a mut D,
    error: Option<Error<B>>,
}

impl<B, D> Writer<'_, B, D>
where
    B: Bus,
{
    /// Take the error that made the last write fail, if any
    pub fn take_error(&mut self) -> Option<Error<B>> {
        self.error.take()
    }
}

impl<B, D> core::fmt::Write for Writer<'_, B, D>
where
    B: Bus,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.lcd.write(s, self.delay).map_err(|e| {
            self.error = Some(e);
            core::fmt::Error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Builder, Font, Lines, Timing};
    use alloc::vec::Vec;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Event {
        Direction(Direction),
        Register(Register),
        Nibble(u8),
        Enable(bool),
        Read,
    }

    /// In-memory bus that records every line change
    ///
    /// Reports busy for `busy_polls` reads after each write-to-read switch.
    #[derive(Debug, Default)]
    struct RecordingBus {
        events: Vec<Event>,
        busy_polls: u32,
        busy_remaining: u32,
        fail_reads: bool,
    }

    #[derive(Debug, PartialEq)]
    struct MockBusError;

    impl RecordingBus {
        fn busy_for(polls: u32) -> Self {
            Self {
                busy_polls: polls,
                ..Self::default()
            }
        }

        fn nibbles(&self) -> Vec<u8> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    Event::Nibble(n) => Some(*n),
                    _ => None,
                })
                .collect()
        }

        fn reads(&self) -> usize {
            self.events.iter().filter(|e| **e == Event::Read).count()
        }

        /// Bytes sent to the given register, rebuilt from nibble pairs
        fn bytes(&self, register: Register) -> Vec<u8> {
            let mut current = Register::Instruction;
            let mut nibbles = Vec::new();
            for event in &self.events {
                match event {
                    Event::Register(r) => current = *r,
                    Event::Nibble(n) if current == register => nibbles.push(*n),
                    _ => {}
                }
            }
            nibbles
                .chunks(2)
                .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
                .collect()
        }

        fn last_direction(&self) -> Option<Direction> {
            self.events.iter().rev().find_map(|event| match event {
                Event::Direction(d) => Some(*d),
                _ => None,
            })
        }
    }

    impl Bus for RecordingBus {
        type Error = MockBusError;

        fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
            if direction == Direction::Read {
                self.busy_remaining = self.busy_polls;
            }
            self.events.push(Event::Direction(direction));
            Ok(())
        }

        fn set_register(&mut self, register: Register) -> Result<(), Self::Error> {
            self.events.push(Event::Register(register));
            Ok(())
        }

        fn write_nibble(&mut self, nibble: u8) -> Result<(), Self::Error> {
            self.events.push(Event::Nibble(nibble));
            Ok(())
        }

        fn read_nibble(&mut self) -> Result<u8, Self::Error> {
            self.events.push(Event::Read);
            if self.fail_reads {
                return Err(MockBusError);
            }
            if self.busy_remaining > 0 {
                self.busy_remaining -= 1;
                Ok(BUSY_FLAG)
            } else {
                Ok(0x0)
            }
        }

        fn set_enable(&mut self, high: bool) -> Result<(), Self::Error> {
            self.events.push(Event::Enable(high));
            Ok(())
        }
    }

    /// Records every microsecond delay, ignores strobe-level delays
    #[derive(Default)]
    struct RecordingDelay {
        us: Vec<u32>,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_us(&mut self, us: u32) {
            self.us.push(us);
        }
    }

    fn test_lcd(bus: RecordingBus) -> Lcd<RecordingBus> {
        Lcd::new(bus, Builder::new().build().unwrap())
    }

    fn ready_lcd() -> (Lcd<RecordingBus>, RecordingDelay) {
        let mut lcd = test_lcd(RecordingBus::default());
        let mut delay = RecordingDelay::default();
        lcd.init(&mut delay).unwrap();
        lcd.bus.events.clear();
        (lcd, delay)
    }

    fn written_text(lcd: &Lcd<RecordingBus>) -> Vec<u8> {
        lcd.bus.bytes(Register::Data)
    }

    #[test]
    fn test_write_number_formats() {
        for (value, expected) in [
            (123, "123"),
            (-5, "-5"),
            (0, "0"),
            (10000, "10000"),
            (-32768, "-32768"),
            (32767, "32767"),
            (7, "7"),
            (-100, "-100"),
        ] {
            let (mut lcd, mut delay) = ready_lcd();
            lcd.write_number(value, &mut delay).unwrap();
            assert_eq!(written_text(&lcd), expected.as_bytes(), "value {value}");
        }
    }

    #[test]
    fn test_format_number_covers_every_i16() {
        let mut buffer = itoa::Buffer::new();
        for value in i16::MIN..=i16::MAX {
            let text = format_number(&mut buffer, value);
            assert_eq!(text, alloc::format!("{value}"));

            let digits = text.strip_prefix('-').unwrap_or(text);
            assert_eq!(text.starts_with('-'), value < 0, "value {value}");
            assert!(!digits.is_empty() && digits.len() <= 5, "value {value}");
            assert!(digits == "0" || !digits.starts_with('0'), "value {value}");
        }
    }

    #[test]
    fn test_write_string_sends_data_bytes_in_order() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.write("catapus", &mut delay).unwrap();
        assert_eq!(written_text(&lcd), b"catapus");
        assert!(lcd.bus.bytes(Register::Instruction).is_empty());
    }

    #[test]
    fn test_write_empty_string_touches_nothing() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.write("", &mut delay).unwrap();
        assert!(lcd.bus.events.is_empty());
    }

    #[test]
    fn test_byte_transfer_is_two_nibbles_each_with_one_pulse() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.transfer(0xA7, Register::Data, &mut delay).unwrap();
        assert_eq!(
            lcd.bus.events,
            [
                Event::Register(Register::Data),
                Event::Nibble(0xA),
                Event::Enable(true),
                Event::Enable(false),
                Event::Nibble(0x7),
                Event::Enable(true),
                Event::Enable(false),
            ]
        );
    }

    #[test]
    fn test_every_character_is_followed_by_busy_wait() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.write("ab", &mut delay).unwrap();
        assert_eq!(lcd.bus.reads(), 2);

        // Register select is forced to instruction for the status read
        let registers: Vec<Register> = lcd
            .bus
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Register(r) => Some(*r),
                _ => None,
            })
            .collect();
        assert_eq!(
            registers,
            [
                Register::Data,
                Register::Instruction,
                Register::Data,
                Register::Instruction
            ]
        );
    }

    #[test]
    fn test_busy_wait_polls_until_clear() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.bus.busy_polls = 3;
        lcd.wait_ready(&mut delay).unwrap();

        assert_eq!(lcd.bus.reads(), 4);
        // Each poll: E high, read, E low, then a dummy pulse for the low nibble
        let poll = [
            Event::Enable(true),
            Event::Read,
            Event::Enable(false),
            Event::Enable(true),
            Event::Enable(false),
        ];
        let events = &lcd.bus.events;
        assert_eq!(events[0], Event::Direction(Direction::Read));
        assert_eq!(events[1], Event::Register(Register::Instruction));
        for chunk in events[2..events.len() - 2].chunks(poll.len()) {
            assert_eq!(chunk, poll);
        }
        assert_eq!(
            events[events.len() - 2..],
            [Event::Enable(false), Event::Direction(Direction::Write)]
        );
    }

    #[test]
    fn test_busy_wait_never_writes_nibbles() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.bus.busy_polls = 5;
        lcd.wait_ready(&mut delay).unwrap();
        assert!(lcd.bus.nibbles().is_empty());
    }

    #[test]
    fn test_busy_wait_unbounded_by_default() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.bus.busy_polls = 10_000;
        lcd.wait_ready(&mut delay).unwrap();
        assert_eq!(lcd.bus.reads(), 10_001);
    }

    #[test]
    fn test_busy_wait_bounded_reports_timeout_and_restores_write() {
        let config = Builder::new().busy_poll_limit(8).build().unwrap();
        let mut lcd = Lcd::new(RecordingBus::busy_for(u32::MAX), config);
        let mut delay = RecordingDelay::default();

        let result = lcd.wait_ready(&mut delay);
        assert!(matches!(result, Err(Error::BusyTimeout { polls: 8 })));
        assert_eq!(lcd.bus.reads(), 8);
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
    }

    #[test]
    fn test_busy_wait_bounded_succeeds_within_limit() {
        let config = Builder::new().busy_poll_limit(8).build().unwrap();
        let mut lcd = Lcd::new(RecordingBus::busy_for(7), config);
        let mut delay = RecordingDelay::default();

        assert!(lcd.wait_ready(&mut delay).is_ok());
        assert_eq!(lcd.bus.reads(), 8);
    }

    #[test]
    fn test_bus_error_during_poll_still_restores_write() {
        let bus = RecordingBus {
            fail_reads: true,
            ..RecordingBus::default()
        };
        let mut lcd = test_lcd(bus);
        let mut delay = RecordingDelay::default();

        let result = lcd.wait_ready(&mut delay);
        assert!(matches!(result, Err(Error::Bus(MockBusError))));
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
    }

    #[test]
    fn test_failed_status_read_lowers_enable_before_write() {
        let bus = RecordingBus {
            fail_reads: true,
            ..RecordingBus::default()
        };
        let mut lcd = test_lcd(bus);
        let mut delay = RecordingDelay::default();

        assert!(lcd.wait_ready(&mut delay).is_err());
        assert_eq!(
            lcd.bus.events,
            [
                Event::Direction(Direction::Read),
                Event::Register(Register::Instruction),
                Event::Enable(true),
                Event::Read,
                Event::Enable(false),
                Event::Direction(Direction::Write),
            ]
        );
    }

    #[test]
    fn test_operations_end_in_write_direction() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.bus.busy_polls = 2;

        lcd.write("hi", &mut delay).unwrap();
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
        lcd.write_byte(b'@', &mut delay).unwrap();
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
        lcd.write_number(-42, &mut delay).unwrap();
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
        lcd.clear(&mut delay).unwrap();
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
        lcd.set_cursor(4, 1, &mut delay).unwrap();
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
        lcd.toggle_display(false, &mut delay).unwrap();
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
    }

    #[test]
    fn test_set_cursor_encoding() {
        for row in 0..2u8 {
            for col in 0..16u8 {
                let (mut lcd, mut delay) = ready_lcd();
                lcd.set_cursor(col, row, &mut delay).unwrap();
                assert_eq!(
                    lcd.bus.bytes(Register::Instruction),
                    [0x80 | (row << 6) | col]
                );
            }
        }
    }

    #[test]
    fn test_return_home_uses_set_cursor() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.return_home(&mut delay).unwrap();
        assert_eq!(lcd.bus.bytes(Register::Instruction), [0x80]);
        assert_eq!(lcd.bus.reads(), 1);
    }

    #[test]
    fn test_clear_and_toggle() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.clear(&mut delay).unwrap();
        lcd.toggle_display(false, &mut delay).unwrap();
        lcd.toggle_display(true, &mut delay).unwrap();
        assert_eq!(lcd.bus.bytes(Register::Instruction), [0x01, 0x08, 0x0F]);
        assert_eq!(lcd.bus.reads(), 3);
    }

    #[test]
    fn test_toggle_on_respects_cursor_config() {
        let config = Builder::new().cursor(false).blink(false).build().unwrap();
        let mut lcd = Lcd::new(RecordingBus::default(), config);
        let mut delay = RecordingDelay::default();
        lcd.toggle_display(true, &mut delay).unwrap();
        assert_eq!(lcd.bus.bytes(Register::Instruction), [0x0C]);
    }

    #[test]
    fn test_shift_cursor() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.shift_cursor(ShiftDirection::Right, &mut delay).unwrap();
        lcd.shift_cursor(ShiftDirection::Left, &mut delay).unwrap();
        assert_eq!(lcd.bus.bytes(Register::Instruction), [0x14, 0x10]);
    }

    #[test]
    fn test_init_sequence_nibbles() {
        let mut lcd = test_lcd(RecordingBus::default());
        let mut delay = RecordingDelay::default();
        lcd.init(&mut delay).unwrap();

        assert_eq!(
            lcd.bus.nibbles(),
            [
                0x3, 0x3, 0x3, 0x2, // cold start
                0x2, 0x8, // function set 0x28
                0x8, 0x0, // set cursor (0, 0)
                0x0, 0x1, // clear
                0x0, 0xF, // display on, cursor, blink
            ]
        );
        assert_eq!(lcd.bus.last_direction(), Some(Direction::Write));
    }

    #[test]
    fn test_init_busy_reads_only_after_mode_switch() {
        let mut lcd = test_lcd(RecordingBus::default());
        let mut delay = RecordingDelay::default();
        lcd.init(&mut delay).unwrap();

        let events = &lcd.bus.events;
        let nibble_positions: Vec<usize> = events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| matches!(e, Event::Nibble(_)).then_some(i))
            .collect();
        let first_read = events.iter().position(|e| *e == Event::Read).unwrap();

        // No status read before the function set's second nibble
        assert!(first_read > nibble_positions[5]);
        // One read after each of the four busy-flag steps
        assert_eq!(lcd.bus.reads(), 4);
        // Each full byte is followed by a read before the next byte starts
        let pairs: Vec<&[usize]> = nibble_positions[4..].chunks(2).collect();
        for (i, pair) in pairs.iter().enumerate() {
            let window_end = pairs.get(i + 1).map_or(events.len(), |next| next[0]);
            assert!(
                events[pair[1]..window_end].contains(&Event::Read),
                "no status read between byte {i} and the next byte"
            );
        }
    }

    #[test]
    fn test_init_fixed_delays() {
        let mut lcd = test_lcd(RecordingBus::default());
        let mut delay = RecordingDelay::default();
        lcd.init(&mut delay).unwrap();
        assert_eq!(delay.us, [15_000, 4_100, 100, 100, 100]);
    }

    #[test]
    fn test_init_uses_configured_timing_and_mode() {
        let timing = Timing {
            power_on_us: 40_000,
            third_probe_us: 250,
            ..Timing::default()
        };
        let config = Builder::new()
            .lines(Lines::One)
            .font(Font::Dots5x10)
            .timing(timing)
            .build()
            .unwrap();
        let mut lcd = Lcd::new(RecordingBus::default(), config);
        let mut delay = RecordingDelay::default();
        lcd.init(&mut delay).unwrap();

        assert_eq!(delay.us, [40_000, 4_100, 100, 250, 100]);
        assert_eq!(&lcd.bus.nibbles()[4..6], [0x2, 0x4]);
    }

    #[test]
    fn test_init_configures_lines_first() {
        let mut lcd = test_lcd(RecordingBus::default());
        let mut delay = RecordingDelay::default();
        lcd.init(&mut delay).unwrap();
        assert_eq!(
            lcd.bus.events[..3],
            [
                Event::Enable(false),
                Event::Direction(Direction::Write),
                Event::Register(Register::Instruction),
            ]
        );
    }

    #[test]
    fn test_writer_formats_through_lcd() {
        use core::fmt::Write;

        let (mut lcd, mut delay) = ready_lcd();
        let mut writer = lcd.writer(&mut delay);
        write!(writer, "T={}C", 21).unwrap();
        assert!(writer.take_error().is_none());
        assert_eq!(written_text(&lcd), b"T=21C");
    }

    #[test]
    fn test_writer_keeps_bus_error() {
        use core::fmt::Write;

        let (mut lcd, mut delay) = ready_lcd();
        lcd.bus.fail_reads = true;
        let mut writer = lcd.writer(&mut delay);
        assert!(writer.write_str("x").is_err());
        assert!(matches!(writer.take_error(), Some(Error::Bus(MockBusError))));
    }

    #[test]
    fn test_release_returns_bus() {
        let (mut lcd, mut delay) = ready_lcd();
        lcd.write_byte(b'!', &mut delay).unwrap();
        let bus = lcd.release();
        assert_eq!(bus.bytes(Register::Data), b"!");
    }
}
