//! Display configuration types and builder

use crate::init::InitStep;

pub use crate::error::BuilderError;

/// Minimum wait after power-on before the first reset probe (15ms)
pub const MIN_POWER_ON_DELAY_US: u32 = 15_000;

/// Minimum wait after the first reset probe (4.1ms)
pub const MIN_FIRST_PROBE_DELAY_US: u32 = 4_100;

/// Minimum wait after the second reset probe (100us)
pub const MIN_SECOND_PROBE_DELAY_US: u32 = 100;

/// Number of display lines selected by the function set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lines {
    /// One line (also used by 16x1 modules with a single controller row)
    One,
    /// Two lines, the second starting at DDRAM address 0x40
    #[default]
    Two,
}

/// Character font selected by the function set
///
/// The 5x10 font is only available in one-line mode; [`Builder::build`]
/// rejects it with two lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Font {
    /// 5x8 dots
    #[default]
    Dots5x8,
    /// 5x10 dots
    Dots5x10,
}

/// Settle and hold times around an enable strobe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseTiming {
    /// Delay before raising E, lets RS/RW/data settle (address setup time)
    pub setup_ns: u32,
    /// Time E is held high (enable pulse width)
    pub hold_ns: u32,
}

impl Default for PulseTiming {
    fn default() -> Self {
        // HD44780U at 3V: tAS >= 60ns, PWEH >= 450ns
        Self {
            setup_ns: 60,
            hold_ns: 450,
        }
    }
}

/// Cold-start delays and enable timing
///
/// The cold-start probes can't use the busy flag, so every step up to the
/// 4-bit mode switch waits a fixed time instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Wait after configuring the lines, before the first probe
    pub power_on_us: u32,
    /// Wait after reset probe 1
    pub first_probe_us: u32,
    /// Wait after reset probe 2
    pub second_probe_us: u32,
    /// Wait after reset probe 3 (not in the datasheet, empirical margin)
    pub third_probe_us: u32,
    /// Wait after switching to 4-bit mode
    pub mode_switch_us: u32,
    /// Enable strobe timing
    pub pulse: PulseTiming,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            power_on_us: MIN_POWER_ON_DELAY_US,
            first_probe_us: MIN_FIRST_PROBE_DELAY_US,
            second_probe_us: MIN_SECOND_PROBE_DELAY_US,
            third_probe_us: 100,
            mode_switch_us: 100,
            pulse: PulseTiming::default(),
        }
    }
}

impl Timing {
    /// Fixed delay that follows a cold-start step, in microseconds
    ///
    /// Returns `None` for steps that wait on the busy flag instead, see
    /// [`InitStep::uses_busy_flag`].
    pub fn delay_after(&self, step: InitStep) -> Option<u32> {
        if step.uses_busy_flag() {
            return None;
        }
        let us = match step {
            InitStep::LinesConfigured => self.power_on_us,
            InitStep::ResetPulse1 => self.first_probe_us,
            InitStep::ResetPulse2 => self.second_probe_us,
            InitStep::ResetPulse3 => self.third_probe_us,
            // Only the mode switch is left before the busy flag takes over
            _ => self.mode_switch_us,
        };
        Some(us)
    }

    /// Check the delays against the datasheet minimums
    fn validate(&self) -> Result<(), BuilderError> {
        let minimums = [
            (InitStep::LinesConfigured, MIN_POWER_ON_DELAY_US),
            (InitStep::ResetPulse1, MIN_FIRST_PROBE_DELAY_US),
            (InitStep::ResetPulse2, MIN_SECOND_PROBE_DELAY_US),
        ];
        for (step, minimum_us) in minimums {
            let provided_us = self.delay_after(step).unwrap_or(0);
            if provided_us < minimum_us {
                return Err(BuilderError::DelayTooShort {
                    step,
                    minimum_us,
                    provided_us,
                });
            }
        }
        Ok(())
    }
}

/// Display configuration
///
/// Use `Builder` to create a Config. The defaults match a 16x2 module with a
/// visible, blinking cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Number of display lines
    pub lines: Lines,
    /// Character font
    pub font: Font,
    /// Show the cursor when the display is on
    pub cursor: bool,
    /// Blink the cursor position when the display is on
    pub blink: bool,
    /// Cold-start and strobe timing
    pub timing: Timing,
    /// Maximum number of busy-flag polls per wait, 0 waits forever
    pub busy_poll_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lines: Lines::Two,
            font: Font::Dots5x8,
            cursor: true,
            blink: true,
            timing: Timing::default(),
            busy_poll_limit: 0,
        }
    }
}

/// Builder for constructing display configuration
///
/// # Example
///
/// ```
/// use hd44780_nibble::{Builder, Lines};
///
/// let config = match Builder::new().lines(Lines::Two).cursor(false).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert!(!config.cursor);
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of display lines
    pub fn lines(mut self, lines: Lines) -> Self {
        self.config.lines = lines;
        self
    }

    /// Set the character font
    pub fn font(mut self, font: Font) -> Self {
        self.config.font = font;
        self
    }

    /// Show or hide the cursor
    pub fn cursor(mut self, visible: bool) -> Self {
        self.config.cursor = visible;
        self
    }

    /// Enable or disable cursor blinking
    pub fn blink(mut self, blink: bool) -> Self {
        self.config.blink = blink;
        self
    }

    /// Replace the cold-start and strobe timing
    pub fn timing(mut self, timing: Timing) -> Self {
        self.config.timing = timing;
        self
    }

    /// Set the enable strobe timing only
    pub fn pulse_timing(mut self, pulse: PulseTiming) -> Self {
        self.config.timing.pulse = pulse;
        self
    }

    /// Bound the busy-flag wait
    ///
    /// Default is 0, which polls until the controller reports ready, however
    /// long that takes. A non-zero limit turns a stuck controller into
    /// [`Error::BusyTimeout`](crate::Error::BusyTimeout).
    pub fn busy_poll_limit(mut self, polls: u32) -> Self {
        self.config.busy_poll_limit = polls;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::DelayTooShort` if a cold-start delay is below
    /// its datasheet minimum, or `BuilderError::UnsupportedFont` for the
    /// 5x10 font with two lines
    pub fn build(self) -> Result<Config, BuilderError> {
        self.config.timing.validate()?;
        let Config { lines, font, .. } = self.config;
        if lines == Lines::Two && font == Font::Dots5x10 {
            return Err(BuilderError::UnsupportedFont { lines, font });
        }
        Ok(self.config)
    }
}
