//! Cold-start sequence
//!
//! After power-on the controller may be in 8-bit mode, in 4-bit mode halfway
//! through a byte, or not responding to the busy flag yet. The sequence below
//! forces it into a known state: three 8-bit function set probes with fixed
//! delays, a single-nibble switch to 4-bit mode, and then regular instructions
//! synchronized on the busy flag.
//!
//! ```text
//! LinesConfigured -> ResetPulse1 -> ResetPulse2 -> ResetPulse3 -> ModeSwitch
//!   -> FunctionSet -> CursorHomed -> Cleared -> DisplayOn (ready)
//! ```

/// One step of the cold-start sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum InitStep {
    /// Lines driven to write/instruction with E low, waiting out power-on
    LinesConfigured,
    /// First reset probe (0x3 nibble), followed by at least 4.1ms
    ResetPulse1,
    /// Second reset probe, followed by at least 100us
    ResetPulse2,
    /// Third reset probe, followed by an empirical margin
    ResetPulse3,
    /// 0x2 nibble, the controller is now in 4-bit mode
    ModeSwitch,
    /// Full function set (lines and font) committed
    FunctionSet,
    /// Cursor moved to (0, 0)
    CursorHomed,
    /// Display memory cleared
    Cleared,
    /// Display switched on, the controller is ready
    DisplayOn,
}

impl InitStep {
    /// All steps in execution order
    pub const SEQUENCE: [InitStep; 9] = [
        InitStep::LinesConfigured,
        InitStep::ResetPulse1,
        InitStep::ResetPulse2,
        InitStep::ResetPulse3,
        InitStep::ModeSwitch,
        InitStep::FunctionSet,
        InitStep::CursorHomed,
        InitStep::Cleared,
        InitStep::DisplayOn,
    ];

    /// The step that follows this one, `None` once the display is on
    pub fn next(self) -> Option<InitStep> {
        match self {
            InitStep::LinesConfigured => Some(InitStep::ResetPulse1),
            InitStep::ResetPulse1 => Some(InitStep::ResetPulse2),
            InitStep::ResetPulse2 => Some(InitStep::ResetPulse3),
            InitStep::ResetPulse3 => Some(InitStep::ModeSwitch),
            InitStep::ModeSwitch => Some(InitStep::FunctionSet),
            InitStep::FunctionSet => Some(InitStep::CursorHomed),
            InitStep::CursorHomed => Some(InitStep::Cleared),
            InitStep::Cleared => Some(InitStep::DisplayOn),
            InitStep::DisplayOn => None,
        }
    }

    /// Whether this step completes by polling the busy flag
    ///
    /// The busy flag is not reliable until the controller has been switched
    /// to 4-bit mode, so everything before [`InitStep::FunctionSet`] uses a
    /// fixed delay.
    pub fn uses_busy_flag(self) -> bool {
        self >= InitStep::FunctionSet
    }
}

impl core::fmt::Display for InitStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            InitStep::LinesConfigured => "lines-configured",
            InitStep::ResetPulse1 => "reset-pulse-1",
            InitStep::ResetPulse2 => "reset-pulse-2",
            InitStep::ResetPulse3 => "reset-pulse-3",
            InitStep::ModeSwitch => "mode-switch-to-4-bit",
            InitStep::FunctionSet => "function-set-committed",
            InitStep::CursorHomed => "cursor-homed",
            InitStep::Cleared => "cleared",
            InitStep::DisplayOn => "display-on",
        };
        f.write_str(name)
    }
}
