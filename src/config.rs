//! Logical pin descriptors: which pins, and how they should be configured.
//!
//! Nothing in this module touches hardware. The values defined here are
//! translated into register fields by [`crate::Gpio::configure`].

use bitflags::bitflags;

bitflags! {
    /// A set of pins (0 to 15) of one port.
    ///
    /// Pins are independent, the order in which they were added is not
    /// recorded and any combination of bits is valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PinSet: u16 {
        const P0 = 1 << 0;
        const P1 = 1 << 1;
        const P2 = 1 << 2;
        const P3 = 1 << 3;
        const P4 = 1 << 4;
        const P5 = 1 << 5;
        const P6 = 1 << 6;
        const P7 = 1 << 7;
        const P8 = 1 << 8;
        const P9 = 1 << 9;
        const P10 = 1 << 10;
        const P11 = 1 << 11;
        const P12 = 1 << 12;
        const P13 = 1 << 13;
        const P14 = 1 << 14;
        const P15 = 1 << 15;
    }
}

impl PinSet {
    /// Number of pins in a port.
    pub const WIDTH: u8 = 16;

    /// Set containing the single pin `pin`.
    ///
    /// `pin` must be below 16; in release builds the index wraps.
    #[inline]
    pub const fn pin(pin: u8) -> Self {
        debug_assert!(pin < Self::WIDTH, "pin index out of range");
        Self::from_bits_retain(1 << (pin % Self::WIDTH))
    }

    /// Iterate over the pin indices contained in the set, lowest first.
    #[inline]
    pub fn positions(self) -> Positions {
        Positions(self.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PinSet {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PinSet({=u16:#06x})", self.bits());
    }
}

/// Iterator over the indices of a [`PinSet`].
#[derive(Debug, Clone)]
pub struct Positions(u16);

impl Iterator for Positions {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let pin = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(pin)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Positions {}

/// Electrical mode of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Floating or pulled input.
    Input,
    /// General purpose output, push-pull stage.
    OutputPushPull,
    /// General purpose output, open-drain stage.
    OutputOpenDrain,
    /// Routed to a peripheral, push-pull stage.
    AlternateFunctionPushPull,
    /// Routed to a peripheral, open-drain stage.
    AlternateFunctionOpenDrain,
    /// Analog; the digital input and pull resistors are disconnected.
    Analog,
}

impl Mode {
    /// Two-bit MODER encoding.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            Mode::Input => 0b00,
            Mode::OutputPushPull | Mode::OutputOpenDrain => 0b01,
            Mode::AlternateFunctionPushPull | Mode::AlternateFunctionOpenDrain => 0b10,
            Mode::Analog => 0b11,
        }
    }

    /// One-bit OTYPER encoding. Only meaningful when [`Mode::drives_output`].
    #[inline]
    pub const fn output_type_bit(self) -> u32 {
        match self {
            Mode::OutputOpenDrain | Mode::AlternateFunctionOpenDrain => 1,
            _ => 0,
        }
    }

    /// True for the output and alternate-function modes, the only ones for
    /// which speed and output type apply.
    #[inline]
    pub const fn drives_output(self) -> bool {
        matches!(
            self,
            Mode::OutputPushPull
                | Mode::OutputOpenDrain
                | Mode::AlternateFunctionPushPull
                | Mode::AlternateFunctionOpenDrain
        )
    }

    /// True for the two alternate-function modes.
    #[inline]
    pub const fn is_alternate(self) -> bool {
        matches!(
            self,
            Mode::AlternateFunctionPushPull | Mode::AlternateFunctionOpenDrain
        )
    }

    /// True for analog mode, where pull resistors do not apply.
    #[inline]
    pub const fn is_analog(self) -> bool {
        matches!(self, Mode::Analog)
    }
}

/// Pull resistor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    #[default]
    None,
    PullUp,
    PullDown,
}

impl Pull {
    /// Two-bit PUPDR encoding.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            Pull::None => 0b00,
            Pull::PullUp => 0b01,
            Pull::PullDown => 0b10,
        }
    }
}

/// Output slew rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Speed {
    /// Two-bit OSPEEDR encoding.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            Speed::Low => 0b00,
            Speed::Medium => 0b01,
            Speed::High => 0b10,
            Speed::VeryHigh => 0b11,
        }
    }
}

/// Alternate function selector, AF0 to AF15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlternateFunction(u8);

impl AlternateFunction {
    /// Build a selector. `af` must be below 16; in release builds it is
    /// truncated to its low four bits.
    #[inline]
    pub const fn new(af: u8) -> Self {
        debug_assert!(af < 16, "alternate function out of range");
        Self(af & 0xF)
    }

    /// Four-bit AFRL/AFRH encoding.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0 as u32
    }
}

/// Complete configuration applied to every pin of a [`PinSet`].
///
/// `speed` and the output type carried by `mode` only reach the hardware for
/// output and alternate-function modes, `pull` for every mode but analog, and
/// `alternate` only for alternate-function modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub mode: Mode,
    pub pull: Pull,
    pub speed: Speed,
    pub alternate: AlternateFunction,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self::new(Mode::Input)
    }
}

impl PinConfig {
    /// Configuration in `mode`, no pull, low speed, AF0.
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            pull: Pull::None,
            speed: Speed::Low,
            alternate: AlternateFunction(0),
        }
    }

    /// Same configuration with pull resistor `pull`.
    pub const fn with_pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    /// Same configuration with slew rate `speed`.
    pub const fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Same configuration with alternate function `alternate`.
    pub const fn with_alternate(mut self, alternate: AlternateFunction) -> Self {
        self.alternate = alternate;
        self
    }
}

/// Logical level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// Logical low / 0.
    Reset,
    /// Logical high / 1.
    Set,
}

impl From<bool> for PinState {
    fn from(high: bool) -> Self {
        if high { PinState::Set } else { PinState::Reset }
    }
}

impl core::ops::Not for PinState {
    type Output = PinState;

    fn not(self) -> PinState {
        match self {
            PinState::Reset => PinState::Set,
            PinState::Set => PinState::Reset,
        }
    }
}
