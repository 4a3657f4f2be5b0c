//! Port handle: the pin configuration engine and atomic pin I/O.
//!
//! # Interrupt safety
//!
//! Configuration registers (MODER, OTYPER, OSPEEDR, PUPDR, AFRL/AFRH) are
//! updated with read, clear, insert, write. An interrupt handler that writes
//! the same register between the read and the write loses its update.
//! Configure ports before enabling interrupts that touch them, or use
//! [`Gpio::configure_masked`].
//!
//! Output changes go through BSRR, a write-only register where each written 1
//! sets (bits 0-15) or resets (bits 16-31) one pin and each 0 is ignored. A
//! single store changes any subset of pins and leaves the others alone, so
//! [`Gpio::write`] is safe from any context. [`Gpio::toggle`] reads ODR first
//! and is only as atomic as that read.

use super::field::PinField;
use super::register::{GpioReg, GpioRegisters};
use crate::{Mode, PinConfig, PinSet, PinState};

/// Lock key bit of LCKR.
const LCKK: u32 = 1 << 16;

/// Failure of the configuration lock key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockError {
    /// LCKK did not read back as set; the sequence was interrupted.
    SequenceAborted,
    /// The port was already locked and some of the requested pins are not
    /// part of the frozen set.
    AlreadyLocked,
}

impl core::fmt::Display for LockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LockError::SequenceAborted => f.write_str("GPIO lock key sequence aborted"),
            LockError::AlreadyLocked => f.write_str("GPIO port already locked with other pins"),
        }
    }
}

impl core::error::Error for LockError {}

/// Handle to one GPIO port's register block.
///
/// Handles are cheap views; the block itself is a process-wide resource that
/// outlives them. Any number of handles to one port may exist, so every
/// method takes `&self`; exclusive access is not implied by the handle.
pub struct Gpio<'a, R: GpioRegisters> {
    registers: &'a R,
}

impl<'a, R> Gpio<'a, R>
where
    R: GpioRegisters,
{
    /// Wrap a register block.
    ///
    /// The block's bus clock must already be enabled (see
    /// [`crate::Rcc::enable`]).
    pub const fn new(registers: &'a R) -> Self {
        Self { registers }
    }

    /// Apply `config` to every pin of `pins`.
    ///
    /// For each pin the registers are written in the order speed, output
    /// type, pull, alternate function, mode. The mode goes last so the pin
    /// never enters an output or alternate state with stale attributes.
    /// Fields that do not apply to the mode keep their previous value, and no
    /// bit of a pin outside `pins` is modified.
    pub fn configure(&self, pins: PinSet, config: &PinConfig) {
        debug_assert!(!pins.is_empty(), "empty pin set");
        trace!("gpio: configure {} as {}", pins, config.mode);
        let mode = config.mode;
        for pin in pins.positions() {
            if mode.drives_output() {
                self.modify(&PinField::SPEED, pin, config.speed.bits());
                self.modify(&PinField::OUTPUT_TYPE, pin, mode.output_type_bit());
            }
            if !mode.is_analog() {
                self.modify(&PinField::PULL, pin, config.pull.bits());
            }
            if mode.is_alternate() {
                self.modify(&PinField::ALTERNATE, pin, config.alternate.bits());
            }
            self.modify(&PinField::MODE, pin, mode.bits());
        }
    }

    /// [`Gpio::configure`] with interrupts masked for its duration.
    pub fn configure_masked(&self, pins: PinSet, config: &PinConfig) {
        critical_section::with(|_| self.configure(pins, config));
    }

    /// Return every pin of `pins` to the reset configuration: floating input,
    /// push-pull, low speed, AF0.
    ///
    /// The mode is written first so the pin stops driving before its other
    /// attributes change.
    pub fn deinit(&self, pins: PinSet) {
        debug_assert!(!pins.is_empty(), "empty pin set");
        trace!("gpio: deinit {}", pins);
        for pin in pins.positions() {
            self.modify(&PinField::MODE, pin, Mode::Input.bits());
            self.modify(&PinField::ALTERNATE, pin, 0);
            self.modify(&PinField::SPEED, pin, 0);
            self.modify(&PinField::OUTPUT_TYPE, pin, 0);
            self.modify(&PinField::PULL, pin, 0);
        }
    }

    /// Freeze the configuration of `pins` until the next reset.
    ///
    /// Runs the LCKR key sequence (write `LCKK | pins`, `pins`,
    /// `LCKK | pins`, read), checks that LCKK reads back as set and that every
    /// pin of `pins` is in the frozen set. Once a port is locked, LCKR ignores
    /// further writes until reset, so locking other pins fails with
    /// [`LockError::AlreadyLocked`].
    pub fn lock(&self, pins: PinSet) -> Result<(), LockError> {
        debug_assert!(!pins.is_empty(), "empty pin set");
        let key = LCKK | u32::from(pins.bits());
        self.registers.write(GpioReg::Lckr, key);
        self.registers.write(GpioReg::Lckr, u32::from(pins.bits()));
        self.registers.write(GpioReg::Lckr, key);
        let _ = self.registers.read(GpioReg::Lckr);
        if self.registers.read(GpioReg::Lckr) & LCKK == 0 {
            debug!("gpio: lock of {} aborted", pins);
            return Err(LockError::SequenceAborted);
        }
        if !self.locked().contains(pins) {
            debug!("gpio: {} not lockable, port already locked", pins);
            return Err(LockError::AlreadyLocked);
        }
        debug!("gpio: locked {}", pins);
        Ok(())
    }

    /// Pins whose configuration is frozen.
    pub fn locked(&self) -> PinSet {
        let lckr = self.registers.read(GpioReg::Lckr);
        if lckr & LCKK == 0 {
            PinSet::empty()
        } else {
            PinSet::from_bits_truncate(lckr as u16)
        }
    }

    /// Current value of `pin`'s `field`.
    pub fn field(&self, field: &PinField, pin: u8) -> u32 {
        let (reg, shift) = field.locate(pin);
        field.extract(self.registers.read(reg), shift)
    }

    /// Level on the input of `pin`.
    #[inline]
    pub fn read_pin(&self, pin: u8) -> PinState {
        PinState::from(self.read().contains(PinSet::pin(pin)))
    }

    /// Levels on the inputs of the whole port.
    #[inline]
    pub fn read(&self) -> PinSet {
        PinSet::from_bits_truncate(self.registers.read(GpioReg::Idr) as u16)
    }

    /// Levels currently driven by the output data register.
    #[inline]
    pub fn output(&self) -> PinSet {
        PinSet::from_bits_truncate(self.registers.read(GpioReg::Odr) as u16)
    }

    /// Drive every pin of `pins` to `state` with one BSRR store.
    #[inline]
    pub fn write(&self, pins: PinSet, state: PinState) {
        debug_assert!(!pins.is_empty(), "empty pin set");
        let bits = u32::from(pins.bits());
        let word = match state {
            PinState::Set => bits,
            PinState::Reset => bits << 16,
        };
        self.registers.write(GpioReg::Bsrr, word);
    }

    /// Drive every pin of `pins` high.
    #[inline]
    pub fn set(&self, pins: PinSet) {
        self.write(pins, PinState::Set);
    }

    /// Drive every pin of `pins` low.
    #[inline]
    pub fn reset(&self, pins: PinSet) {
        self.write(pins, PinState::Reset);
    }

    /// Invert the output level of every pin of `pins`.
    ///
    /// One ODR read and one BSRR store. If another context changes one of
    /// these pins between the two, that pin's result is indeterminate; use
    /// [`Gpio::write`] where that matters.
    #[inline]
    pub fn toggle(&self, pins: PinSet) {
        debug_assert!(!pins.is_empty(), "empty pin set");
        let odr = self.registers.read(GpioReg::Odr);
        let pins = u32::from(pins.bits());
        let reset = (odr & pins) << 16;
        let set = !odr & pins;
        self.registers.write(GpioReg::Bsrr, reset | set);
    }

    fn modify(&self, field: &PinField, pin: u8, value: u32) {
        let (reg, shift) = field.locate(pin);
        let word = self.registers.read(reg);
        self.registers.write(reg, field.insert(word, shift, value));
    }
}
