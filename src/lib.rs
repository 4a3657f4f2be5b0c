//! Mayo F4: GPIO register engine and clock gate for STM32F407 devices.
//!
//! This crate provides a small, type-safe API over the GPIO ports (A..I) and
//! the RCC clock gates in front of them:
//!
//! - [`Rcc`] enables a port's bus clock with the mandatory read-back.
//! - [`Gpio`] applies a [`PinConfig`] to any [`PinSet`] of a port, and reads,
//!   sets, resets and toggles pins through the atomic BSRR register.
//! - [`Io`] is a typed single-pin handle with compile-time direction markers
//!   (`Input`/`Output`), built on the two above.
//!
//! Detailed example (mocked)
//! The example below is included from an external markdown file and shows a
//! mocked register block, `GpioRegisters` implementation and `Bank` type.
#![doc = include_str!("../doc/mock_example.md")]
#![no_std]

#[cfg(test)]
extern crate std;

mod fmt;

mod config;
mod low;
mod rcc;
#[cfg(test)]
mod sim;

use core::marker::PhantomData;

pub use config::{AlternateFunction, Mode, PinConfig, PinSet, PinState, Positions, Pull, Speed};
pub use low::{
    Bank, GpioA, GpioB, GpioC, GpioD, GpioE, GpioF, GpioG, GpioH, GpioI, Port,
    field::PinField,
    gpio,
    io::{Gpio, LockError},
    register::{Access, GpioReg, GpioRegisterBlock, GpioRegisters, RO, RW, Readable, Reg, WO, Writable},
};
pub use rcc::{Bus, ClockGate, ClockRegisters, Rcc, RccReg, RccRegisterBlock, rcc};

mod private {
    // Sealed trait to prevent external implementations of `Direction`.
    pub trait Sealed {}
    impl Sealed for super::Input {}
    impl Sealed for super::Output {}
}

use self::private::Sealed;

/// Trait implemented by direction marker types (`Input`, `Output`).
///
/// This trait is sealed to keep direction implementations local to the
/// crate and to allow the API to rely on the two known directions.
pub trait Direction: Sealed {
    /// Configuration applied when a pin enters this direction.
    fn config() -> PinConfig;
}

/// Marker type for an input pin.
pub struct Input;
/// Marker type for an output pin.
pub struct Output;

impl Direction for Input {
    fn config() -> PinConfig {
        PinConfig::new(Mode::Input)
    }
}
impl Direction for Output {
    fn config() -> PinConfig {
        PinConfig::new(Mode::OutputPushPull)
    }
}

/// Typed GPIO pin handle.
///
/// Generic parameters:
/// - `N`: constant pin index within the bank (0 to 15).
/// - `B`: bank type which implements `Bank<R>`.
/// - `R`: register block implementing `GpioRegisters`.
/// - `D`: direction marker type (`Input` or `Output`).
pub struct Io<const N: u8, B, R, D>
where
    B: Bank<R>,
    R: GpioRegisters + 'static,
{
    dir: PhantomData<fn() -> D>,
    bank: PhantomData<fn() -> B>,
    register: PhantomData<fn() -> R>,
}

impl<B, R, const N: u8, D> Io<N, B, R, D>
where
    B: Bank<R>,
    R: GpioRegisters + 'static,
    D: Direction,
{
    /// Enable the bank's clock, then configure pin `N` for direction `D`.
    pub fn init<C: ClockRegisters>(rcc: &Rcc<'_, C>) -> Self {
        const { assert!(N < PinSet::WIDTH, "pin index out of range") };
        rcc.enable(B::GATE);
        Self::configured(&D::config())
    }

    fn configured(config: &PinConfig) -> Self {
        let bank = B::get_handle();
        bank.configure(Self::pins(), config);
        Self {
            dir: PhantomData,
            bank: PhantomData,
            register: PhantomData,
        }
    }

    #[inline]
    fn pins() -> PinSet {
        PinSet::pin(N)
    }

    /// Reconfigure the pin as a floating input.
    pub fn into_input(self) -> Io<N, B, R, Input> {
        Io::configured(&Input::config())
    }

    /// Reconfigure the pin as a push-pull output.
    pub fn into_output(self) -> Io<N, B, R, Output> {
        Io::configured(&Output::config())
    }
}

impl<B, R, const N: u8> Io<N, B, R, Input>
where
    B: Bank<R>,
    R: GpioRegisters + 'static,
{
    /// Select the pull resistor of this input pin.
    pub fn set_pull(&mut self, pull: Pull) {
        let bank = B::get_handle();
        bank.configure(Self::pins(), &Input::config().with_pull(pull));
    }

    /// Read the current logical level of the pin.
    pub fn read(&self) -> PinState {
        B::get_handle().read_pin(N)
    }
}

impl<B, R, const N: u8> Io<N, B, R, Output>
where
    B: Bank<R>,
    R: GpioRegisters + 'static,
{
    /// Write a logical level to the pin.
    #[inline]
    pub fn write(&mut self, state: PinState) {
        B::get_handle().write(Self::pins(), state);
    }

    /// Drive the pin low.
    #[inline]
    pub fn set_low(&mut self) {
        self.write(PinState::Reset);
    }

    /// Drive the pin high.
    #[inline]
    pub fn set_high(&mut self) {
        self.write(PinState::Set);
    }

    /// Invert the driven level.
    #[inline]
    pub fn toggle(&mut self) {
        B::get_handle().toggle(Self::pins());
    }

    /// Level currently driven by the output register.
    pub fn is_set_high(&self) -> bool {
        B::get_handle().output().contains(Self::pins())
    }

    /// Change the output slew rate.
    pub fn set_speed(&mut self, speed: Speed) {
        let bank = B::get_handle();
        bank.configure(Self::pins(), &Output::config().with_speed(speed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Kind, SimPort, SimRcc};

    macro_rules! sim_bank {
        ($name:ident, $storage:ident, $port:ident) => {
            static $storage: SimPort = SimPort::new();
            struct $name;
            impl Bank<SimPort> for $name {
                const GATE: ClockGate = Port::$port.clock_gate();
                fn registers() -> &'static SimPort {
                    &$storage
                }
            }
        };
    }

    #[test]
    fn output_pin_blinks() {
        sim_bank!(Leds, LEDS, D);
        let rcc_sim = SimRcc::new();
        let rcc = Rcc::new(&rcc_sim);
        let mut led: Io<12, Leds, SimPort, Output> = Io::init(&rcc);

        assert!(rcc.is_enabled(ClockGate::GPIOD));
        assert_eq!(LEDS.peek(GpioReg::Moder), 0b01 << 24);
        led.set_high();
        assert!(led.is_set_high());
        led.toggle();
        assert!(!led.is_set_high());
        led.toggle();
        assert!(led.is_set_high());
        led.set_low();
        assert_eq!(LEDS.peek(GpioReg::Odr), 0);
    }

    #[test]
    fn init_enables_clock_before_touching_port() {
        sim_bank!(Buttons, BUTTONS, A);
        let rcc_sim = SimRcc::new();
        let _button: Io<0, Buttons, SimPort, Input> = Io::init(&Rcc::new(&rcc_sim));

        let sync = rcc_sim
            .accesses()
            .into_iter()
            .filter(|a| a.kind == Kind::Read)
            .last()
            .expect("no sync read");
        assert!(BUTTONS.accesses().iter().all(|a| a.seq > sync.seq));
        assert_eq!(rcc_sim.peek(RccReg::Ahb1enr), 1);
    }

    #[test]
    fn input_pin_reads_and_pulls() {
        sim_bank!(Keys, KEYS, C);
        let rcc_sim = SimRcc::new();
        let mut key: Io<13, Keys, SimPort, Input> = Io::init(&Rcc::new(&rcc_sim));

        KEYS.drive_input(1 << 13);
        assert_eq!(key.read(), PinState::Set);
        KEYS.drive_input(0);
        assert_eq!(key.read(), PinState::Reset);

        key.set_pull(Pull::PullUp);
        assert_eq!(KEYS.peek(GpioReg::Pupdr), 0b01 << 26);
        assert_eq!(KEYS.peek(GpioReg::Moder), 0);
    }

    #[test]
    fn direction_changes_reconfigure_mode() {
        sim_bank!(Bus0, BUS0, E);
        let rcc_sim = SimRcc::new();
        let pin: Io<9, Bus0, SimPort, Input> = Io::init(&Rcc::new(&rcc_sim));
        let mut pin = pin.into_output();
        pin.set_speed(Speed::VeryHigh);
        assert_eq!(BUS0.peek(GpioReg::Moder), 0b01 << 18);
        assert_eq!(BUS0.peek(GpioReg::Ospeedr), 0b11 << 18);

        let _pin = pin.into_input();
        assert_eq!(BUS0.peek(GpioReg::Moder), 0);
    }
}
