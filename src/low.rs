//! Low-level GPIO building blocks: register model, port registry and the
//! port handle.
//!
//! The register blocks are process-wide resources living at fixed addresses.
//! They are reached in two ways, both returning `&'static` views and never
//! exposing the address itself:
//!
//! - the [`gpio`] registry, indexed at run time by [`Port`];
//! - [`Bank`] marker types ([`GpioA`] .. [`GpioI`]), resolved at compile time
//!   and used by the typed [`crate::Io`] pins.
//!
//! Tests and host tools implement `Bank` for their own marker types over a
//! simulated [`register::GpioRegisters`] block.
//!
//! Safety notes:
//! - A port's bus clock must be enabled ([`crate::Rcc::enable`]) before any
//!   of its registers is accessed.
//! - Configuration updates are not interrupt-safe; see [`io`].

pub mod field;
pub mod io;
pub mod register;

use crate::rcc::ClockGate;
use register::{GpioRegisterBlock, GpioRegisters};

/// Base address of GPIOA; each following port is 0x400 further.
const GPIO_BASE: usize = 0x4002_0000;
const GPIO_STRIDE: usize = 0x400;

/// Physical GPIO ports of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
}

impl Port {
    /// Every port of the device, in address order.
    pub const ALL: [Port; 9] = [
        Port::A,
        Port::B,
        Port::C,
        Port::D,
        Port::E,
        Port::F,
        Port::G,
        Port::H,
        Port::I,
    ];

    /// Zero-based index, A = 0.
    pub const fn index(self) -> u8 {
        self as u8
    }

    const fn base(self) -> usize {
        GPIO_BASE + self.index() as usize * GPIO_STRIDE
    }

    /// Clock gate that must be enabled before the port is used.
    pub const fn clock_gate(self) -> ClockGate {
        match self {
            Port::A => ClockGate::GPIOA,
            Port::B => ClockGate::GPIOB,
            Port::C => ClockGate::GPIOC,
            Port::D => ClockGate::GPIOD,
            Port::E => ClockGate::GPIOE,
            Port::F => ClockGate::GPIOF,
            Port::G => ClockGate::GPIOG,
            Port::H => ClockGate::GPIOH,
            Port::I => ClockGate::GPIOI,
        }
    }

    /// The port's register block.
    pub fn registers(self) -> &'static GpioRegisterBlock {
        // SAFETY: every port block sits at a fixed address on the target and
        // exists for the whole program; its fields are interior-mutable cells.
        unsafe { &*(self.base() as *const GpioRegisterBlock) }
    }
}

/// Handle to the register block of `port`.
///
/// Ports are only reachable through this registry or a [`Bank`]:
///
/// ```compile_fail
/// let _ = mayo_f4::GPIO_BASE;
/// ```
pub fn gpio(port: Port) -> io::Gpio<'static, GpioRegisterBlock> {
    io::Gpio::new(port.registers())
}

/// Compile-time identity of a GPIO port.
///
/// A bank names the register block `R` of one port and the clock gate in
/// front of it.
pub trait Bank<R: GpioRegisters + 'static> {
    /// Clock gate of the port.
    const GATE: ClockGate;

    /// Return a new `Gpio` handle over the bank's register block.
    fn get_handle() -> io::Gpio<'static, R> {
        io::Gpio::new(Self::registers())
    }

    /// The bank's register block.
    fn registers() -> &'static R;
}

macro_rules! banks {
    ($($(#[$doc:meta])* $name:ident => $port:ident,)*) => {
        $(
            $(#[$doc])*
            pub struct $name;

            impl Bank<GpioRegisterBlock> for $name {
                const GATE: ClockGate = Port::$port.clock_gate();

                #[inline]
                fn registers() -> &'static GpioRegisterBlock {
                    Port::$port.registers()
                }
            }
        )*
    };
}

banks! {
    /// Port A.
    GpioA => A,
    /// Port B.
    GpioB => B,
    /// Port C.
    GpioC => C,
    /// Port D.
    GpioD => D,
    /// Port E.
    GpioE => E,
    /// Port F.
    GpioF => F,
    /// Port G.
    GpioG => G,
    /// Port H.
    GpioH => H,
    /// Port I.
    GpioI => I,
}
