//! Reset and clock control: the bus clock gate in front of every peripheral.
//!
//! A peripheral's registers do not respond until its enable bit is set in
//! one of the RCC bus enable registers, and the enable only takes effect a
//! few bus cycles later. [`Rcc::enable`] therefore always follows the write
//! with a read of the same register. Touching a peripheral before that read
//! completes is undefined on the device (bus fault or silently dropped
//! writes).
//!
//! The enable registers are shared by every peripheral on the bus and the
//! updates here are read-modify-write; callers that also gate clocks from
//! interrupt handlers must serialize around them.

use crate::low::register::{RW, Reg, assert_offset};

/// Base address of the RCC block.
const RCC_BASE: usize = 0x4002_3800;

/// Peripheral buses with their own enable and reset registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bus {
    Ahb1,
    Ahb2,
    Ahb3,
    Apb1,
    Apb2,
}

impl Bus {
    /// `*ENR` register of the bus.
    pub const fn enable_register(self) -> RccReg {
        match self {
            Bus::Ahb1 => RccReg::Ahb1enr,
            Bus::Ahb2 => RccReg::Ahb2enr,
            Bus::Ahb3 => RccReg::Ahb3enr,
            Bus::Apb1 => RccReg::Apb1enr,
            Bus::Apb2 => RccReg::Apb2enr,
        }
    }

    /// `*RSTR` register of the bus.
    pub const fn reset_register(self) -> RccReg {
        match self {
            Bus::Ahb1 => RccReg::Ahb1rstr,
            Bus::Ahb2 => RccReg::Ahb2rstr,
            Bus::Ahb3 => RccReg::Ahb3rstr,
            Bus::Apb1 => RccReg::Apb1rstr,
            Bus::Apb2 => RccReg::Apb2rstr,
        }
    }
}

/// One peripheral's clock enable bit.
///
/// The same bit position selects the peripheral in the bus reset register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockGate {
    bus: Bus,
    bit: u8,
}

impl ClockGate {
    pub const GPIOA: ClockGate = ClockGate::new(Bus::Ahb1, 0);
    pub const GPIOB: ClockGate = ClockGate::new(Bus::Ahb1, 1);
    pub const GPIOC: ClockGate = ClockGate::new(Bus::Ahb1, 2);
    pub const GPIOD: ClockGate = ClockGate::new(Bus::Ahb1, 3);
    pub const GPIOE: ClockGate = ClockGate::new(Bus::Ahb1, 4);
    pub const GPIOF: ClockGate = ClockGate::new(Bus::Ahb1, 5);
    pub const GPIOG: ClockGate = ClockGate::new(Bus::Ahb1, 6);
    pub const GPIOH: ClockGate = ClockGate::new(Bus::Ahb1, 7);
    pub const GPIOI: ClockGate = ClockGate::new(Bus::Ahb1, 8);

    /// Gate for bit `bit` of `bus`'s enable register.
    pub const fn new(bus: Bus, bit: u8) -> Self {
        assert!(bit < 32);
        Self { bus, bit }
    }

    /// Bus whose enable and reset registers hold the gate.
    pub const fn bus(self) -> Bus {
        self.bus
    }

    /// Single-bit mask of the gate inside its register.
    pub const fn mask(self) -> u32 {
        1 << self.bit
    }
}

/// Registers of the RCC block used for clock gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RccReg {
    Cr,
    Pllcfgr,
    Cfgr,
    Cir,
    Ahb1rstr,
    Ahb2rstr,
    Ahb3rstr,
    Apb1rstr,
    Apb2rstr,
    Ahb1enr,
    Ahb2enr,
    Ahb3enr,
    Apb1enr,
    Apb2enr,
    Ahb1lpenr,
    Ahb2lpenr,
    Ahb3lpenr,
    Apb1lpenr,
    Apb2lpenr,
    Bdcr,
    Csr,
    Sscgr,
    Plli2scfgr,
}

impl RccReg {
    /// Byte offset of the register inside the RCC block.
    pub const fn offset(self) -> usize {
        match self {
            RccReg::Cr => 0x00,
            RccReg::Pllcfgr => 0x04,
            RccReg::Cfgr => 0x08,
            RccReg::Cir => 0x0C,
            RccReg::Ahb1rstr => 0x10,
            RccReg::Ahb2rstr => 0x14,
            RccReg::Ahb3rstr => 0x18,
            RccReg::Apb1rstr => 0x20,
            RccReg::Apb2rstr => 0x24,
            RccReg::Ahb1enr => 0x30,
            RccReg::Ahb2enr => 0x34,
            RccReg::Ahb3enr => 0x38,
            RccReg::Apb1enr => 0x40,
            RccReg::Apb2enr => 0x44,
            RccReg::Ahb1lpenr => 0x50,
            RccReg::Ahb2lpenr => 0x54,
            RccReg::Ahb3lpenr => 0x58,
            RccReg::Apb1lpenr => 0x60,
            RccReg::Apb2lpenr => 0x64,
            RccReg::Bdcr => 0x70,
            RccReg::Csr => 0x74,
            RccReg::Sscgr => 0x80,
            RccReg::Plli2scfgr => 0x84,
        }
    }
}

/// Register-level trait the clock gate is generic over.
///
/// # Safety
///
/// Implementers must perform exactly one access to the named register per
/// call, in program order, with no caching.
pub unsafe trait ClockRegisters {
    /// Load the current value of `reg`.
    fn read(&self, reg: RccReg) -> u32;

    /// Store `value` into `reg`.
    fn write(&self, reg: RccReg, value: u32);
}

/// Memory layout of the RCC block.
#[repr(C)]
pub struct RccRegisterBlock {
    cr: Reg<RW>,
    pllcfgr: Reg<RW>,
    cfgr: Reg<RW>,
    cir: Reg<RW>,
    ahb1rstr: Reg<RW>,
    ahb2rstr: Reg<RW>,
    ahb3rstr: Reg<RW>,
    _reserved0: u32,
    apb1rstr: Reg<RW>,
    apb2rstr: Reg<RW>,
    _reserved1: [u32; 2],
    ahb1enr: Reg<RW>,
    ahb2enr: Reg<RW>,
    ahb3enr: Reg<RW>,
    _reserved2: u32,
    apb1enr: Reg<RW>,
    apb2enr: Reg<RW>,
    _reserved3: [u32; 2],
    ahb1lpenr: Reg<RW>,
    ahb2lpenr: Reg<RW>,
    ahb3lpenr: Reg<RW>,
    _reserved4: u32,
    apb1lpenr: Reg<RW>,
    apb2lpenr: Reg<RW>,
    _reserved5: [u32; 2],
    bdcr: Reg<RW>,
    csr: Reg<RW>,
    _reserved6: [u32; 2],
    sscgr: Reg<RW>,
    plli2scfgr: Reg<RW>,
}

impl RccRegisterBlock {
    fn reg(&self, reg: RccReg) -> &Reg<RW> {
        match reg {
            RccReg::Cr => &self.cr,
            RccReg::Pllcfgr => &self.pllcfgr,
            RccReg::Cfgr => &self.cfgr,
            RccReg::Cir => &self.cir,
            RccReg::Ahb1rstr => &self.ahb1rstr,
            RccReg::Ahb2rstr => &self.ahb2rstr,
            RccReg::Ahb3rstr => &self.ahb3rstr,
            RccReg::Apb1rstr => &self.apb1rstr,
            RccReg::Apb2rstr => &self.apb2rstr,
            RccReg::Ahb1enr => &self.ahb1enr,
            RccReg::Ahb2enr => &self.ahb2enr,
            RccReg::Ahb3enr => &self.ahb3enr,
            RccReg::Apb1enr => &self.apb1enr,
            RccReg::Apb2enr => &self.apb2enr,
            RccReg::Ahb1lpenr => &self.ahb1lpenr,
            RccReg::Ahb2lpenr => &self.ahb2lpenr,
            RccReg::Ahb3lpenr => &self.ahb3lpenr,
            RccReg::Apb1lpenr => &self.apb1lpenr,
            RccReg::Apb2lpenr => &self.apb2lpenr,
            RccReg::Bdcr => &self.bdcr,
            RccReg::Csr => &self.csr,
            RccReg::Sscgr => &self.sscgr,
            RccReg::Plli2scfgr => &self.plli2scfgr,
        }
    }
}

unsafe impl ClockRegisters for RccRegisterBlock {
    #[inline]
    fn read(&self, reg: RccReg) -> u32 {
        self.reg(reg).read()
    }

    #[inline]
    fn write(&self, reg: RccReg, value: u32) {
        self.reg(reg).write(value)
    }
}

assert_offset!(RccRegisterBlock, cr, RccReg::Cr);
assert_offset!(RccRegisterBlock, cir, RccReg::Cir);
assert_offset!(RccRegisterBlock, ahb1rstr, RccReg::Ahb1rstr);
assert_offset!(RccRegisterBlock, apb1rstr, RccReg::Apb1rstr);
assert_offset!(RccRegisterBlock, apb2rstr, RccReg::Apb2rstr);
assert_offset!(RccRegisterBlock, ahb1enr, RccReg::Ahb1enr);
assert_offset!(RccRegisterBlock, ahb3enr, RccReg::Ahb3enr);
assert_offset!(RccRegisterBlock, apb1enr, RccReg::Apb1enr);
assert_offset!(RccRegisterBlock, apb2enr, RccReg::Apb2enr);
assert_offset!(RccRegisterBlock, ahb1lpenr, RccReg::Ahb1lpenr);
assert_offset!(RccRegisterBlock, apb1lpenr, RccReg::Apb1lpenr);
assert_offset!(RccRegisterBlock, bdcr, RccReg::Bdcr);
assert_offset!(RccRegisterBlock, sscgr, RccReg::Sscgr);
assert_offset!(RccRegisterBlock, plli2scfgr, RccReg::Plli2scfgr);

/// Handle over an RCC register block.
pub struct Rcc<'a, C: ClockRegisters> {
    registers: &'a C,
}

impl<'a, C: ClockRegisters> Rcc<'a, C> {
    /// Wrap a register block. Use [`rcc`] for the device's own block.
    pub const fn new(registers: &'a C) -> Self {
        Self { registers }
    }

    /// Supply the bus clock to the peripheral behind `gate`.
    ///
    /// Returns once the synchronization read has completed; the peripheral
    /// may be accessed from then on.
    pub fn enable(&self, gate: ClockGate) {
        let reg = gate.bus().enable_register();
        let value = self.registers.read(reg);
        self.registers.write(reg, value | gate.mask());
        // Clock propagation delay: the read-back must not be skipped.
        let _ = self.registers.read(reg);
        debug!("rcc: enabled {}", gate);
    }

    /// Stop the bus clock of the peripheral behind `gate`.
    pub fn disable(&self, gate: ClockGate) {
        let reg = gate.bus().enable_register();
        let value = self.registers.read(reg);
        self.registers.write(reg, value & !gate.mask());
        debug!("rcc: disabled {}", gate);
    }

    /// True if the bus clock of the peripheral behind `gate` is enabled.
    pub fn is_enabled(&self, gate: ClockGate) -> bool {
        self.registers.read(gate.bus().enable_register()) & gate.mask() != 0
    }

    /// Pulse the peripheral's reset line, returning all of its registers to
    /// their reset values. The clock gate is left as it was.
    pub fn reset(&self, gate: ClockGate) {
        let reg = gate.bus().reset_register();
        let value = self.registers.read(reg);
        self.registers.write(reg, value | gate.mask());
        self.registers.write(reg, value & !gate.mask());
        debug!("rcc: reset {}", gate);
    }
}

/// The device's RCC block.
///
/// The block's address stays private to the crate:
///
/// ```compile_fail
/// let _ = mayo_f4::RCC_BASE;
/// ```
pub fn rcc() -> Rcc<'static, RccRegisterBlock> {
    // SAFETY: RCC_BASE is the fixed address of the RCC block on the target,
    // valid for the whole program; all fields are interior-mutable cells.
    Rcc::new(unsafe { &*(RCC_BASE as *const RccRegisterBlock) })
}
