//! Volatile register cells and the GPIO register block overlay.
//!
//! Every hardware access in the crate goes through [`Reg`], which only
//! performs `read_volatile`/`write_volatile` on its cell: the compiler may
//! neither elide, merge, cache nor reorder two such accesses. The register
//! block structs are `#[repr(C)]` overlays whose field offsets are pinned by
//! the compile-time assertions at the bottom of this file and must match the
//! device reference manual bit for bit.

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::ptr;

mod private {
    // Sealed trait to keep the access markers local to the crate.
    pub trait Sealed {}
    impl Sealed for super::RW {}
    impl Sealed for super::RO {}
    impl Sealed for super::WO {}
}

/// Access permission marker of a register.
pub trait Access: private::Sealed {}
/// Registers that may be read.
pub trait Readable: Access {}
/// Registers that may be written.
pub trait Writable: Access {}

/// Read/write register.
pub struct RW;
/// Read-only register.
pub struct RO;
/// Write-only register.
pub struct WO;

impl Access for RW {}
impl Access for RO {}
impl Access for WO {}
impl Readable for RW {}
impl Readable for RO {}
impl Writable for RW {}
impl Writable for WO {}

/// One 32-bit memory-mapped register.
///
/// The type is only ever used behind a reference into a register block;
/// it cannot be constructed, copied or moved by user code.
#[repr(transparent)]
pub struct Reg<A: Access> {
    value: UnsafeCell<u32>,
    access: PhantomData<A>,
}

// Registers are shared between the main flow and interrupt handlers. Each
// access is a single volatile word load or store.
unsafe impl<A: Access> Sync for Reg<A> {}

impl<A: Access> Reg<A> {
    #[cfg(test)]
    pub(crate) const fn new(value: u32) -> Self {
        Self {
            value: UnsafeCell::new(value),
            access: PhantomData,
        }
    }
}

impl<A: Readable> Reg<A> {
    /// Volatile load of the register.
    #[inline(always)]
    pub fn read(&self) -> u32 {
        // SAFETY: the cell lives inside a register block that is valid for
        // the lifetime of `self`.
        unsafe { ptr::read_volatile(self.value.get()) }
    }
}

impl<A: Writable> Reg<A> {
    /// Volatile store to the register.
    #[inline(always)]
    pub fn write(&self, value: u32) {
        // SAFETY: see `read`.
        unsafe { ptr::write_volatile(self.value.get(), value) }
    }
}

/// Registers of a GPIO port, named as in the reference manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioReg {
    Moder,
    Otyper,
    Ospeedr,
    Pupdr,
    Idr,
    Odr,
    Bsrr,
    Lckr,
    Afrl,
    Afrh,
}

impl GpioReg {
    /// Byte offset of the register inside the port block.
    pub const fn offset(self) -> usize {
        match self {
            GpioReg::Moder => 0x00,
            GpioReg::Otyper => 0x04,
            GpioReg::Ospeedr => 0x08,
            GpioReg::Pupdr => 0x0C,
            GpioReg::Idr => 0x10,
            GpioReg::Odr => 0x14,
            GpioReg::Bsrr => 0x18,
            GpioReg::Lckr => 0x1C,
            GpioReg::Afrl => 0x20,
            GpioReg::Afrh => 0x24,
        }
    }
}

/// Register-level trait the GPIO engine is generic over.
///
/// The hardware implementation is [`GpioRegisterBlock`]; tests substitute a
/// simulated block.
///
/// # Safety
///
/// Implementers must perform exactly one access to the named register per
/// call, in program order, with no caching. Reading [`GpioReg::Bsrr`] yields 0
/// and writing [`GpioReg::Idr`] has no effect, as on the device.
pub unsafe trait GpioRegisters {
    /// Load the current value of `reg`.
    fn read(&self, reg: GpioReg) -> u32;

    /// Store `value` into `reg`.
    fn write(&self, reg: GpioReg, value: u32);
}

/// Memory layout of one GPIO port.
#[repr(C)]
pub struct GpioRegisterBlock {
    moder: Reg<RW>,
    otyper: Reg<RW>,
    ospeedr: Reg<RW>,
    pupdr: Reg<RW>,
    idr: Reg<RO>,
    odr: Reg<RW>,
    bsrr: Reg<WO>,
    lckr: Reg<RW>,
    afrl: Reg<RW>,
    afrh: Reg<RW>,
}

unsafe impl GpioRegisters for GpioRegisterBlock {
    #[inline]
    fn read(&self, reg: GpioReg) -> u32 {
        match reg {
            GpioReg::Moder => self.moder.read(),
            GpioReg::Otyper => self.otyper.read(),
            GpioReg::Ospeedr => self.ospeedr.read(),
            GpioReg::Pupdr => self.pupdr.read(),
            GpioReg::Idr => self.idr.read(),
            GpioReg::Odr => self.odr.read(),
            GpioReg::Bsrr => 0,
            GpioReg::Lckr => self.lckr.read(),
            GpioReg::Afrl => self.afrl.read(),
            GpioReg::Afrh => self.afrh.read(),
        }
    }

    #[inline]
    fn write(&self, reg: GpioReg, value: u32) {
        match reg {
            GpioReg::Moder => self.moder.write(value),
            GpioReg::Otyper => self.otyper.write(value),
            GpioReg::Ospeedr => self.ospeedr.write(value),
            GpioReg::Pupdr => self.pupdr.write(value),
            GpioReg::Idr => {}
            GpioReg::Odr => self.odr.write(value),
            GpioReg::Bsrr => self.bsrr.write(value),
            GpioReg::Lckr => self.lckr.write(value),
            GpioReg::Afrl => self.afrl.write(value),
            GpioReg::Afrh => self.afrh.write(value),
        }
    }
}

macro_rules! assert_offset {
    ($block:ty, $field:ident, $reg:expr) => {
        const _: () = assert!(core::mem::offset_of!($block, $field) == $reg.offset());
    };
}

assert_offset!(GpioRegisterBlock, moder, GpioReg::Moder);
assert_offset!(GpioRegisterBlock, otyper, GpioReg::Otyper);
assert_offset!(GpioRegisterBlock, ospeedr, GpioReg::Ospeedr);
assert_offset!(GpioRegisterBlock, pupdr, GpioReg::Pupdr);
assert_offset!(GpioRegisterBlock, idr, GpioReg::Idr);
assert_offset!(GpioRegisterBlock, odr, GpioReg::Odr);
assert_offset!(GpioRegisterBlock, bsrr, GpioReg::Bsrr);
assert_offset!(GpioRegisterBlock, lckr, GpioReg::Lckr);
assert_offset!(GpioRegisterBlock, afrl, GpioReg::Afrl);
assert_offset!(GpioRegisterBlock, afrh, GpioReg::Afrh);
const _: () = assert!(core::mem::size_of::<GpioRegisterBlock>() == 0x28);

pub(crate) use assert_offset;
