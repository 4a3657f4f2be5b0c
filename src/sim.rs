//! Simulated register blocks for host tests.
//!
//! Registers are atomics so the blocks can live in `static`s behind a
//! [`crate::Bank`]. Every access made through the register traits is logged
//! with a sequence number drawn from one global counter, so the relative
//! order of accesses to different blocks can be compared.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::vec::Vec;

use crate::low::register::{GpioReg, GpioRegisters};
use crate::rcc::{ClockRegisters, RccReg};

static SEQ: AtomicUsize = AtomicUsize::new(0);

pub(crate) const LCKK: u32 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Access {
    pub seq: usize,
    pub kind: Kind,
    pub offset: usize,
    pub value: u32,
}

struct Trace(Mutex<Vec<Access>>);

impl Trace {
    const fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    fn record(&self, kind: Kind, offset: usize, value: u32) {
        let seq = SEQ.fetch_add(1, Ordering::SeqCst);
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Access { seq, kind, offset, value });
    }

    fn snapshot(&self) -> Vec<Access> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn clear(&self) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// A GPIO port whose outputs loop back to its inputs.
///
/// IDR reports ODR for pins in general purpose output mode and the levels
/// set with [`SimPort::drive_input`] for every other pin. BSRR and the LCKR
/// key sequence behave as on the device.
pub(crate) struct SimPort {
    regs: [AtomicU32; 10],
    input: AtomicU32,
    lock_step: AtomicU32,
    lock_key: AtomicU32,
    refuse_lock: AtomicBool,
    trace: Trace,
}

impl SimPort {
    pub const fn new() -> Self {
        Self {
            regs: [const { AtomicU32::new(0) }; 10],
            input: AtomicU32::new(0),
            lock_step: AtomicU32::new(0),
            lock_key: AtomicU32::new(0),
            refuse_lock: AtomicBool::new(false),
            trace: Trace::new(),
        }
    }

    fn slot(&self, reg: GpioReg) -> &AtomicU32 {
        &self.regs[reg.offset() / 4]
    }

    /// Set a register without logging.
    pub fn preset(&self, reg: GpioReg, value: u32) {
        match reg {
            GpioReg::Idr => self.input.store(value & 0xFFFF, Ordering::SeqCst),
            _ => self.slot(reg).store(value, Ordering::SeqCst),
        }
    }

    /// Observe a register without logging.
    pub fn peek(&self, reg: GpioReg) -> u32 {
        match reg {
            GpioReg::Idr => self.input_word(),
            GpioReg::Bsrr => 0,
            _ => self.slot(reg).load(Ordering::SeqCst),
        }
    }

    /// Externally applied levels for pins that are not driven outputs.
    pub fn drive_input(&self, levels: u16) {
        self.input.store(u32::from(levels), Ordering::SeqCst);
    }

    /// Make the next LCKR key sequence fail.
    pub fn refuse_lock(&self) {
        self.refuse_lock.store(true, Ordering::SeqCst);
    }

    pub fn accesses(&self) -> Vec<Access> {
        self.trace.snapshot()
    }

    pub fn clear_log(&self) {
        self.trace.clear();
    }

    fn output_pins(&self) -> u32 {
        let moder = self.slot(GpioReg::Moder).load(Ordering::SeqCst);
        (0..16)
            .filter(|pin| (moder >> (pin * 2)) & 0b11 == 0b01)
            .fold(0, |mask, pin| mask | (1 << pin))
    }

    fn input_word(&self) -> u32 {
        let driven = self.output_pins();
        let odr = self.slot(GpioReg::Odr).load(Ordering::SeqCst);
        let external = self.input.load(Ordering::SeqCst);
        ((odr & driven) | (external & !driven)) & 0xFFFF
    }

    fn write_lckr(&self, value: u32) {
        let lckr = self.slot(GpioReg::Lckr);
        if lckr.load(Ordering::SeqCst) & LCKK != 0 {
            return;
        }
        lckr.store(value & 0xFFFF, Ordering::SeqCst);
        let key = self.lock_key.load(Ordering::SeqCst);
        let next = match self.lock_step.load(Ordering::SeqCst) {
            0 if value & LCKK != 0 => {
                self.lock_key.store(value & 0xFFFF, Ordering::SeqCst);
                1
            }
            1 if value == key => 2,
            2 if value == LCKK | key => 3,
            _ => 0,
        };
        self.lock_step.store(next, Ordering::SeqCst);
    }

    fn read_lckr(&self) -> u32 {
        let lckr = self.slot(GpioReg::Lckr);
        if self.lock_step.swap(0, Ordering::SeqCst) == 3 && !self.refuse_lock.load(Ordering::SeqCst) {
            lckr.store(LCKK | self.lock_key.load(Ordering::SeqCst), Ordering::SeqCst);
        }
        lckr.load(Ordering::SeqCst)
    }
}

unsafe impl GpioRegisters for SimPort {
    fn read(&self, reg: GpioReg) -> u32 {
        let value = match reg {
            GpioReg::Lckr => self.read_lckr(),
            _ => self.peek(reg),
        };
        self.trace.record(Kind::Read, reg.offset(), value);
        value
    }

    fn write(&self, reg: GpioReg, value: u32) {
        self.trace.record(Kind::Write, reg.offset(), value);
        match reg {
            GpioReg::Idr => {}
            GpioReg::Bsrr => {
                let odr = self.slot(GpioReg::Odr);
                let current = odr.load(Ordering::SeqCst);
                // Set wins over reset when both bits of a pin are written.
                let next = (current & !(value >> 16)) | (value & 0xFFFF);
                odr.store(next & 0xFFFF, Ordering::SeqCst);
            }
            GpioReg::Lckr => self.write_lckr(value),
            _ => self.slot(reg).store(value, Ordering::SeqCst),
        }
    }
}

/// An RCC block with plain read/write registers.
pub(crate) struct SimRcc {
    regs: [AtomicU32; 34],
    trace: Trace,
}

impl SimRcc {
    pub const fn new() -> Self {
        Self {
            regs: [const { AtomicU32::new(0) }; 34],
            trace: Trace::new(),
        }
    }

    fn slot(&self, reg: RccReg) -> &AtomicU32 {
        &self.regs[reg.offset() / 4]
    }

    pub fn preset(&self, reg: RccReg, value: u32) {
        self.slot(reg).store(value, Ordering::SeqCst);
    }

    pub fn peek(&self, reg: RccReg) -> u32 {
        self.slot(reg).load(Ordering::SeqCst)
    }

    pub fn accesses(&self) -> Vec<Access> {
        self.trace.snapshot()
    }
}

unsafe impl ClockRegisters for SimRcc {
    fn read(&self, reg: RccReg) -> u32 {
        let value = self.peek(reg);
        self.trace.record(Kind::Read, reg.offset(), value);
        value
    }

    fn write(&self, reg: RccReg, value: u32) {
        self.trace.record(Kind::Write, reg.offset(), value);
        self.preset(reg, value);
    }
}
