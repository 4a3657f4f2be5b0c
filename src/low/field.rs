//! Per-pin bit ranges of the GPIO configuration registers.
//!
//! A [`PinField`] owns the geometry of one configuration attribute: how wide
//! a pin's field is and which register holds it. Every shift and mask used by
//! the engine is derived here and nowhere else.

use super::register::GpioReg;

/// A fixed-width field repeated once per pin across one or more registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinField {
    registers: &'static [GpioReg],
    width: u32,
}

impl PinField {
    /// MODER, 2 bits per pin.
    pub const MODE: PinField = PinField::new(&[GpioReg::Moder], 2);
    /// OTYPER, 1 bit per pin.
    pub const OUTPUT_TYPE: PinField = PinField::new(&[GpioReg::Otyper], 1);
    /// OSPEEDR, 2 bits per pin.
    pub const SPEED: PinField = PinField::new(&[GpioReg::Ospeedr], 2);
    /// PUPDR, 2 bits per pin.
    pub const PULL: PinField = PinField::new(&[GpioReg::Pupdr], 2);
    /// AFRL for pins 0-7, AFRH for pins 8-15, 4 bits per pin.
    pub const ALTERNATE: PinField = PinField::new(&[GpioReg::Afrl, GpioReg::Afrh], 4);

    const fn new(registers: &'static [GpioReg], width: u32) -> Self {
        assert!(width > 0 && 32 % width == 0);
        assert!(registers.len() as u32 * (32 / width) >= 16);
        Self { registers, width }
    }

    /// Width of one pin's field in bits.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Unshifted mask of one field.
    #[inline]
    pub const fn mask(&self) -> u32 {
        if self.width == 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Register holding `pin`'s field and the field's bit offset within it.
    #[inline]
    pub fn locate(&self, pin: u8) -> (GpioReg, u32) {
        debug_assert!(pin < 16, "pin index out of range");
        let per_register = 32 / self.width;
        let pin = u32::from(pin % 16);
        let index = (pin / per_register) as usize;
        (self.registers[index], (pin % per_register) * self.width)
    }

    /// `word` with the field at `shift` replaced by `value`.
    ///
    /// Only the bits owned by that field change. `value` is truncated to the
    /// field width.
    #[inline]
    pub const fn insert(&self, word: u32, shift: u32, value: u32) -> u32 {
        (word & !(self.mask() << shift)) | ((value & self.mask()) << shift)
    }

    /// The field at `shift` in `word`.
    #[inline]
    pub const fn extract(&self, word: u32, shift: u32) -> u32 {
        (word >> shift) & self.mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: [PinField; 5] = [
        PinField::MODE,
        PinField::OUTPUT_TYPE,
        PinField::SPEED,
        PinField::PULL,
        PinField::ALTERNATE,
    ];

    #[test]
    fn locate_matches_reference_manual() {
        assert_eq!(PinField::MODE.locate(15), (GpioReg::Moder, 30));
        assert_eq!(PinField::OUTPUT_TYPE.locate(12), (GpioReg::Otyper, 12));
        assert_eq!(PinField::SPEED.locate(3), (GpioReg::Ospeedr, 6));
        assert_eq!(PinField::PULL.locate(8), (GpioReg::Pupdr, 16));
        assert_eq!(PinField::ALTERNATE.locate(7), (GpioReg::Afrl, 28));
        assert_eq!(PinField::ALTERNATE.locate(8), (GpioReg::Afrh, 0));
        assert_eq!(PinField::ALTERNATE.locate(13), (GpioReg::Afrh, 20));
    }

    #[test]
    fn fields_of_distinct_pins_never_overlap() {
        for field in FIELDS {
            for a in 0..16u8 {
                for b in (a + 1)..16u8 {
                    let (ra, sa) = field.locate(a);
                    let (rb, sb) = field.locate(b);
                    if ra == rb {
                        assert_eq!((field.mask() << sa) & (field.mask() << sb), 0);
                    }
                }
            }
        }
    }

    #[test]
    fn insert_only_touches_its_field() {
        let patterns = [0u32, u32::MAX, 0xA5A5_5A5A, 0x1234_5678];
        for field in FIELDS {
            for pin in 0..16u8 {
                let (_, shift) = field.locate(pin);
                let owned = field.mask() << shift;
                for word in patterns {
                    for value in 0..=field.mask() {
                        let out = field.insert(word, shift, value);
                        assert_eq!(out & !owned, word & !owned);
                        assert_eq!(field.extract(out, shift), value);
                    }
                }
            }
        }
    }

    #[test]
    fn oversized_values_are_truncated() {
        let (_, shift) = PinField::MODE.locate(1);
        assert_eq!(PinField::MODE.insert(0, shift, 0b111), 0b11 << 2);
    }
}
