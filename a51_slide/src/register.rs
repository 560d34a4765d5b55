/// Slide A5/1: Shift Registers
///
/// A `Register` is an immutable value: bits are packed into a `u8`,
/// most-significant bit first, and every operation returns a new value.
/// Tap positions live in a static `RegisterLayout` so that the three
/// registers share one implementation.

use std::fmt;

/// Static shape of one register: width, feedback taps and clock tap.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RegisterLayout {
    pub name: &'static str,
    pub width: usize,
    /// Feedback taps as 0-based indices into the MSB-first bit array.
    pub feedback_taps: &'static [usize],
    /// Clock tap counted from the LSB end (1 = last bit).
    pub clock_tap_from_lsb: usize,
}

impl RegisterLayout {
    /// MSB-first index of the clock-control bit.
    pub const fn clock_index(&self) -> usize {
        self.width - self.clock_tap_from_lsb
    }

    const fn mask(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }
}

/// X: 5 bits, feedback X4 ⊕ X2, clock X2.
pub static LAYOUT_X: RegisterLayout = RegisterLayout {
    name: "X",
    width: 5,
    feedback_taps: &[1, 3],
    clock_tap_from_lsb: 2,
};

/// Y: 6 bits, feedback Y5 ⊕ Y1, clock Y3.
pub static LAYOUT_Y: RegisterLayout = RegisterLayout {
    name: "Y",
    width: 6,
    feedback_taps: &[1, 5],
    clock_tap_from_lsb: 3,
};

/// Z: 7 bits, feedback Z6 ⊕ Z5 ⊕ Z1, clock Z4.
pub static LAYOUT_Z: RegisterLayout = RegisterLayout {
    name: "Z",
    width: 7,
    feedback_taps: &[1, 2, 6],
    clock_tap_from_lsb: 4,
};

/// Immutable fixed-width bit vector.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    layout: &'static RegisterLayout,
    bits: u8,
}

impl Register {
    /// All-zero register of the given layout.
    pub fn zeroed(layout: &'static RegisterLayout) -> Self {
        Self { layout, bits: 0 }
    }

    /// Build from a packed value. `None` if it needs more than `width` bits.
    pub fn from_packed(layout: &'static RegisterLayout, bits: u8) -> Option<Self> {
        if bits & !layout.mask() != 0 {
            return None;
        }
        Some(Self { layout, bits })
    }

    /// Parse an MSB-first '0'/'1' string of exactly `width` characters.
    pub fn parse(layout: &'static RegisterLayout, text: &str) -> Option<Self> {
        if text.len() != layout.width {
            return None;
        }
        let mut bits = 0u8;
        for ch in text.chars() {
            let bit = match ch {
                '0' => 0,
                '1' => 1,
                _ => return None,
            };
            bits = (bits << 1) | bit;
        }
        Some(Self { layout, bits })
    }

    pub fn layout(&self) -> &'static RegisterLayout {
        self.layout
    }

    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// Packed value, MSB of the register in bit `width - 1`.
    pub fn packed(&self) -> u8 {
        self.bits
    }

    /// Bit at an MSB-first index.
    ///
    /// # Panics
    /// Panics if `index >= width`.
    pub fn bit(&self, index: usize) -> u8 {
        assert!(
            index < self.layout.width,
            "bit index {} out of range for register {} (width {})",
            index,
            self.layout.name,
            self.layout.width
        );
        (self.bits >> (self.layout.width - 1 - index)) & 1
    }

    pub fn msb(&self) -> u8 {
        self.bit(0)
    }

    /// Bits MSB first.
    pub fn bits(&self) -> Vec<u8> {
        (0..self.layout.width).map(|i| self.bit(i)).collect()
    }

    /// XOR of the layout's feedback taps.
    pub fn feedback(&self) -> u8 {
        self.layout
            .feedback_taps
            .iter()
            .fold(0, |acc, &tap| acc ^ self.bit(tap))
    }

    /// Bit consulted by the majority rule.
    pub fn clock_control(&self) -> u8 {
        self.bit(self.layout.clock_index())
    }

    /// Drop the MSB and append `injected` at the LSB.
    pub fn shift(&self, injected: u8) -> Self {
        Self {
            layout: self.layout,
            bits: ((self.bits << 1) | (injected & 1)) & self.layout.mask(),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.layout.width {
            f.write_str(if self.bit(i) == 0 { "0" } else { "1" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.layout.name, self)
    }
}
