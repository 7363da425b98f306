//! Fixed-width bit vectors.
//!
//! Every value carried by a wire in the datapath is a [`Bits`]: an ordered
//! sequence of at most [`MAX_WIDTH`] bits, least significant bit first. The
//! vector is stored packed in a `u32`; bits at or above `width` are always
//! zero.

use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Sub};

/// Widest vector the datapath ever carries.
pub const MAX_WIDTH: u8 = 32;

/// Mask covering the low `width` bits.
const fn mask(width: u8) -> u32 {
    if width >= MAX_WIDTH {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bits {
    width: u8,
    value: u32,
}

impl Bits {
    /// Build a vector from the low `width` bits of `value`. Widths above
    /// [`MAX_WIDTH`] are clamped.
    pub const fn new(value: u32, width: u8) -> Self {
        let width = if width > MAX_WIDTH { MAX_WIDTH } else { width };
        Self {
            width,
            value: value & mask(width),
        }
    }

    /// All-zero vector of the given width.
    pub const fn zero(width: u8) -> Self {
        Self::new(0, width)
    }

    pub const fn from_bool(b: bool) -> Self {
        Self::new(b as u32, 1)
    }

    pub const fn from_u8(v: u8, width: u8) -> Self {
        Self::new(v as u32, width)
    }

    /// Two's complement bytes of `v`, truncated to `width`.
    pub const fn from_i8(v: i8, width: u8) -> Self {
        Self::new(v as i32 as u32, width)
    }

    pub const fn from_u16(v: u16, width: u8) -> Self {
        Self::new(v as u32, width)
    }

    pub const fn from_i16(v: i16, width: u8) -> Self {
        Self::new(v as i32 as u32, width)
    }

    pub const fn from_u32(v: u32, width: u8) -> Self {
        Self::new(v, width)
    }

    pub const fn from_i32(v: i32, width: u8) -> Self {
        Self::new(v as u32, width)
    }

    /// Collect bits given least significant first. Bits past
    /// [`MAX_WIDTH`] are dropped.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut value = 0;
        let mut width = 0u8;
        for bit in bits.into_iter().take(MAX_WIDTH as usize) {
            value |= (bit as u32) << width;
            width += 1;
        }
        Self { width, value }
    }

    pub const fn width(self) -> u8 {
        self.width
    }

    /// Unsigned value, zero-extended to 32 bits.
    pub const fn as_u32(self) -> u32 {
        self.value
    }

    /// The zero-extended 32-bit pattern reinterpreted as a signed integer.
    /// Only a full 32-bit vector can be negative.
    pub const fn as_i32(self) -> i32 {
        self.value as i32
    }

    /// Low 16 bits.
    pub const fn as_u16(self) -> u16 {
        self.value as u16
    }

    /// Low 16 bits as a signed integer.
    pub const fn as_i16(self) -> i16 {
        self.value as u16 as i16
    }

    pub const fn as_u8(self) -> u8 {
        self.value as u8
    }

    /// Bit 0. Control wires are one bit wide, so this is their level.
    pub const fn as_bool(self) -> bool {
        self.value & 1 != 0
    }

    /// Bit `i`, or `false` when `i` is outside the vector.
    pub const fn bit(self, i: u8) -> bool {
        i < self.width && (self.value >> i) & 1 != 0
    }

    /// Most significant bit.
    pub const fn msb(self) -> bool {
        self.width > 0 && self.bit(self.width - 1)
    }

    /// Bits from least to most significant.
    pub fn iter(self) -> impl Iterator<Item = bool> {
        (0..self.width).map(move |i| self.bit(i))
    }

    pub const fn is_zero(self) -> bool {
        self.as_i32() == 0
    }

    pub const fn is_positive(self) -> bool {
        self.as_i32() > 0
    }

    /// Truncate or zero-pad to `width`.
    pub const fn resize(self, width: u8) -> Self {
        Self::new(self.value, width)
    }

    /// Widen to `width` replicating the top bit. Narrowing truncates.
    pub const fn sign_extend(self, width: u8) -> Self {
        if width <= self.width || !self.msb() {
            return self.resize(width);
        }
        Self::new(self.value | !mask(self.width), width)
    }

    /// Logical shift left, zero fill. Shifting by the width or more clears
    /// the vector.
    pub const fn shl(self, amount: u32) -> Self {
        if amount >= self.width as u32 {
            return Self::zero(self.width);
        }
        Self::new(self.value << amount, self.width)
    }

    /// Logical shift right, zero fill.
    pub const fn shr(self, amount: u32) -> Self {
        if amount >= self.width as u32 {
            return Self::zero(self.width);
        }
        Self::new(self.value >> amount, self.width)
    }

    /// Arithmetic shift right: the vacated top positions copy the sign bit.
    /// Shifting by the width or more leaves only sign bits.
    pub const fn sra(self, amount: u32) -> Self {
        let sign = self.msb();
        if amount >= self.width as u32 {
            return if sign {
                Self::new(u32::MAX, self.width)
            } else {
                Self::zero(self.width)
            };
        }
        let shifted = self.value >> amount;
        if sign {
            let fill = mask(self.width) & !(mask(self.width) >> amount);
            Self::new(shifted | fill, self.width)
        } else {
            Self::new(shifted, self.width)
        }
    }

    /// Bits `lo..=hi`. Positions beyond the vector read as zero.
    pub const fn slice(self, lo: u8, hi: u8) -> Self {
        if hi < lo {
            return Self::zero(0);
        }
        let width = (hi - lo).saturating_add(1);
        let shifted = if lo >= MAX_WIDTH { 0 } else { self.value >> lo };
        Self::new(shifted, width)
    }

    /// Join `parts` with the first part in the low bits. Returns `None` when
    /// the combined width exceeds [`MAX_WIDTH`].
    pub fn concat(parts: impl IntoIterator<Item = Bits>) -> Option<Self> {
        let mut value = 0u32;
        let mut width = 0u8;
        for part in parts {
            if width as u32 + part.width as u32 > MAX_WIDTH as u32 {
                return None;
            }
            if part.width > 0 {
                value |= part.value << width;
            }
            width += part.width;
        }
        Some(Self { width, value })
    }

    fn combine(self, rhs: Self, op: impl FnOnce(u32, u32) -> u32) -> Self {
        Self::new(op(self.value, rhs.value), self.width.max(rhs.width))
    }
}

impl BitAnd for Bits {
    type Output = Bits;
    fn bitand(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| a & b)
    }
}

impl BitOr for Bits {
    type Output = Bits;
    fn bitor(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| a | b)
    }
}

impl BitXor for Bits {
    type Output = Bits;
    fn bitxor(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| a ^ b)
    }
}

impl Not for Bits {
    type Output = Bits;
    fn not(self) -> Self {
        Self::new(!self.value, self.width)
    }
}

impl Add for Bits {
    type Output = Bits;
    fn add(self, rhs: Self) -> Self {
        self.combine(rhs, u32::wrapping_add)
    }
}

impl Sub for Bits {
    type Output = Bits;
    fn sub(self, rhs: Self) -> Self {
        self.combine(rhs, u32::wrapping_sub)
    }
}

impl From<bool> for Bits {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl fmt::Binary for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            return f.write_str("-");
        }
        for i in (0..self.width).rev() {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::LowerHex for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.value, f)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width <= 8 {
            write!(f, "{:b}", self)
        } else {
            write!(f, "{:#0w$x}", self.value, w = (self.width as usize).div_ceil(4) + 2)
        }
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'{:b}", self.width, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_and_convert() {
        assert_eq!(Bits::from_i32(-1, 32).as_u32(), u32::MAX);
        assert_eq!(Bits::from_i32(-1, 32).as_i32(), -1);
        assert_eq!(Bits::from_i16(-2, 16).as_i16(), -2);
        assert_eq!(Bits::from_i16(-2, 16).as_u32(), 0xfffe);
        assert_eq!(Bits::from_u32(0x1ff, 8).as_u32(), 0xff);
        assert_eq!(Bits::from_u8(5, 3).as_u8(), 5);
        assert_eq!(Bits::from_i8(-1, 4).as_u32(), 0xf);
        // a narrow vector never reads as negative
        assert_eq!(Bits::from_i32(-1, 16).as_i32(), 0xffff);
        assert!(Bits::from_bool(true).as_bool());
        assert_eq!(Bits::new(7, 40).width(), MAX_WIDTH);
    }

    #[test]
    fn test_bit_order() {
        let b = Bits::from_bits([true, false, true, true]);
        assert_eq!(b.width(), 4);
        assert_eq!(b.as_u32(), 0b1101);
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![true, false, true, true]);
        assert_eq!(format!("{:b}", b), "1101");
    }

    #[test]
    fn test_arith_wraps() {
        let a = Bits::from_u32(u32::MAX, 32);
        let one = Bits::from_u32(1, 32);
        assert_eq!((a + one).as_u32(), 0);
        assert_eq!((Bits::zero(32) - one).as_u32(), u32::MAX);
        for (x, y) in [(0x8000_0000u32, 0x8000_0000u32), (12345, 0xffff_0000), (7, 9)] {
            let (bx, by) = (Bits::from_u32(x, 32), Bits::from_u32(y, 32));
            assert_eq!((bx + by).as_u32(), x.wrapping_add(y));
            assert_eq!((bx - by).as_u32(), x.wrapping_sub(y));
        }
    }

    #[test]
    fn test_mixed_width_ops() {
        let wide = Bits::from_u32(0xf0, 8);
        let narrow = Bits::from_u32(0xf, 4);
        assert_eq!((wide | narrow).width(), 8);
        assert_eq!((wide | narrow).as_u32(), 0xff);
        assert_eq!((narrow - wide).as_u32(), 0x1f);
        assert_eq!((!narrow).as_u32(), 0);
        assert_eq!((wide ^ narrow).as_u32(), 0xff);
        assert_eq!((wide & narrow).as_u32(), 0);
    }

    #[test]
    fn test_shifts() {
        let v = Bits::from_u32(0x8000_00f0, 32);
        assert_eq!(v.shl(4).as_u32(), 0x0000_0f00);
        assert_eq!(v.shr(4).as_u32(), 0x0800_000f);
        assert_eq!(v.sra(4).as_u32(), 0xf800_000f);
        assert_eq!(v.shl(32).as_u32(), 0);
        assert_eq!(v.shr(40).as_u32(), 0);
        assert_eq!(v.sra(32).as_u32(), u32::MAX);
        assert_eq!(Bits::from_u32(0x7000_0000, 32).sra(40).as_u32(), 0);
        assert_eq!(Bits::from_u32(0b1000, 4).sra(2).as_u32(), 0b1110);
    }

    #[test]
    fn test_sra_keeps_sign_in_top_positions() {
        for value in [0x8000_0000u32, 0xdead_beef, 0x7fff_ffff, 1] {
            let b = Bits::from_u32(value, 32);
            for s in 0..32u32 {
                let r = b.sra(s);
                for top in (32 - s)..32 {
                    assert_eq!(r.bit(top as u8), b.msb());
                }
                assert_eq!(r.as_i32(), (value as i32) >> s);
                assert_eq!(b.shr(s).as_u32(), value >> s);
            }
        }
    }

    #[test]
    fn test_predicates() {
        assert!(Bits::zero(32).is_zero());
        assert!(!Bits::from_i32(-5, 32).is_positive());
        assert!(Bits::from_i32(5, 32).is_positive());
        assert!(!Bits::zero(32).is_positive());
    }

    #[test]
    fn test_slice_concat() {
        let v = Bits::from_u32(0x1234_5678, 32);
        assert_eq!(v.slice(0, 15).as_u32(), 0x5678);
        assert_eq!(v.slice(16, 31).as_u32(), 0x1234);
        assert_eq!(v.slice(28, 31).width(), 4);
        let joined = Bits::concat([v.slice(0, 15), v.slice(16, 31)]).unwrap();
        assert_eq!(joined, v);
        assert!(Bits::concat([v, Bits::from_bool(true)]).is_none());
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(Bits::from_u16(0x8000, 16).sign_extend(32).as_u32(), 0xffff_8000);
        assert_eq!(Bits::from_u16(0x7fff, 16).sign_extend(32).as_u32(), 0x7fff);
        assert_eq!(Bits::from_u16(0x8000, 16).resize(32).as_u32(), 0x8000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Bits::from_u32(5, 3)), "101");
        assert_eq!(format!("{}", Bits::from_u32(0xab, 32)), "0x000000ab");
        assert_eq!(format!("{:?}", Bits::from_u32(2, 2)), "2'10");
    }
}
