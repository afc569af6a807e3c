use core::cmp::Ordering;
use core::fmt;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

/// Defines the supported rounding modes.
/// See IEEE754-2019 Section 4.3 Rounding-direction attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    NearestTiesToAway,
    NearestTiesToEven,
    Ceiling,
    Floor,
    Truncate,
}

impl RoundingMode {
    /// Create a rounding mode from its short name ("NearestTiesToEven",
    /// "Ceiling", ...).
    pub fn from_string(s: &str) -> Option<Self> {
        [
            RoundingMode::NearestTiesToAway,
            RoundingMode::NearestTiesToEven,
            RoundingMode::Ceiling,
            RoundingMode::Floor,
            RoundingMode::Truncate,
        ]
        .into_iter()
        .find(|rm| rm.as_string() == s)
    }

    pub fn as_string(&self) -> &'static str {
        match self {
            RoundingMode::NearestTiesToAway => "NearestTiesToAway",
            RoundingMode::NearestTiesToEven => "NearestTiesToEven",
            RoundingMode::Ceiling => "Ceiling",
            RoundingMode::Floor => "Floor",
            RoundingMode::Truncate => "Truncate",
        }
    }
}

/// The widest exponent field a format may declare.
pub const MAX_EXP_BITS: u32 = 25;

/// The exponent width of the working formats. It is wider than that of every
/// user format, so that the subnormals and the overflow threshold of any
/// operand lie well inside the normal range of a working format.
pub(crate) const WORK_EXP_BITS: u32 = MAX_EXP_BITS + 3;

/// The number of guard, round and sticky bits that every rounding step
/// carries below the last retained bit.
pub(crate) const GRS_BITS: i64 = 3;

/// Describes the layout of a binary interchange format: the width of the
/// exponent field and the number of stored significand bits (the hidden bit
/// is not counted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Format {
    exp_bits: u32,
    sig_bits: u32,
}

impl Format {
    pub const fn new(exp_bits: u32, sig_bits: u32) -> Self {
        assert!(
            exp_bits >= 2 && exp_bits <= MAX_EXP_BITS,
            "Invalid exponent width"
        );
        Format { exp_bits, sig_bits }
    }

    pub const FLOAT8: Format = Format::new(4, 3);
    pub const FLOAT16: Format = Format::new(5, 10);
    pub const FLOAT32: Format = Format::new(8, 23);
    pub const FLOAT64: Format = Format::new(11, 52);
    pub const FLOAT80: Format = Format::new(15, 63);
    pub const FLOAT128: Format = Format::new(15, 112);
    pub const FLOAT256: Format = Format::new(19, 236);

    pub fn exp_bits(&self) -> u32 {
        self.exp_bits
    }
    pub fn sig_bits(&self) -> u32 {
        self.sig_bits
    }
    /// Returns the number of significant bits, hidden bit included.
    pub fn precision(&self) -> u32 {
        self.sig_bits + 1
    }

    /// Returns the exponent bias for the format, as a positive number.
    /// https://en.wikipedia.org/wiki/IEEE_754#Basic_and_interchange_formats
    pub fn bias(&self) -> i64 {
        (1i64 << (self.exp_bits - 1)) - 1
    }
    /// Returns the exponent of the smallest normal number.
    pub fn min_exp(&self) -> i64 {
        1 - self.bias()
    }
    /// Returns the exponent of the largest finite number.
    pub fn max_exp(&self) -> i64 {
        (1i64 << self.exp_bits) - 2 - self.bias()
    }

    /// Returns a working format with `sig_bits` stored significand bits.
    pub(crate) const fn working(sig_bits: u32) -> Format {
        Format {
            exp_bits: WORK_EXP_BITS,
            sig_bits,
        }
    }

    /// Returns the smallest format that contains both formats.
    pub fn sup(&self, other: &Format) -> Format {
        Format {
            exp_bits: self.exp_bits.max(other.exp_bits),
            sig_bits: self.sig_bits.max(other.sig_bits),
        }
    }

    pub fn with_unlimited_exponent(&self) -> Format {
        Format::working(self.sig_bits)
    }

    /// Returns the working format of the Newton iterations in divide and
    /// sqrt. The significand must be wider than 2*sig_bits+2 bits for the
    /// final rounding to be correct.
    pub fn intermediate_precision(&self) -> Format {
        Format::working(2 * self.sig_bits + 10)
    }

    /// Returns a format with `extra` more significand bits and an unlimited
    /// exponent range.
    pub fn extended(&self, extra: u32) -> Format {
        Format::working(self.sig_bits + extra)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Format({}, {})", self.exp_bits, self.sig_bits)
    }
}

/// Removes the low `k` bits of `value`, folding them into a sticky bit at
/// position zero.
pub fn truncate(value: &BigUint, k: u64) -> BigUint {
    if k == 0 {
        return value.clone();
    }
    if k >= value.bits() {
        return if value.is_zero() {
            BigUint::zero()
        } else {
            BigUint::one()
        };
    }
    let kept = value >> k;
    let lost = value.trailing_zeros().map_or(false, |tz| tz < k);
    if lost {
        kept | BigUint::one()
    } else {
        kept
    }
}

/// Rounds away the three guard, round and sticky bits at the bottom of
/// `value`, using the rounding mode `mode` for a number of sign `sign`.
pub fn apply_rounding(value: &BigUint, sign: bool, mode: RoundingMode) -> BigUint {
    let grs = (value & BigUint::from(7u32)).to_u32().unwrap_or(0);
    let kept: BigUint = value >> 3u32;
    let inexact = grs != 0;
    let round_up = match mode {
        RoundingMode::NearestTiesToEven => {
            grs > 4 || (grs == 4 && kept.bit(0))
        }
        RoundingMode::NearestTiesToAway => grs >= 4,
        RoundingMode::Ceiling => inexact && !sign,
        RoundingMode::Floor => inexact && sign,
        RoundingMode::Truncate => false,
    };
    if round_up {
        kept + 1u32
    } else {
        kept
    }
}

/// This is the main data structure of this library. It represents a binary
/// floating point number in an arbitrary format, using the IEEE encoding of
/// the exponent: subnormal numbers and zero use `min_exp - 1`, infinity and
/// NaN use `max_exp + 1`.
#[derive(Debug, Clone)]
pub struct FloatValue {
    format: Format,
    sign: bool,
    exponent: i64,
    // The significand, including the hidden bit for normal numbers.
    significand: BigUint,
}

impl FloatValue {
    /// Create a new value from its fields. Panics if the fields do not
    /// describe a valid encoding in `format`.
    pub fn new(
        format: Format,
        sign: bool,
        exponent: i64,
        significand: BigUint,
    ) -> Self {
        let bits = significand.bits();
        let precision = u64::from(format.precision());
        if exponent == format.max_exp() + 1 {
            assert!(bits <= precision, "Invalid NaN payload");
        } else if exponent == format.min_exp() - 1 {
            assert!(bits < precision, "Invalid subnormal significand");
        } else {
            assert!(
                exponent >= format.min_exp() && exponent <= format.max_exp(),
                "Exponent out of range"
            );
            assert!(bits == precision, "Invalid normal significand");
        }
        FloatValue {
            format,
            sign,
            exponent,
            significand,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }
    pub fn sign(&self) -> bool {
        self.sign
    }
    /// Returns the encoded exponent (see the type documentation).
    pub fn exponent(&self) -> i64 {
        self.exponent
    }
    pub fn significand(&self) -> &BigUint {
        &self.significand
    }

    pub(crate) fn signed_zero(format: Format, sign: bool) -> Self {
        Self::new(format, sign, format.min_exp() - 1, BigUint::zero())
    }
    pub(crate) fn signed_infinity(format: Format, sign: bool) -> Self {
        Self::new(format, sign, format.max_exp() + 1, BigUint::zero())
    }
    pub(crate) fn signed_nan(format: Format, sign: bool) -> Self {
        let payload = BigUint::one() << format.sig_bits().saturating_sub(1);
        Self::new(format, sign, format.max_exp() + 1, payload)
    }
    pub(crate) fn signed_one(format: Format, sign: bool) -> Self {
        Self::new(format, sign, 0, BigUint::one() << format.sig_bits())
    }

    pub fn zero(format: Format) -> Self {
        Self::signed_zero(format, false)
    }
    pub fn negative_zero(format: Format) -> Self {
        Self::signed_zero(format, true)
    }
    pub fn one(format: Format) -> Self {
        Self::signed_one(format, false)
    }
    pub fn negative_one(format: Format) -> Self {
        Self::signed_one(format, true)
    }
    /// Returns the canonical (positive, quiet) NaN.
    pub fn nan(format: Format) -> Self {
        Self::signed_nan(format, false)
    }
    pub fn infinity(format: Format) -> Self {
        Self::signed_infinity(format, false)
    }
    pub fn negative_infinity(format: Format) -> Self {
        Self::signed_infinity(format, true)
    }

    /// Returns the largest finite number of the format, with sign `sign`.
    pub fn max_value(format: Format, sign: bool) -> Self {
        let significand = (BigUint::one() << format.precision()) - 1u32;
        Self::new(format, sign, format.max_exp(), significand)
    }
    /// Returns the smallest positive normal number of the format.
    pub fn min_normal(format: Format) -> Self {
        Self::new(
            format,
            false,
            format.min_exp(),
            BigUint::one() << format.sig_bits(),
        )
    }
    /// Returns the smallest positive number of the format.
    pub fn min_subnormal(format: Format) -> Self {
        Self::round_scaled(
            format,
            false,
            BigUint::one(),
            format.min_exp() - i64::from(format.sig_bits()),
            RoundingMode::NearestTiesToEven,
        )
    }

    pub fn is_nan(&self) -> bool {
        self.exponent == self.format.max_exp() + 1 && !self.significand.is_zero()
    }
    pub fn is_infinite(&self) -> bool {
        self.exponent == self.format.max_exp() + 1 && self.significand.is_zero()
    }
    pub fn is_finite(&self) -> bool {
        self.exponent <= self.format.max_exp()
    }
    pub fn is_zero(&self) -> bool {
        self.exponent == self.format.min_exp() - 1 && self.significand.is_zero()
    }
    pub fn is_subnormal(&self) -> bool {
        self.exponent == self.format.min_exp() - 1 && !self.significand.is_zero()
    }
    pub fn is_normal(&self) -> bool {
        self.exponent >= self.format.min_exp() && self.exponent <= self.format.max_exp()
    }
    pub fn is_negative(&self) -> bool {
        self.sign
    }
    /// Returns true for +1 only.
    pub fn is_one(&self) -> bool {
        !self.sign && self.is_unit()
    }
    pub fn is_negative_one(&self) -> bool {
        self.sign && self.is_unit()
    }
    fn is_unit(&self) -> bool {
        self.exponent == 0
            && self.is_normal()
            && self.significand == BigUint::one() << self.format.sig_bits()
    }

    /// Returns the value as `(significand, lsb)` where the number is
    /// `significand * 2^lsb`. Only valid for finite numbers.
    pub(crate) fn exact_parts(&self) -> (BigUint, i64) {
        debug_assert!(self.is_finite());
        let s = i64::from(self.format.sig_bits());
        let exp = if self.is_normal() {
            self.exponent
        } else {
            self.format.min_exp()
        };
        (self.significand.clone(), exp - s)
    }

    /// Returns the exponent of the leading one bit. Only valid for finite
    /// nonzero numbers.
    pub(crate) fn leading_exponent(&self) -> i64 {
        let (sig, lsb) = self.exact_parts();
        lsb + sig.bits() as i64 - 1
    }

    /// Round the number `sig * 2^lsb` into `format`. The lowest bit of `sig`
    /// may be a sticky bit, as produced by `truncate`.
    pub(crate) fn round_scaled(
        format: Format,
        sign: bool,
        sig: BigUint,
        lsb: i64,
        mode: RoundingMode,
    ) -> Self {
        if sig.is_zero() {
            return Self::signed_zero(format, sign);
        }
        let s = i64::from(format.sig_bits());
        let top = lsb + sig.bits() as i64 - 1;
        let mut exp = top.max(format.min_exp());

        // Line the value up so that three GRS bits follow the last kept bit.
        let target_lsb = exp - s - GRS_BITS;
        let extended = if target_lsb >= lsb {
            truncate(&sig, (target_lsb - lsb) as u64)
        } else {
            sig << ((lsb - target_lsb) as u64)
        };

        let mut rounded = apply_rounding(&extended, sign, mode);
        // Rounding may carry into a new leading bit.
        if rounded.bits() > u64::from(format.precision()) {
            rounded >>= 1u32;
            exp += 1;
        }
        if exp > format.max_exp() {
            return Self::overflow(format, sign, mode);
        }
        if rounded.is_zero() {
            return Self::signed_zero(format, sign);
        }
        if rounded.bits() < u64::from(format.precision()) {
            exp = format.min_exp() - 1;
        }
        Self::new(format, sign, exp, rounded)
    }

    /// Returns the result of an overflow: infinity or the largest finite
    /// number, depending on the rounding mode.
    pub(crate) fn overflow(format: Format, sign: bool, mode: RoundingMode) -> Self {
        let to_infinity = match mode {
            RoundingMode::NearestTiesToEven | RoundingMode::NearestTiesToAway => true,
            RoundingMode::Ceiling => !sign,
            RoundingMode::Floor => sign,
            RoundingMode::Truncate => false,
        };
        if to_infinity {
            Self::signed_infinity(format, sign)
        } else {
            Self::max_value(format, sign)
        }
    }

    /// Convert the number into `format`, rounding to nearest, ties to even.
    pub fn with_precision(&self, format: Format) -> Self {
        self.round_with_mode(format, RoundingMode::NearestTiesToEven)
    }

    /// Convert the number into `format` using the rounding mode `mode`.
    pub fn round_with_mode(&self, format: Format, mode: RoundingMode) -> Self {
        if self.is_nan() {
            return Self::signed_nan(format, self.sign);
        }
        if self.is_infinite() {
            return Self::signed_infinity(format, self.sign);
        }
        if self.is_zero() {
            return Self::signed_zero(format, self.sign);
        }
        let (sig, lsb) = self.exact_parts();
        Self::round_scaled(format, self.sign, sig, lsb, mode)
    }

    /// Convert the number into a wider format without rounding.
    pub(crate) fn widen(&self, format: Format) -> Self {
        if self.format == format {
            self.clone()
        } else {
            self.with_precision(format)
        }
    }

    pub fn negate(&self) -> Self {
        let mut a = self.clone();
        a.sign = !a.sign;
        a
    }

    pub fn abs(&self) -> Self {
        let mut a = self.clone();
        a.sign = false;
        a
    }

    /// Returns the number with the sign of `other`.
    pub fn copy_sign(&self, other: &Self) -> Self {
        let mut a = self.clone();
        a.sign = other.sign;
        a
    }

    /// Replace the exponent of a normal number.
    pub fn with_exponent(&self, exponent: i64) -> Self {
        assert!(self.is_normal(), "Expected a normal number");
        Self::new(self.format, self.sign, exponent, self.significand.clone())
    }

    /// Multiply the number by 2^n, rounding if the result leaves the
    /// normal range.
    pub fn scalb(&self, n: i64) -> Self {
        if !self.is_finite() || self.is_zero() {
            return self.clone();
        }
        let (sig, lsb) = self.exact_parts();
        Self::round_scaled(
            self.format,
            self.sign,
            sig,
            lsb + n,
            RoundingMode::NearestTiesToEven,
        )
    }

    /// Returns the smallest number of the format that is greater than self.
    pub fn next_up(&self) -> Self {
        let format = self.format;
        if self.is_nan() || (self.is_infinite() && !self.sign) {
            return self.clone();
        }
        if self.is_infinite() {
            return Self::max_value(format, true);
        }
        if self.is_zero() {
            return Self::min_subnormal(format);
        }
        // Nudge the value by less than an ulp and let the directed rounding
        // pick the neighbor.
        let (sig, lsb) = self.exact_parts();
        let sig = sig << 3u32;
        let sig = if self.sign { sig - 1u32 } else { sig + 1u32 };
        Self::round_scaled(format, self.sign, sig, lsb - 3, RoundingMode::Ceiling)
    }

    /// Returns the largest number of the format that is less than self.
    pub fn next_down(&self) -> Self {
        self.negate().next_up().negate()
    }

    /// Returns the part of the number that does not depend on the last
    /// ambiguous digits: the trailing run of equal bits and the opposite bit
    /// in front of it (a tail of the form 10...0 or 01...1) are cleared.
    pub fn valid_part(&self) -> Self {
        if !self.is_finite() || self.is_zero() {
            return self.clone();
        }
        let sig = &self.significand;
        let len = sig.bits();
        let run = if sig.bit(0) {
            (sig + 1u32).trailing_zeros().unwrap_or(len)
        } else {
            sig.trailing_zeros().unwrap_or(len)
        };
        let strip = (run + 1).min(len);
        if strip >= len {
            return Self::signed_zero(self.format, self.sign);
        }
        let kept = (sig >> strip) << strip;
        Self::new(self.format, self.sign, self.exponent, kept)
    }

    /// Compare the magnitudes of two numbers of the same format. The IEEE
    /// encoding makes (exponent, significand) monotone in the magnitude.
    fn magnitude_cmp(&self, other: &Self) -> Ordering {
        debug_assert!(self.format == other.format);
        self.exponent
            .cmp(&other.exponent)
            .then_with(|| self.significand.cmp(&other.significand))
    }

    /// Compare two numbers with IEEE semantics. Returns None if one of them
    /// is NaN.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.is_nan() || other.is_nan() {
            return None;
        }
        let format = self.format.sup(&other.format);
        let a = self.widen(format);
        let b = other.widen(format);
        if a.is_zero() && b.is_zero() {
            return Some(Ordering::Equal);
        }
        if a.sign != b.sign {
            return Some(if a.sign {
                Ordering::Less
            } else {
                Ordering::Greater
            });
        }
        let ord = a.magnitude_cmp(&b);
        Some(if a.sign { ord.reverse() } else { ord })
    }

    pub fn equal_to(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
    pub fn not_equal_to(&self, other: &Self) -> bool {
        !self.equal_to(other)
    }
    pub fn greater_than(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Greater)
    }
    pub fn greater_or_equal(&self, other: &Self) -> bool {
        matches!(
            self.compare(other),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }
    pub fn less_than(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Less)
    }
    pub fn less_or_equal(&self, other: &Self) -> bool {
        matches!(self.compare(other), Some(Ordering::Less | Ordering::Equal))
    }

    /// Returns true if both numbers have the same format and bit pattern.
    pub fn is_identical(&self, other: &Self) -> bool {
        self.format == other.format
            && self.sign == other.sign
            && self.exponent == other.exponent
            && self.significand == other.significand
    }
}

impl PartialEq for FloatValue {
    fn eq(&self, other: &Self) -> bool {
        self.equal_to(other)
    }
}

impl PartialOrd for FloatValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

#[test]
fn test_format_ranges() {
    assert_eq!(Format::FLOAT32.bias(), 127);
    assert_eq!(Format::FLOAT32.min_exp(), -126);
    assert_eq!(Format::FLOAT32.max_exp(), 127);
    assert_eq!(Format::FLOAT64.bias(), 1023);
    assert_eq!(Format::FLOAT64.min_exp(), -1022);
    assert_eq!(Format::FLOAT64.max_exp(), 1023);
    assert_eq!(Format::FLOAT16.max_exp(), 15);
    assert_eq!(Format::FLOAT8.min_exp(), -6);
    assert_eq!(Format::FLOAT64.precision(), 53);

    let a = Format::new(8, 52);
    let b = Format::new(11, 23);
    assert_eq!(a.sup(&b), Format::FLOAT64);
    assert_eq!(b.sup(&a), Format::FLOAT64);
    assert!(Format::FLOAT64.intermediate_precision().sig_bits() > 2 * 52 + 2);

    // The subnormals of the widest user format are normal in the working
    // formats, and so are the squares of its extreme values.
    let widest = Format::new(MAX_EXP_BITS, 10);
    for work in [widest.extended(4), widest.intermediate_precision()] {
        assert!(work.min_exp() < 2 * (widest.min_exp() - 10));
        assert!(work.max_exp() > 2 * (widest.max_exp() + 1));
    }
    assert!(FloatValue::min_subnormal(widest)
        .with_precision(widest.with_unlimited_exponent())
        .is_normal());
    assert_eq!(Format::FLOAT32.to_string(), "Format(8, 23)");
}

#[test]
#[should_panic]
fn test_format_exponent_too_wide() {
    let _ = Format::new(26, 10);
}

#[test]
fn test_truncate() {
    let v = BigUint::from(0b1011_0000u32);
    assert_eq!(truncate(&v, 4), BigUint::from(0b1011u32));
    assert_eq!(truncate(&v, 5), BigUint::from(0b101u32));
    assert_eq!(truncate(&v, 6), BigUint::from(0b11u32));
    assert_eq!(truncate(&v, 100), BigUint::one());
    assert_eq!(truncate(&BigUint::zero(), 100), BigUint::zero());
    assert_eq!(truncate(&v, 0), v);
}

#[test]
fn test_apply_rounding() {
    use RoundingMode::*;
    let check = |v: u32, sign: bool, rm: RoundingMode| -> u32 {
        apply_rounding(&BigUint::from(v), sign, rm).to_u32().unwrap()
    };
    // 2.5 and 3.5 in units of the last kept bit.
    assert_eq!(check(0b10_100, false, NearestTiesToEven), 2);
    assert_eq!(check(0b11_100, false, NearestTiesToEven), 4);
    assert_eq!(check(0b10_100, false, NearestTiesToAway), 3);
    assert_eq!(check(0b10_011, false, NearestTiesToAway), 2);
    assert_eq!(check(0b10_101, false, NearestTiesToEven), 3);
    assert_eq!(check(0b10_001, false, Ceiling), 3);
    assert_eq!(check(0b10_001, true, Ceiling), 2);
    assert_eq!(check(0b10_001, true, Floor), 3);
    assert_eq!(check(0b10_111, true, Truncate), 2);
    assert_eq!(check(0b10_000, false, Ceiling), 2);
}

#[test]
fn test_constructors() {
    let f = Format::FLOAT32;
    assert!(FloatValue::zero(f).is_zero());
    assert!(!FloatValue::zero(f).is_negative());
    assert!(FloatValue::negative_zero(f).is_negative());
    assert!(FloatValue::one(f).is_one());
    assert!(!FloatValue::negative_one(f).is_one());
    assert!(FloatValue::negative_one(f).is_negative_one());
    assert!(FloatValue::nan(f).is_nan());
    assert!(!FloatValue::nan(f).is_negative());
    assert!(FloatValue::infinity(f).is_infinite());
    assert!(FloatValue::negative_infinity(f).is_negative());
    assert!(FloatValue::min_subnormal(f).is_subnormal());
    assert!(FloatValue::min_normal(f).is_normal());
    assert!(FloatValue::max_value(f, false).is_finite());
}

#[test]
#[should_panic]
fn test_invalid_normal_significand() {
    let _ = FloatValue::new(Format::FLOAT32, false, 3, BigUint::from(5u32));
}

#[test]
fn test_with_precision_roundtrip() {
    let f = Format::FLOAT32;
    let wide = Format::FLOAT64;
    let values = [
        FloatValue::one(f),
        FloatValue::min_subnormal(f),
        FloatValue::min_normal(f).negate(),
        FloatValue::max_value(f, true),
    ];
    for v in values {
        let w = v.with_precision(wide);
        assert!(w.is_normal());
        assert!(w.with_precision(f).is_identical(&v));
    }

    // Values out of range overflow and underflow.
    let big = FloatValue::max_value(wide, false);
    assert!(big.with_precision(f).is_infinite());
    let tiny = FloatValue::min_normal(wide).negate();
    let r = tiny.with_precision(f);
    assert!(r.is_zero() && r.is_negative());
    let r = big.round_with_mode(f, RoundingMode::Truncate);
    assert!(r.is_identical(&FloatValue::max_value(f, false)));
}

#[test]
fn test_with_precision_ties() {
    // 1 + 2^-24 is a tie in FLOAT32, and rounds to the even neighbor.
    let wide = Format::FLOAT64;
    let sig = (BigUint::one() << 24u32) + 1u32;
    let v = FloatValue::round_scaled(
        wide,
        false,
        sig,
        -24,
        RoundingMode::NearestTiesToEven,
    );
    assert!(v.with_precision(Format::FLOAT32).is_one());
    let up = v.round_with_mode(Format::FLOAT32, RoundingMode::NearestTiesToAway);
    assert!(up.greater_than(&FloatValue::one(Format::FLOAT32)));
}

#[test]
fn test_next_up_down() {
    let f = Format::FLOAT32;
    let one = FloatValue::one(f);
    let up = one.next_up();
    assert!(up.greater_than(&one));
    assert!(up.next_down().is_identical(&one));
    let down = one.next_down();
    assert!(down.less_than(&one));
    assert!(down.next_up().is_identical(&one));
    // Below one the ulp is half as large.
    assert_eq!(down.exponent(), -1);

    assert!(FloatValue::zero(f)
        .next_up()
        .is_identical(&FloatValue::min_subnormal(f)));
    assert!(FloatValue::zero(f)
        .next_down()
        .is_identical(&FloatValue::min_subnormal(f).negate()));
    assert!(FloatValue::max_value(f, false).next_up().is_infinite());
    assert!(FloatValue::negative_infinity(f)
        .next_up()
        .is_identical(&FloatValue::max_value(f, true)));
    assert!(FloatValue::min_normal(f).next_down().is_subnormal());
}

#[test]
fn test_valid_part() {
    let f = Format::new(8, 7);
    let make = |sig: u32| FloatValue::new(f, false, 0, BigUint::from(sig));
    // 1011_0111: the tail 0111 is ambiguous.
    let v = make(0b1011_0111).valid_part();
    assert_eq!(v.significand(), &BigUint::from(0b1011_0000u32));
    // 1011_1000: the tail 1000 is ambiguous.
    let v = make(0b1011_1000).valid_part();
    assert_eq!(v.significand(), &BigUint::from(0b1011_0000u32));
    let v = make(0b1000_0000).valid_part();
    assert!(v.is_zero());
}

#[test]
fn test_comparisons() {
    let f = Format::FLOAT32;
    let one = FloatValue::one(f);
    let neg = FloatValue::negative_one(f);
    let nan = FloatValue::nan(f);
    let zero = FloatValue::zero(f);
    let nzero = FloatValue::negative_zero(f);

    assert!(neg < one);
    assert!(one > zero);
    assert!(zero == nzero);
    assert!(!zero.is_identical(&nzero));
    assert!(nan != nan);
    assert!(!nan.equal_to(&nan));
    assert!(nan.not_equal_to(&one));
    assert!(!(nan < one) && !(nan > one));
    assert!(FloatValue::negative_infinity(f) < neg);
    assert!(FloatValue::min_subnormal(f) > zero);
    assert!(FloatValue::min_subnormal(f).negate() < nzero);
    assert!(one.greater_or_equal(&one) && one.less_or_equal(&one));

    // Mixed formats compare by value.
    let wide_one = FloatValue::one(Format::FLOAT64);
    assert!(wide_one == one);
    assert!(!wide_one.is_identical(&one));
}
