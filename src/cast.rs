//! Conversions between floats, integers and the native f32/f64 types.

use super::float::{truncate, apply_rounding, FloatValue, Format, RoundingMode, GRS_BITS};
use super::utils::mask;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};

impl FloatValue {
    /// Load the integer `value` into the format. The number may be rounded
    /// to the nearest even number, or overflow to infinity.
    pub fn from_integer(format: Format, value: &BigInt) -> Self {
        Self::round_scaled(
            format,
            value.sign() == Sign::Minus,
            value.magnitude().clone(),
            0,
            RoundingMode::NearestTiesToEven,
        )
    }

    pub fn from_i64(format: Format, value: i64) -> Self {
        Self::from_integer(format, &BigInt::from(value))
    }

    pub fn from_u64(format: Format, value: u64) -> Self {
        Self::from_integer(format, &BigInt::from(value))
    }

    /// Returns the number rounded to an integral value with the rounding
    /// mode `mode`. NaN, infinity and zero are returned unchanged.
    pub fn round_to_integer(&self, mode: RoundingMode) -> Self {
        if !self.is_finite() || self.is_zero() {
            return self.clone();
        }
        let (sig, lsb) = self.exact_parts();
        if lsb >= 0 {
            return self.clone();
        }
        // Keep three GRS bits below the unit position.
        let extended = truncate(&(sig << (GRS_BITS as u64)), lsb.unsigned_abs());
        let integer = apply_rounding(&extended, self.sign(), mode);
        Self::round_scaled(
            self.format(),
            self.sign(),
            integer,
            0,
            RoundingMode::NearestTiesToEven,
        )
    }

    /// Returns true if the number is finite and has no fractional part.
    pub fn is_integer(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        if self.is_zero() {
            return true;
        }
        let (sig, lsb) = self.exact_parts();
        lsb >= 0 || sig.trailing_zeros().unwrap_or(0) >= lsb.unsigned_abs()
    }

    /// Returns true if the number is an odd integer.
    pub(crate) fn is_odd_integer(&self) -> bool {
        if !self.is_integer() || self.is_zero() {
            return false;
        }
        let (sig, lsb) = self.exact_parts();
        match lsb {
            0 => sig.bit(0),
            l if l > 0 => false,
            l => sig.bit(l.unsigned_abs()),
        }
    }

    /// Returns the integral part of the number, truncated toward zero, if
    /// its magnitude fits in `max_bits` bits.
    fn truncated_integer(&self, max_bits: i64) -> Option<BigInt> {
        if !self.is_finite() {
            return None;
        }
        let t = self.round_to_integer(RoundingMode::Truncate);
        if t.is_zero() {
            return Some(BigInt::zero());
        }
        let (sig, lsb) = t.exact_parts();
        if lsb + sig.bits() as i64 > max_bits {
            return None;
        }
        let magnitude: BigUint = if lsb >= 0 {
            sig << (lsb as u64)
        } else {
            sig >> lsb.unsigned_abs()
        };
        let sign = if t.sign() { Sign::Minus } else { Sign::Plus };
        Some(BigInt::from_biguint(sign, magnitude))
    }

    /// Returns the number truncated toward zero, or None for NaN and
    /// infinity.
    pub fn to_integer(&self) -> Option<BigInt> {
        self.truncated_integer(i64::MAX)
    }

    /// Converts the number to an i64, truncating toward zero. NaN, infinity
    /// and values out of range return the indefinite value i64::MIN, which is
    /// what the x86 conversion instructions produce.
    pub fn long_value(&self) -> i64 {
        self.truncated_integer(64)
            .and_then(|v| v.to_i64())
            .unwrap_or(i64::MIN)
    }

    /// Converts the number to an i32, truncating toward zero. NaN, infinity
    /// and values out of range return the indefinite value i32::MIN.
    pub fn int_value(&self) -> i32 {
        self.truncated_integer(32)
            .and_then(|v| v.to_i32())
            .unwrap_or(i32::MIN)
    }

    /// Converts through int_value and keeps the low 16 bits, like the x86
    /// `cvttss2si` instruction followed by a narrowing cast. Values out of
    /// the i16 range wrap around, and NaN and infinity give 0 (the low bits
    /// of the indefinite value i32::MIN).
    pub fn short_value(&self) -> i16 {
        self.int_value() as i16
    }

    /// Converts through int_value and keeps the low 8 bits, with the same
    /// wrapping as short_value: 300.0 gives 44, NaN gives 0.
    pub fn byte_value(&self) -> i8 {
        self.int_value() as i8
    }

    /// Decode the IEEE bit pattern `bits` of a float of `format`. The format
    /// must fit in 64 bits.
    pub fn from_bits(format: Format, bits: u64) -> Self {
        let exp_bits = format.exp_bits() as usize;
        let sig_bits = format.sig_bits() as usize;
        assert!(1 + exp_bits + sig_bits <= 64, "Format does not fit in 64 bits");

        // Extract the biased exponent (wipe the sign and mantissa).
        let biased_exp = ((bits >> sig_bits) & mask(exp_bits)) as i64;
        let sign = (bits >> (exp_bits + sig_bits)) & 1 == 1;
        let mantissa = BigUint::from(bits & mask(sig_bits));

        if biased_exp == mask(exp_bits) as i64 {
            if mantissa.is_zero() {
                return Self::signed_infinity(format, sign);
            }
            return Self::new(format, sign, format.max_exp() + 1, mantissa);
        }
        if biased_exp == 0 {
            return Self::new(format, sign, format.min_exp() - 1, mantissa);
        }
        // Add the implicit bit.
        let significand = mantissa | (BigUint::from(1u32) << sig_bits);
        Self::new(format, sign, biased_exp - format.bias(), significand)
    }

    /// Encode the number as the IEEE bit pattern of its format. The format
    /// must fit in 64 bits.
    pub fn to_bits(&self) -> u64 {
        let format = self.format();
        let exp_bits = format.exp_bits() as usize;
        let sig_bits = format.sig_bits() as usize;
        assert!(1 + exp_bits + sig_bits <= 64, "Format does not fit in 64 bits");

        // Both special exponents land on the right biased value: zero for
        // subnormals and all ones for infinity and NaN.
        let biased_exp = (self.exponent() + format.bias()) as u64;
        // Wipe the hidden bit.
        let mantissa = self.significand().to_u64().unwrap_or(0) & mask(sig_bits);
        let sign = u64::from(self.sign());
        (sign << (exp_bits + sig_bits)) | (biased_exp << sig_bits) | mantissa
    }

    pub fn from_f32(float: f32) -> Self {
        Self::from_bits(Format::FLOAT32, u64::from(float.to_bits()))
    }

    pub fn from_f64(float: f64) -> Self {
        Self::from_bits(Format::FLOAT64, float.to_bits())
    }

    /// Round the number to FLOAT32 and return it as a native f32.
    pub fn f32_value(&self) -> f32 {
        f32::from_bits(self.with_precision(Format::FLOAT32).to_bits() as u32)
    }

    /// Round the number to FLOAT64 and return it as a native f64.
    pub fn f64_value(&self) -> f64 {
        f64::from_bits(self.with_precision(Format::FLOAT64).to_bits())
    }

    /// Returns the fields of the number as binary digits: the sign, the
    /// biased exponent and the stored significand bits, separated by spaces.
    pub fn to_binary_string(&self) -> String {
        let format = self.format();
        let sign = if self.sign() { "1" } else { "0" };
        let biased_exp = BigUint::from((self.exponent() + format.bias()) as u64);
        let hidden = BigUint::from(1u32) << format.sig_bits();
        let mantissa = if self.is_normal() {
            self.significand() - &hidden
        } else {
            self.significand().clone()
        };
        let digits = |v: &BigUint, width: u32| {
            if width == 0 {
                return String::new();
            }
            format!("{:0>width$}", v.to_str_radix(2), width = width as usize)
        };
        format!(
            "{} {} {}",
            sign,
            digits(&biased_exp, format.exp_bits()),
            digits(&mantissa, format.sig_bits())
        )
    }
}

#[test]
fn test_rounding_to_integer() {
    use RoundingMode::*;
    let f = Format::FLOAT64;
    let check = |v: f64, rm: RoundingMode| -> f64 {
        FloatValue::from_f64(v).round_to_integer(rm).f64_value()
    };
    assert_eq!(check(2.5, NearestTiesToEven), 2.);
    assert_eq!(check(3.5, NearestTiesToEven), 4.);
    assert_eq!(check(2.5, NearestTiesToAway), 3.);
    assert_eq!(check(-2.5, NearestTiesToAway), -3.);
    assert_eq!(check(2.1, Ceiling), 3.);
    assert_eq!(check(-2.1, Ceiling), -2.);
    assert_eq!(check(2.9, Floor), 2.);
    assert_eq!(check(-2.1, Floor), -3.);
    assert_eq!(check(-2.9, Truncate), -2.);
    assert_eq!(check(0.3, Ceiling), 1.);
    assert_eq!(check(1e300, Floor), 1e300);

    let r = FloatValue::from_f64(-0.3).round_to_integer(Truncate);
    assert!(r.is_zero() && r.is_negative());
    let r = FloatValue::min_subnormal(f).round_to_integer(Ceiling);
    assert!(r.is_one());

    let values = crate::utils::get_special_test_values();
    for v in values {
        let r = FloatValue::from_f64(v).round_to_integer(Truncate).f64_value();
        assert!(v.is_nan() || r.to_bits() == v.trunc().to_bits());
        let r = FloatValue::from_f64(v).round_to_integer(Floor).f64_value();
        assert!(v.is_nan() || r.to_bits() == v.floor().to_bits());
    }
}

#[test]
fn test_is_integer() {
    assert!(FloatValue::from_f64(3.).is_integer());
    assert!(FloatValue::from_f64(-0.).is_integer());
    assert!(FloatValue::from_f64(1e300).is_integer());
    assert!(!FloatValue::from_f64(3.5).is_integer());
    assert!(!FloatValue::from_f64(f64::MIN_POSITIVE).is_integer());
    assert!(!FloatValue::from_f64(f64::INFINITY).is_integer());
    assert!(!FloatValue::from_f64(f64::NAN).is_integer());

    assert!(FloatValue::from_f64(3.).is_odd_integer());
    assert!(FloatValue::from_f64(-7.).is_odd_integer());
    assert!(!FloatValue::from_f64(4.).is_odd_integer());
    assert!(!FloatValue::from_f64(1e300).is_odd_integer());
    assert!(!FloatValue::from_f64(0.5).is_odd_integer());
}

#[test]
fn test_integer_values() {
    let f = Format::FLOAT64;
    let big = BigInt::from(1u64 << 62) * BigInt::from(1000);
    let v = FloatValue::from_integer(f, &big);
    assert_eq!(v.to_integer(), Some(big));
    assert_eq!(v.long_value(), i64::MIN);

    assert_eq!(FloatValue::from_f64(-7.9).to_integer(), Some(BigInt::from(-7)));
    assert_eq!(FloatValue::from_f64(f64::NAN).to_integer(), None);
    assert_eq!(FloatValue::from_f64(-7.9).long_value(), -7);
    assert_eq!(FloatValue::from_f64(-7.9).int_value(), -7);
    assert_eq!(FloatValue::from_f64(9.2e18).long_value(), 9_200_000_000_000_000_000);
    assert_eq!(FloatValue::from_f64(-9.223372036854775808e18).long_value(), i64::MIN);
    assert_eq!(FloatValue::from_f64(f64::NAN).long_value(), i64::MIN);
    assert_eq!(FloatValue::from_f64(f64::INFINITY).int_value(), i32::MIN);
    assert_eq!(FloatValue::from_f64(3e9).int_value(), i32::MIN);
    assert_eq!(FloatValue::from_f64(-2147483648.).int_value(), i32::MIN);
    assert_eq!(FloatValue::from_f64(2147483647.).int_value(), i32::MAX);
    assert_eq!(FloatValue::from_f64(300.).byte_value(), 300i32 as i8);
    assert_eq!(FloatValue::from_f64(-70000.).short_value(), -70000i32 as i16);
    assert_eq!(FloatValue::from_f64(f64::NAN).byte_value(), 0);
    assert_eq!(FloatValue::from_f64(300.).byte_value(), 44);
    assert_eq!(FloatValue::from_f64(f64::NAN).short_value(), 0);
    assert_eq!(FloatValue::from_f64(f64::NEG_INFINITY).short_value(), 0);
    assert_eq!(FloatValue::from_f64(40000.).short_value(), -25536);
    assert_eq!(FloatValue::from_f64(0.99).int_value(), 0);

    for i in -100..100 {
        assert_eq!(FloatValue::from_i64(f, i).long_value(), i);
    }
    // 2^53 + 1 rounds to an even neighbor.
    let v = FloatValue::from_i64(f, (1 << 53) + 1);
    assert_eq!(v.long_value(), 1 << 53);
    let v = FloatValue::from_u64(Format::FLOAT16, 70000);
    assert!(v.is_infinite());
}

#[test]
fn test_cast_zero_nan_inf() {
    let nan = f64::NAN;
    let inf = f64::INFINITY;
    let zero = 0.0;

    assert!(FloatValue::from_f64(nan).is_nan());
    assert!(FloatValue::from_f64(nan).f32_value().is_nan());
    assert!(FloatValue::from_f64(inf).is_infinite());
    assert!(!FloatValue::from_f64(inf).is_negative());
    assert!(FloatValue::from_f64(-inf).is_negative());
    assert!(FloatValue::from_f64(zero).is_zero());
    assert!(FloatValue::from_f64(-zero).is_negative());
    assert_eq!(FloatValue::from_f64(-zero).f32_value().to_bits(), (-0f32).to_bits());
    assert!(FloatValue::from_f64(1e-300).f32_value() == 0.);
    assert!(FloatValue::from_f64(1e300).f32_value().is_infinite());
}

#[test]
fn test_round_trip_native_float_cast() {
    use crate::utils::Lfsr;

    let mut lfsr = Lfsr::new();
    for _ in 0..5000 {
        let f = f64::from_bits(lfsr.get64());
        if f.is_nan() {
            continue;
        }
        assert_eq!(FloatValue::from_f64(f).f64_value().to_bits(), f.to_bits());
        // Narrowing matches the host conversion.
        assert_eq!(
            FloatValue::from_f64(f).f32_value().to_bits(),
            (f as f32).to_bits()
        );
    }
    for _ in 0..5000 {
        let f = f32::from_bits(lfsr.get());
        if f.is_nan() {
            continue;
        }
        assert_eq!(FloatValue::from_f32(f).f32_value().to_bits(), f.to_bits());
        assert_eq!(
            FloatValue::from_f32(f).f64_value().to_bits(),
            f64::from(f).to_bits()
        );
    }
}

#[test]
fn test_binary_string() {
    let one = FloatValue::one(Format::FLOAT16);
    assert_eq!(one.to_binary_string(), "0 01111 0000000000");
    let v = FloatValue::from_f32(-0.75);
    assert_eq!(
        v.to_binary_string(),
        "1 01111110 10000000000000000000000"
    );
    let v = FloatValue::min_subnormal(Format::FLOAT8);
    assert_eq!(v.to_binary_string(), "0 0000 001");
    let v = FloatValue::infinity(Format::FLOAT8);
    assert_eq!(v.to_binary_string(), "0 1111 000");
}

#[test]
fn test_bits_other_formats() {
    // The largest FLOAT16 number.
    let v = FloatValue::from_bits(Format::FLOAT16, 0x7bff);
    assert_eq!(v.f64_value(), 65504.);
    assert_eq!(v.to_bits(), 0x7bff);
    let v = FloatValue::from_f64(1.5).with_precision(Format::FLOAT8);
    assert_eq!(v.to_bits(), 0b0_0111_100);
}
