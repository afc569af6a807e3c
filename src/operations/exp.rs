//! This module contains the implementation of log- and exp-related methods.

use super::constants::ConstantsRegistry;
use super::ziv::correctly_rounded;
use crate::error::FloatError;
use crate::float::{FloatValue, Format};

/// Extra bits that the series evaluators get on top of the working precision,
/// to absorb the rounding errors of the individual terms.
pub(crate) const GUARD_BITS: u32 = 16;

/// Returns a bound T such that exp(x) overflows `format` for every x > T and
/// underflows it for every x < -T.
pub(crate) fn exp_limit(format: Format) -> FloatValue {
    let t = (1u64 << format.exp_bits()) + u64::from(format.sig_bits()) + 2;
    FloatValue::from_u64(Format::working(64), t)
}

/// Returns true if |x| < 2^-(precision + shift) for the precision of
/// `format`.
pub(crate) fn is_tiny(x: &FloatValue, format: Format, shift: u32) -> bool {
    x.is_zero() || x.leading_exponent() < -i64::from(format.precision() + shift)
}

impl FloatValue {
    /// Computes e^x with the Taylor series, at the precision of x.
    /// Uses the identity exp(a * 2^k) = exp(a)^(2^k) to keep the argument of
    /// the series small.
    pub(crate) fn exp_series(&self, registry: &ConstantsRegistry) -> Self {
        let format = self.format();
        let one = Self::one(format);
        if self.is_zero() {
            return one;
        }
        let squarings = self.exponent().max(0);
        let reduced = if squarings > 0 {
            self.with_exponent(0)
        } else {
            self.clone()
        };

        let mut sum = one.clone();
        let mut power = one;
        for k in 1.. {
            power = power.multiply(&reduced);
            let term = power.multiply(&registry.inverse_factorial(format, k));
            let next = sum.add(&term);
            if next.is_identical(&sum) {
                break;
            }
            sum = next;
        }

        for _ in 0..squarings {
            sum = sum.multiply(&sum);
        }
        sum
    }

    /// Computes e^x - 1 with the Taylor series (without its first term), at
    /// the precision of x. Only accurate for small x.
    pub(crate) fn exp_m1_series(&self, registry: &ConstantsRegistry) -> Self {
        let format = self.format();
        if self.is_zero() {
            return self.clone();
        }
        let mut sum = Self::zero(format);
        let mut power = Self::one(format);
        for k in 1.. {
            power = power.multiply(self);
            let term = power.multiply(&registry.inverse_factorial(format, k));
            let next = sum.add(&term);
            if next.is_identical(&sum) {
                break;
            }
            sum = next;
        }
        sum
    }

    /// Computes ln(1 + x) with the alternating series
    /// x - x^2/2 + x^3/3 - ..., at the precision of x. Requires |x| < 1.
    pub(crate) fn ln1p_series(&self, registry: &ConstantsRegistry) -> Self {
        let format = self.format();
        if self.is_zero() {
            return self.clone();
        }
        let mut sum = Self::zero(format);
        let mut power = Self::one(format);
        for k in 1.. {
            power = power.multiply(self);
            let term = power.multiply(&registry.inverse(format, k));
            let next = if k % 2 == 1 {
                sum.add(&term)
            } else {
                sum.subtract(&term)
            };
            if next.is_identical(&sum) {
                break;
            }
            sum = next;
        }
        sum
    }

    /// Computes the natural logarithm of a positive normal number, at its
    /// precision. The number is reduced to x = a * 2^k, with a in
    /// [0.70, 1.41], and ln(x) = ln(a) + k * ln(2).
    pub(crate) fn ln_series(&self, registry: &ConstantsRegistry) -> Self {
        let format = self.format();
        let one = Self::one(format);
        let mut k = self.exponent();
        let mut a = self.with_exponent(0);
        // 1.4140625 is a little below sqrt(2).
        let bound = Self::from_i64(format, 181).scalb(-7);
        if a.greater_than(&bound) {
            a = a.with_exponent(-1);
            k += 1;
        }
        // Exact, by Sterbenz lemma.
        let y = a.subtract(&one);
        let mut sum = y.ln1p_series(registry);
        if k != 0 {
            let kln2 = registry.ln2(format).multiply(&Self::from_i64(format, k));
            sum = sum.add(&kln2);
        }
        sum
    }

    /// Returns e^x, correctly rounded, using the shared constants registry.
    pub fn exp(&self) -> Result<Self, FloatError> {
        self.exp_with(ConstantsRegistry::shared())
    }

    /// Returns e^x, correctly rounded.
    pub fn exp_with(&self, registry: &ConstantsRegistry) -> Result<Self, FloatError> {
        let format = self.format();
        if self.is_nan() {
            return Ok(Self::nan(format));
        }
        if self.is_infinite() {
            return Ok(if self.is_negative() {
                Self::zero(format)
            } else {
                Self::infinity(format)
            });
        }
        if self.is_zero() {
            return Ok(Self::one(format));
        }

        // Results that are certainly out of range.
        if self.abs().greater_than(&exp_limit(format)) {
            return Ok(if self.is_negative() {
                Self::zero(format)
            } else {
                Self::infinity(format)
            });
        }

        // e^x = 1 + x + ..., and for tiny x the rest is far below half an ulp
        // of one.
        if is_tiny(self, format, 4) {
            let wide = format.extended(GUARD_BITS);
            let e = self.with_precision(wide).exp_m1_series(registry);
            return Ok(Self::one(wide).add(&e).with_precision(format));
        }

        // The squarings of the range reduction lose about one bit each.
        let squarings = self.leading_exponent().max(0) as u32;
        let guard = GUARD_BITS + squarings + 4;
        correctly_rounded("exp", self, format, guard, registry, |x| {
            x.exp_series(registry)
        })
    }

    /// Returns ln(x), correctly rounded, using the shared constants registry.
    pub fn ln(&self) -> Result<Self, FloatError> {
        self.ln_with(ConstantsRegistry::shared())
    }

    /// Returns ln(x), correctly rounded.
    pub fn ln_with(&self, registry: &ConstantsRegistry) -> Result<Self, FloatError> {
        let format = self.format();
        if self.is_nan() {
            return Ok(Self::nan(format));
        }
        if self.is_zero() {
            return Ok(Self::negative_infinity(format));
        }
        if self.is_negative() {
            return Ok(Self::nan(format));
        }
        if self.is_infinite() {
            return Ok(Self::infinity(format));
        }
        if self.is_one() {
            return Ok(Self::zero(format));
        }

        // k * ln(2) may cancel with ln(a).
        let guard = GUARD_BITS + format.exp_bits() + 2;
        correctly_rounded("ln", self, format, guard, registry, |x| {
            x.ln_series(registry)
        })
    }
}

/// Returns the distance between two f64 numbers, in ulps.
#[cfg(test)]
pub(crate) fn ulp_distance(a: f64, b: f64) -> u64 {
    if a == b {
        return 0;
    }
    let key = |v: f64| {
        let bits = v.to_bits() as i64;
        if bits < 0 {
            i64::MIN - bits
        } else {
            bits
        }
    };
    key(a).abs_diff(key(b))
}

#[test]
fn test_exp_special_values() {
    let f = Format::FLOAT32;
    assert!(FloatValue::nan(f).exp().unwrap().is_nan());
    assert!(FloatValue::infinity(f).exp().unwrap().is_infinite());
    let r = FloatValue::negative_infinity(f).exp().unwrap();
    assert!(r.is_zero() && !r.is_negative());
    assert!(FloatValue::zero(f).exp().unwrap().is_one());
    assert!(FloatValue::negative_zero(f).exp().unwrap().is_one());
    assert!(FloatValue::from_f32(200.).exp().unwrap().is_infinite());
    assert!(FloatValue::from_f32(-200.).exp().unwrap().is_zero());
    assert!(FloatValue::from_f32(1e-30).exp().unwrap().is_one());
    let r = FloatValue::from_f32(-1e-30).exp().unwrap();
    assert_eq!(r.f32_value(), 1.);
}

#[test]
fn test_exp_values() {
    use crate::utils::Lfsr;

    assert_eq!(
        FloatValue::from_f64(1.).exp().unwrap().f64_value(),
        core::f64::consts::E
    );
    for v in [0.5, -0.5, 2., 10., -10., 100., 700., -700., -740., 1e-5] {
        let ours = FloatValue::from_f64(v).exp().unwrap().f64_value();
        assert!(ulp_distance(ours, v.exp()) <= 1, "exp({})", v);
    }

    let mut lfsr = Lfsr::new();
    for _ in 0..200 {
        let v = (lfsr.get() as f64 / u32::MAX as f64 - 0.5) * 100.;
        let ours = FloatValue::from_f64(v).exp().unwrap().f64_value();
        assert!(ulp_distance(ours, v.exp()) <= 1, "exp({})", v);

        // The f64 result of the host is accurate enough to check FLOAT32
        // results exactly, except next to a rounding boundary.
        let v = v as f32;
        let ours = FloatValue::from_f32(v).exp().unwrap().f32_value();
        let host = (v as f64).exp() as f32;
        assert!(ours.to_bits().abs_diff(host.to_bits()) <= 1, "exp({})", v);
    }
}

#[test]
fn test_ln_special_values() {
    let f = Format::FLOAT32;
    let one = FloatValue::from_string(f, "1.0").unwrap();
    assert!(one.ln().unwrap().is_zero());
    assert!(!one.ln().unwrap().is_negative());
    assert!(FloatValue::nan(f).ln().unwrap().is_nan());
    assert!(FloatValue::negative_one(f).ln().unwrap().is_nan());
    assert!(FloatValue::negative_infinity(f).ln().unwrap().is_nan());
    let r = FloatValue::zero(f).ln().unwrap();
    assert!(r.is_infinite() && r.is_negative());
    let r = FloatValue::negative_zero(f).ln().unwrap();
    assert!(r.is_infinite() && r.is_negative());
    assert!(FloatValue::infinity(f).ln().unwrap().is_infinite());
}

#[test]
fn test_ln_values() {
    use crate::utils::Lfsr;

    assert_eq!(
        FloatValue::from_f64(2.).ln().unwrap().f64_value(),
        core::f64::consts::LN_2
    );
    assert_eq!(
        FloatValue::from_f64(10.).ln().unwrap().f64_value(),
        core::f64::consts::LN_10
    );
    for v in [0.5, 1.5, 3., 1e-300, 1e300, 5e-324, f64::MAX, 1. + 1e-15, 1. - 1e-15] {
        let ours = FloatValue::from_f64(v).ln().unwrap().f64_value();
        assert!(ulp_distance(ours, v.ln()) <= 1, "ln({})", v);
    }

    let mut lfsr = Lfsr::new();
    for _ in 0..200 {
        let v = f64::from_bits(lfsr.get64() & 0x7fff_ffff_ffff_ffff);
        if !v.is_finite() || v == 0. {
            continue;
        }
        let ours = FloatValue::from_f64(v).ln().unwrap().f64_value();
        assert!(ulp_distance(ours, v.ln()) <= 1, "ln({})", v);
    }
}

#[test]
fn test_exp_ln_wide_formats() {
    let f = Format::FLOAT128;
    let two = FloatValue::from_i64(f, 2);
    let ln2 = two.ln().unwrap();
    assert_eq!(ln2.f64_value(), core::f64::consts::LN_2);
    // exp(ln(2)) is within an ulp of 2.
    let back = ln2.exp().unwrap();
    assert!(
        back.equal_to(&two) || back.next_up().equal_to(&two) || back.next_down().equal_to(&two)
    );

    let x = FloatValue::from_string(Format::FLOAT16, "0.75").unwrap();
    let r = x.exp().unwrap();
    assert_eq!(r.f64_value(), 2.1171875);
}

#[test]
fn test_exp_ln_wide_exponent() {
    let f = Format::new(25, 10);
    let tiny = FloatValue::min_subnormal(f);
    // ln(2^-16777224) = -11629085.51..., and the ulp at that size is 8192.
    let r = tiny.ln().unwrap();
    assert!(r.is_identical(&FloatValue::from_i64(f, -1420 * 8192)));
    let r = FloatValue::min_normal(f).ln().unwrap();
    assert!(r.is_identical(&FloatValue::from_i64(f, -1420 * 8192)));
    let r = FloatValue::max_value(f, false).ln().unwrap();
    assert!(r.is_identical(&FloatValue::from_i64(f, 1420 * 8192)));

    assert!(tiny.exp().unwrap().is_one());
    assert!(tiny.negate().exp().unwrap().is_one());
    // e^-11624448 = 1465.65... * 2^-16770544.
    let r = FloatValue::from_i64(f, -1419 * 8192).exp().unwrap();
    assert!(r.is_identical(&FloatValue::from_i64(f, 1466).scalb(-16_770_544)));
    assert!(FloatValue::from_i64(f, -1420 * 8192).exp().unwrap().is_zero());
    assert!(FloatValue::from_i64(f, 1420 * 8192).exp().unwrap().is_infinite());

    // A result in the subnormal range of Format(25, 30):
    // e^-11629080 = 259993258.31... * 2^-16777244.
    let g = Format::new(25, 30);
    let r = FloatValue::from_i64(g, -11_629_080).exp().unwrap();
    assert!(r.is_subnormal());
    assert!(r.is_identical(&FloatValue::from_i64(g, 259_993_258).scalb(-16_777_244)));
}
