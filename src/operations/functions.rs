//! This module contains the implementation of pow and of several other
//! arithmetic operations.

use super::constants::ConstantsRegistry;
use super::exp::{exp_limit, is_tiny, GUARD_BITS};
use super::ziv::correctly_rounded;
use crate::error::FloatError;
use crate::float::{FloatValue, Format, RoundingMode};
use core::cmp::Ordering;
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Exponents beyond this bound overflow or underflow every format, and are
/// clamped to it.
const EXPONENT_LIMIT: i64 = 1 << 62;

/// Below this number of bits, integer powers are computed exactly.
const EXACT_POWER_BITS: u64 = 4096;

fn clamp_exponent(e: &BigInt) -> i64 {
    match e.to_i64() {
        Some(v) => v.clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT),
        None if e.is_negative() => -EXPONENT_LIMIT,
        None => EXPONENT_LIMIT,
    }
}

/// Return `base` raised to the power of `n`.
fn exact_power(base: &BigUint, mut n: u64) -> BigUint {
    // Each bit of 'n' selects one of the squares base, base^2, base^4 ...
    // and the result is the product of the selected squares.
    let mut result = BigUint::one();
    let mut square = base.clone();
    while n > 0 {
        if n & 1 == 1 {
            result *= &square;
        }
        n >>= 1;
        if n > 0 {
            square = &square * &square;
        }
    }
    result
}

/// Computes x^y = exp(y * ln(x)) for a positive finite x that is not one,
/// and a finite nonzero y, correctly rounded into `target`.
fn pow_general(
    x: &FloatValue,
    y: &FloatValue,
    target: Format,
    registry: &ConstantsRegistry,
) -> Result<FloatValue, FloatError> {
    let wide = target.extended(GUARD_BITS);
    let t = x.with_precision(wide).ln_series(registry).multiply(y);

    if t.abs().greater_than(&exp_limit(target)) {
        return Ok(if t.is_negative() {
            FloatValue::zero(target)
        } else {
            FloatValue::infinity(target)
        });
    }
    if is_tiny(&t, target, 4) {
        let e = t.with_precision(wide).exp_m1_series(registry);
        return Ok(FloatValue::one(wide).add(&e).with_precision(target));
    }

    // The error of ln(x) is scaled by y*ln(x), which can reach 2^exp_bits,
    // and exp loses one more bit per squaring.
    let guard = 24 + 2 * (target.exp_bits() + 2);
    correctly_rounded("pow", x, target, guard, registry, |b| {
        b.ln_series(registry).multiply(y).exp_series(registry)
    })
}

impl FloatValue {
    /// Returns x^y, correctly rounded, using the shared constants registry.
    pub fn pow(&self, y: &Self) -> Result<Self, FloatError> {
        self.pow_with(y, ConstantsRegistry::shared())
    }

    /// Returns x^y, correctly rounded. The special values follow the C
    /// standard (Annex F.9.4.4).
    pub fn pow_with(&self, y: &Self, registry: &ConstantsRegistry) -> Result<Self, FloatError> {
        let format = self.format().sup(&y.format());
        if y.is_zero() || self.is_one() {
            return Ok(Self::one(format));
        }
        if self.is_nan() || y.is_nan() {
            return Ok(Self::nan(format));
        }

        let odd = y.is_odd_integer();
        if self.is_zero() {
            let sign = self.sign() && odd;
            return Ok(if y.is_negative() {
                Self::signed_infinity(format, sign)
            } else {
                Self::signed_zero(format, sign)
            });
        }
        if y.is_infinite() {
            if self.is_negative_one() {
                return Ok(Self::one(format));
            }
            let below_one = self.abs().less_than(&Self::one(format));
            return Ok(if below_one != y.is_negative() {
                Self::zero(format)
            } else {
                Self::infinity(format)
            });
        }
        if self.is_infinite() {
            let sign = self.sign() && odd;
            return Ok(if y.is_negative() {
                Self::signed_zero(format, sign)
            } else {
                Self::signed_infinity(format, sign)
            });
        }

        if y.is_integer() {
            if let Some(n) = y.to_integer() {
                return self.pow_int_into(&n, format, registry);
            }
        }
        if self.is_negative() {
            return Ok(Self::nan(format));
        }

        let x = self.with_precision(format);
        let half = Self::one(format).scalb(-1);
        if y.equal_to(&half) {
            return Ok(x.sqrt());
        }
        if let Some((root, m)) = x.dyadic_root(y) {
            return root.pow_int_into(&m, format, registry);
        }
        pow_general(&x, y, format, registry)
    }

    /// If y = m / 2^k with an odd m, and the 2^k-th root of the number is
    /// exact, returns the root and m.
    fn dyadic_root(&self, y: &Self) -> Option<(Self, BigInt)> {
        let (sig, lsb) = y.exact_parts();
        let tz = sig.trailing_zeros()?;
        let k = -(lsb + tz as i64);
        if k <= 0 {
            return None;
        }
        let sign = if y.sign() { Sign::Minus } else { Sign::Plus };
        let m = BigInt::from_biguint(sign, sig >> tz);
        let mut root = self.clone();
        for _ in 0..k {
            root = root.exact_sqrt()?;
        }
        Some((root, m))
    }

    /// Returns x^n, correctly rounded, using the shared constants registry.
    pub fn pow_int(&self, n: &BigInt) -> Result<Self, FloatError> {
        self.pow_int_with(n, ConstantsRegistry::shared())
    }

    /// Returns x^n, correctly rounded.
    pub fn pow_int_with(&self, n: &BigInt, registry: &ConstantsRegistry) -> Result<Self, FloatError> {
        let format = self.format();
        if n.is_zero() || self.is_one() {
            return Ok(Self::one(format));
        }
        if self.is_nan() {
            return Ok(Self::nan(format));
        }
        let sign = self.sign() && n.is_odd();
        if self.is_zero() {
            return Ok(if n.is_negative() {
                Self::signed_infinity(format, sign)
            } else {
                Self::signed_zero(format, sign)
            });
        }
        if self.is_infinite() {
            return Ok(if n.is_negative() {
                Self::signed_zero(format, sign)
            } else {
                Self::signed_infinity(format, sign)
            });
        }
        self.pow_int_into(n, format, registry)
    }

    /// Computes x^n for a finite nonzero x and a nonzero n, and rounds the
    /// result once into `target`.
    pub(crate) fn pow_int_into(
        &self,
        n: &BigInt,
        target: Format,
        registry: &ConstantsRegistry,
    ) -> Result<Self, FloatError> {
        debug_assert!(self.is_finite() && !self.is_zero() && !n.is_zero());
        let sign = self.sign() && n.is_odd();

        // x = odd * 2^e, so x^n = odd^n * 2^(e*n).
        let (sig, lsb) = self.exact_parts();
        let tz = sig.trailing_zeros().unwrap_or(0);
        let odd = sig >> tz;
        let scale = clamp_exponent(&(BigInt::from(lsb + tz as i64) * n));
        if odd.is_one() {
            return Ok(Self::round_scaled(
                target,
                sign,
                odd,
                scale,
                RoundingMode::NearestTiesToEven,
            ));
        }

        // Powers that are too wide to be exact or to sit halfway between two
        // numbers of the target are left to the general algorithm.
        let limit = EXACT_POWER_BITS.max(2 * u64::from(target.precision()));
        let count = n
            .magnitude()
            .to_u64()
            .filter(|c| c.saturating_mul(odd.bits()) <= limit);
        if let Some(count) = count {
            let power = exact_power(&odd, count);
            return Ok(if n.is_negative() {
                Self::from_ratio(target, sign, &BigUint::one(), &power, scale)
            } else {
                Self::round_scaled(target, sign, power, scale, RoundingMode::NearestTiesToEven)
            });
        }

        let wide = Format::working((n.bits() as u32).max(2));
        let y = Self::from_integer(wide, n);
        let result = pow_general(&self.abs(), &y, target, registry)?;
        Ok(if sign { result.negate() } else { result })
    }
}

impl FloatValue {
    /// Returns the smaller of self and `other`. If one of them is NaN the
    /// other one is returned, and -0 is considered smaller than +0.
    pub fn min(&self, other: &Self) -> Self {
        let format = self.format().sup(&other.format());
        if self.is_nan() {
            return other.with_precision(format);
        } else if other.is_nan() {
            return self.with_precision(format);
        }
        let pick_self = match self.compare(other) {
            Some(Ordering::Less) => true,
            Some(Ordering::Greater) => false,
            _ => self.sign(), // Handle (+-)0.
        };
        if pick_self {
            self.with_precision(format)
        } else {
            other.with_precision(format)
        }
    }

    /// Returns the greater of self and `other`. If one of them is NaN the
    /// other one is returned, and +0 is considered greater than -0.
    pub fn max(&self, other: &Self) -> Self {
        let format = self.format().sup(&other.format());
        if self.is_nan() {
            return other.with_precision(format);
        } else if other.is_nan() {
            return self.with_precision(format);
        }
        let pick_self = match self.compare(other) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Less) => false,
            _ => !self.sign(), // Handle (+-)0.
        };
        if pick_self {
            self.with_precision(format)
        } else {
            other.with_precision(format)
        }
    }

    fn modulo_special(&self, other: &Self, format: Format) -> Option<Self> {
        if self.is_nan() || other.is_nan() || self.is_infinite() || other.is_zero() {
            return Some(Self::nan(format));
        }
        if other.is_infinite() || self.is_zero() {
            return Some(self.with_precision(format));
        }
        None
    }

    /// Returns x - n*y where n is x/y truncated toward zero, like C's fmod.
    /// The result is exact and has the sign of x.
    pub fn modulo(&self, other: &Self) -> Self {
        let format = self.format().sup(&other.format());
        if let Some(special) = self.modulo_special(other, format) {
            return special;
        }
        let (sx, lx) = self.exact_parts();
        let (sy, ly) = other.exact_parts();
        // |x| mod |y|, counted in units of 2^min(lx, ly).
        let (rem, lsb) = if lx >= ly {
            let shift = BigUint::from(2u32).modpow(&BigUint::from((lx - ly) as u64), &sy);
            ((sx * shift) % &sy, ly)
        } else {
            (sx % (sy << ((ly - lx) as u64)), lx)
        };
        Self::round_scaled(format, self.sign(), rem, lsb, RoundingMode::NearestTiesToEven)
    }

    /// Returns x - n*y where n is the integer nearest to x/y, with ties to
    /// the even integer (IEEE remainder). The result is exact.
    pub fn remainder(&self, other: &Self) -> Self {
        let format = self.format().sup(&other.format());
        if let Some(special) = self.modulo_special(other, format) {
            return special;
        }
        let (sx, lx) = self.exact_parts();
        let (sy, ly) = other.exact_parts();
        let lsb = lx.min(ly);
        let y = sy << ((ly - lsb) as u64);
        // Reduce modulo 2|y| to learn the parity of the quotient.
        let modulus: BigUint = &y << 1u32;
        let rem = if lx >= ly {
            let shift = BigUint::from(2u32).modpow(&BigUint::from((lx - ly) as u64), &modulus);
            (sx * shift) % &modulus
        } else {
            sx % &modulus
        };
        let (rem, odd) = if rem >= y {
            (rem - &y, true)
        } else {
            (rem, false)
        };
        let twice: BigUint = &rem << 1u32;
        let (magnitude, flip) = if twice > y || (twice == y && odd) {
            (&y - rem, true)
        } else {
            (rem, false)
        };
        Self::round_scaled(
            format,
            self.sign() ^ flip,
            magnitude,
            lsb,
            RoundingMode::NearestTiesToEven,
        )
    }
}

#[cfg(test)]
use super::exp::ulp_distance;

#[test]
fn test_pow_special_values() {
    let f = Format::FLOAT32;
    let v = |x: f32| FloatValue::from_f32(x);
    let pow = |x: f32, y: f32| v(x).pow(&v(y)).unwrap().f32_value();

    // Compare with the host, which follows the same table.
    let values = [
        0., -0., 1., -1., 2., -2., 0.5, -0.5, 3., -3., 1.5,
        f32::INFINITY, f32::NEG_INFINITY, f32::NAN,
    ];
    for x in values {
        for y in values {
            let ours = pow(x, y);
            let host = x.powf(y);
            let close = if host.is_finite() && host != 0. {
                ours.to_bits().abs_diff(host.to_bits()) <= 1
            } else {
                ours.to_bits() == host.to_bits()
            };
            assert!(
                (ours.is_nan() && host.is_nan()) || close,
                "pow({}, {}) = {}, expected {}",
                x,
                y,
                ours,
                host
            );
        }
    }
    assert!(FloatValue::nan(f).pow(&FloatValue::zero(f)).unwrap().is_one());
    assert!(FloatValue::one(f).pow(&FloatValue::nan(f)).unwrap().is_one());
}

#[test]
fn test_pow_values() {
    use crate::utils::Lfsr;

    let f = Format::FLOAT32;
    let two = FloatValue::from_string(f, "2.0").unwrap();
    let half = FloatValue::from_string(f, "0.5").unwrap();
    assert!(two.pow(&half).unwrap().is_identical(&two.sqrt()));

    let pow = |x: f64, y: f64| {
        let a = FloatValue::from_f64(x);
        a.pow(&FloatValue::from_f64(y)).unwrap().f64_value()
    };
    assert_eq!(pow(2., 10.), 1024.);
    assert_eq!(pow(2., -2.), 0.25);
    assert_eq!(pow(-2., 3.), -8.);
    assert_eq!(pow(3., -1.), 1. / 3.);
    assert_eq!(pow(4., 1.5), 8.);
    assert_eq!(pow(16., 0.25), 2.);
    assert_eq!(pow(16., -0.75), 0.125);
    assert_eq!(pow(10., 22.), 1e22);
    assert_eq!(pow(10., 400.), f64::INFINITY);
    assert_eq!(pow(10., -400.), 0.);
    assert_eq!(pow(0.5, 1e10), 0.);
    assert!(ulp_distance(pow(1.5, 2.5), 1.5f64.powf(2.5)) <= 1);

    let mut lfsr = Lfsr::new();
    for _ in 0..100 {
        let x = lfsr.get() as f64 / u32::MAX as f64 * 100.;
        let y = (lfsr.get() as f64 / u32::MAX as f64 - 0.5) * 20.;
        let ours = pow(x, y);
        assert!(ulp_distance(ours, x.powf(y)) <= 1, "pow({}, {})", x, y);
    }
}

#[test]
fn test_pow_int() {
    let f = Format::FLOAT64;
    let n = |v: i64| BigInt::from(v);
    let three = FloatValue::from_i64(f, 3);
    assert_eq!(three.pow_int(&n(4)).unwrap().f64_value(), 81.);
    assert_eq!(three.pow_int(&n(-2)).unwrap().f64_value(), 1. / 9.);
    assert_eq!(three.pow_int(&n(0)).unwrap().f64_value(), 1.);
    assert_eq!(
        three.pow_int(&n(40)).unwrap().f64_value(),
        12_157_665_459_056_928_801u64 as f64
    );
    let r = FloatValue::negative_zero(f).pow_int(&n(-3)).unwrap();
    assert!(r.is_infinite() && r.is_negative());
    let r = FloatValue::negative_infinity(f).pow_int(&n(2)).unwrap();
    assert!(r.is_infinite() && !r.is_negative());
    let r = FloatValue::negative_one(f).pow_int(&n(-7)).unwrap();
    assert!(r.is_negative_one());
    assert!(FloatValue::nan(f).pow_int(&n(0)).unwrap().is_one());

    // Powers of two only move the exponent.
    let two = FloatValue::from_i64(f, 2);
    assert_eq!(two.pow_int(&n(1023)).unwrap().f64_value(), 2f64.powi(1023));
    assert!(two.pow_int(&n(1024)).unwrap().is_infinite());
    assert_eq!(two.pow_int(&n(-1074)).unwrap().f64_value(), 5e-324);
    assert!(two.pow_int(&BigInt::from(10).pow(30)).unwrap().is_infinite());

    // Too wide to be computed exactly.
    let x = FloatValue::from_f32(1. + f32::EPSILON);
    let r = x.pow_int(&n(1 << 20)).unwrap().f32_value();
    let host = (1. + f32::EPSILON as f64).powf((1 << 20) as f64) as f32;
    assert!(r.to_bits().abs_diff(host.to_bits()) <= 1);
}

#[test]
fn test_pow_wide_exponent() {
    let f = Format::new(25, 10);
    let tiny = FloatValue::min_subnormal(f);
    let one = FloatValue::one(f);
    let pow = |y: &FloatValue| tiny.pow(y).unwrap();

    let half = one.scalb(-1);
    assert!(pow(&half).is_identical(&tiny.sqrt()));
    assert!(pow(&half).is_identical(&one.scalb(-8_388_612)));
    assert!(pow(&half.negate()).is_identical(&one.scalb(8_388_612)));
    assert!(pow(&one.scalb(-2)).is_identical(&one.scalb(-4_194_306)));
    assert!(pow(&FloatValue::from_i64(f, 2)).is_zero());
    assert!(pow(&FloatValue::from_i64(f, -1)).is_infinite());

    // The third square root of 2^-16777224 is not exact, so this goes
    // through exp(y * ln(x)): 2^(-16777224 * 683/2048) = 1288.99... * 2^-5595149.
    let y = FloatValue::from_i64(f, 683).scalb(-11);
    let r = pow(&y);
    assert!(r.is_identical(&FloatValue::from_i64(f, 1289).scalb(-5_595_149)));

    let n = BigInt::from(-1);
    let r = FloatValue::min_normal(f).pow_int(&n).unwrap();
    assert!(r.is_identical(&one.scalb(16_777_214)));
}

#[test]
fn test_precision_exhausted() {
    use super::constants::EscalationPolicy;

    let registry = ConstantsRegistry::with_policy(EscalationPolicy {
        initial_extra_bits: 16,
        max_attempts: 0,
    });
    let x = FloatValue::from_f64(1.5);
    let y = FloatValue::from_f64(2.5);
    let err = x.pow_with(&y, &registry).unwrap_err();
    assert!(matches!(err, FloatError::PrecisionExhausted { function: "pow", .. }));
    let err = x.exp_with(&registry).unwrap_err();
    assert!(matches!(err, FloatError::PrecisionExhausted { function: "exp", .. }));
    let err = x.ln_with(&registry).unwrap_err();
    assert!(matches!(err, FloatError::PrecisionExhausted { function: "ln", .. }));

    // Exact results never need the escalation.
    let four = FloatValue::from_f64(4.);
    assert_eq!(four.pow_with(&y, &registry).unwrap().f64_value(), 32.);
}

#[test]
fn test_min_max() {
    let f = Format::FLOAT32;
    let one = FloatValue::one(f);
    let two = FloatValue::from_i64(f, 2);
    let nan = FloatValue::nan(f);
    let zero = FloatValue::zero(f);
    let neg_zero = FloatValue::negative_zero(f);

    assert!(one.min(&two).is_identical(&one));
    assert!(one.max(&two).is_identical(&two));
    assert!(nan.min(&two).is_identical(&two));
    assert!(two.max(&nan).is_identical(&two));
    assert!(nan.max(&nan).is_nan());
    assert!(zero.min(&neg_zero).is_identical(&neg_zero));
    assert!(neg_zero.max(&zero).is_identical(&zero));
    assert!(neg_zero.min(&zero).is_identical(&neg_zero));
}

#[test]
fn test_modulo() {
    use crate::utils::{get_special_test_values, Lfsr};

    let m = |x: f64, y: f64| {
        let a = FloatValue::from_f64(x);
        a.modulo(&FloatValue::from_f64(y)).f64_value()
    };
    assert_eq!(m(5.5, 2.), 1.5);
    assert_eq!(m(-5.5, 2.), -1.5);
    assert_eq!(m(5.5, -2.), 1.5);
    assert!(m(-4., 2.).is_sign_negative());
    assert_eq!(m(1e300, 3.), 1e300 % 3.);
    assert_eq!(m(3., 1e300), 3.);

    // The host's % operator is fmod.
    for x in get_special_test_values() {
        for y in get_special_test_values() {
            let ours = m(x, y);
            let host = x % y;
            assert!(
                (ours.is_nan() && host.is_nan()) || ours.to_bits() == host.to_bits(),
                "fmod({}, {})",
                x,
                y
            );
        }
    }

    let mut lfsr = Lfsr::new();
    for _ in 0..500 {
        let x = f64::from_bits(lfsr.get64());
        let y = f64::from_bits(lfsr.get64());
        let ours = m(x, y);
        let host = x % y;
        assert!((ours.is_nan() && host.is_nan()) || ours.to_bits() == host.to_bits());
    }
}

#[test]
fn test_remainder() {
    use crate::utils::Lfsr;

    let r = |x: f64, y: f64| {
        let a = FloatValue::from_f64(x);
        a.remainder(&FloatValue::from_f64(y)).f64_value()
    };
    assert_eq!(r(5., 2.), 1.);
    assert_eq!(r(7., 2.), -1.);
    assert_eq!(r(5.5, 2.), -0.5);
    assert_eq!(r(-5.5, 2.), 0.5);
    assert_eq!(r(1., 3.), 1.);
    assert!(r(-4., 2.).is_sign_negative());
    assert!(r(1., 0.).is_nan());
    assert!(r(f64::INFINITY, 1.).is_nan());
    assert_eq!(r(1., f64::INFINITY), 1.);

    // The remainder differs from fmod by at most |y|, toward zero.
    let mut lfsr = Lfsr::new();
    for _ in 0..500 {
        let x = f64::from_bits(lfsr.get64());
        let y = f64::from_bits(lfsr.get64());
        if !x.is_finite() || !y.is_finite() || y == 0. {
            continue;
        }
        let ours = r(x, y);
        let fmod = x % y;
        assert!(ours.abs() <= y.abs() / 2.);
        let other = fmod - y.abs().copysign(fmod);
        assert!(ours == fmod || ours == other, "remainder({}, {})", x, y);
    }
}
