//! Addition, subtraction, multiplication, division and square root.

use super::float::{truncate, FloatValue, Format, RoundingMode, GRS_BITS};
use super::operations::constants::ConstantsRegistry;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;

impl FloatValue {
    /// Compute a+b, rounded to nearest, ties to even. Operands of different
    /// formats are first converted to the smallest format that holds both.
    pub fn add(&self, other: &Self) -> Self {
        let format = self.format().sup(&other.format());
        let a = self.widen(format);
        let b = other.widen(format);

        if a.is_nan() || b.is_nan() {
            return Self::nan(format);
        }
        match (a.is_infinite(), b.is_infinite()) {
            (true, true) => {
                return if a.sign() == b.sign() {
                    a
                } else {
                    Self::nan(format)
                };
            }
            (true, false) => return a,
            (false, true) => return b,
            _ => {}
        }
        match (a.is_zero(), b.is_zero()) {
            (true, true) => {
                return Self::signed_zero(format, a.sign() && b.sign());
            }
            (true, false) => return b,
            (false, true) => return a,
            _ => {}
        }
        Self::add_finite(a, b)
    }

    /// Compute a-b, rounded to nearest, ties to even.
    pub fn subtract(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    fn add_finite(a: Self, b: Self) -> Self {
        let format = a.format();
        let s = i64::from(format.sig_bits());

        // Make sure that 'a' has the larger magnitude.
        let (a, b) = if a.abs().less_than(&b.abs()) {
            (b, a)
        } else {
            (a, b)
        };
        let (sig_a, lsb_a) = a.exact_parts();
        let (sig_b, lsb_b) = b.exact_parts();
        let (ea, eb) = (a.leading_exponent(), b.leading_exponent());

        // The smaller operand lies entirely below the rounding bits.
        if ea - eb > s + GRS_BITS {
            return a;
        }

        // Align both significands to the larger lsb, keeping three GRS bits
        // and folding anything below them into a sticky bit.
        let lsb = lsb_a.max(lsb_b) - GRS_BITS;
        let ext_a = sig_a << ((lsb_a - lsb) as u64);
        let ext_b = if lsb_b >= lsb {
            sig_b << ((lsb_b - lsb) as u64)
        } else {
            truncate(&sig_b, (lsb - lsb_b) as u64)
        };

        let sum = if a.sign() == b.sign() {
            ext_a + ext_b
        } else {
            ext_a - ext_b
        };
        // x - x is +0 when rounding to nearest.
        if sum.is_zero() {
            return Self::zero(format);
        }
        Self::round_scaled(
            format,
            a.sign(),
            sum,
            lsb,
            RoundingMode::NearestTiesToEven,
        )
    }
}

#[test]
fn test_add_simple() {
    let f = Format::FLOAT64;
    let a = FloatValue::from_i64(f, 1);
    let b = FloatValue::from_i64(f, 2);
    assert_eq!(a.add(&b).f64_value(), 3.);
    assert_eq!(a.subtract(&b).f64_value(), -1.);
    assert!(a.subtract(&a).is_identical(&FloatValue::zero(f)));
}

#[test]
fn test_addition() {
    fn add_helper(a: f64, b: f64) -> f64 {
        let a = FloatValue::from_f64(a);
        let b = FloatValue::from_f64(b);
        a.add(&b).f64_value()
    }

    assert_eq!(add_helper(0., -4.), -4.);
    assert_eq!(add_helper(-4., 0.), -4.);
    assert_eq!(add_helper(1., 1.), 2.);
    assert_eq!(add_helper(8., 4.), 12.);
    assert_eq!(add_helper(128., 2.), 130.);
    assert_eq!(add_helper(128., -8.), 120.);
    assert_eq!(add_helper(64., -60.), 4.);
    assert_eq!(add_helper(69., -65.), 4.);
    assert_eq!(add_helper(69., 69.), 138.);
    assert_eq!(add_helper(-128., -8.), -136.);
    assert_eq!(add_helper(64., -65.), -1.);
    assert_eq!(add_helper(-64., -65.), -129.);
    assert_eq!(add_helper(-15., 15.), 0.);

    for i in -4..15 {
        for j in i..15 {
            assert_eq!(
                add_helper(f64::from(j), f64::from(i)),
                f64::from(i) + f64::from(j)
            );
        }
    }
}

// Pg 120.  Chapter 4. Basic Properties and Algorithms.
#[test]
fn test_addition_large_numbers() {
    let f = Format::FLOAT64;
    let one = FloatValue::one(f);
    let mut a = FloatValue::one(f);

    while a.add(&one).subtract(&a) == one {
        a = a.add(&a);
    }

    let mut b = one.clone();
    while a.add(&b).subtract(&a) != b {
        b = b.add(&one);
    }

    assert_eq!(a.f64_value(), 9007199254740992.);
    assert_eq!(b.f64_value(), 2.);
}

#[test]
fn test_add_signed_zeros() {
    let f = Format::FLOAT32;
    let pz = FloatValue::zero(f);
    let nz = FloatValue::negative_zero(f);
    assert!(pz.add(&nz).is_identical(&pz));
    assert!(nz.add(&pz).is_identical(&pz));
    assert!(nz.add(&nz).is_identical(&nz));

    let inf = FloatValue::infinity(f);
    assert!(inf.add(&inf.negate()).is_nan());
    assert!(inf.subtract(&inf).is_nan());
    assert!(inf.add(&FloatValue::one(f)).is_identical(&inf));
}

#[test]
fn test_add_denormals() {
    let v0 = f64::from_bits(0x0000_0000_0010_0010);
    let v1 = f64::from_bits(0x0000_0000_1001_0010);
    let v2 = f64::from_bits(0x1000_0000_0001_0010);

    fn add_f64(a: f64, b: f64) -> f64 {
        let a0 = FloatValue::from_f64(a);
        let b0 = FloatValue::from_f64(b);
        assert_eq!(a0.f64_value(), a);
        a0.add(&b0).f64_value()
    }

    assert_eq!(add_f64(v0, v1), v0 + v1);
    assert_eq!(add_f64(v0, -v0), v0 - v0);
    assert_eq!(add_f64(v0, v2), v0 + v2);
    assert_eq!(add_f64(v2, v1), v2 + v1);
    assert_eq!(add_f64(v2, -v1), v2 - v1);
    assert_eq!(add_f64(v0, 10.), v0 + 10.);
    assert_eq!(add_f64(v0, -10.), v0 - 10.);
    assert_eq!(add_f64(10000., v0), 10000. + v0);
}

#[test]
fn test_add_special_values() {
    use crate::utils;

    let values = utils::get_special_test_values();

    for v0 in values {
        for v1 in values {
            let r0 = FloatValue::from_f64(v0)
                .add(&FloatValue::from_f64(v1))
                .f64_value();
            let r1 = v0 + v1;
            assert_eq!(r0.is_nan(), r1.is_nan());
            assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
        }
    }
}

#[test]
fn test_add_random_vals() {
    use crate::utils;

    let mut lfsr = utils::Lfsr::new();

    for _ in 0..20000 {
        let f0 = f64::from_bits(lfsr.get64());
        let f1 = f64::from_bits(lfsr.get64());
        let r0 = FloatValue::from_f64(f0)
            .add(&FloatValue::from_f64(f1))
            .f64_value();
        let r1 = f0 + f1;
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }

    // Values that are close to each other exercise the cancellation path.
    for _ in 0..20000 {
        let f0 = f32::from_bits(lfsr.get());
        let f1 = -f32::from_bits(f0.to_bits() ^ (lfsr.get() & 0x3ff));
        let r0 = FloatValue::from_f32(f0)
            .add(&FloatValue::from_f32(f1))
            .f32_value();
        let r1 = f0 + f1;
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
}

impl FloatValue {
    /// Compute a*b, rounded to nearest, ties to even.
    pub fn multiply(&self, other: &Self) -> Self {
        let format = self.format().sup(&other.format());
        let a = self.widen(format);
        let b = other.widen(format);
        if let Some(special) = Self::multiply_special(&a, &b, format) {
            return special;
        }
        let (sig_a, lsb_a) = a.exact_parts();
        let (sig_b, lsb_b) = b.exact_parts();
        Self::round_scaled(
            format,
            a.sign() ^ b.sign(),
            sig_a * sig_b,
            lsb_a + lsb_b,
            RoundingMode::NearestTiesToEven,
        )
    }

    /// Compute a*b without rounding. The result is placed in a format that
    /// is wide enough to hold the full product.
    pub fn multiply_exact(&self, other: &Self) -> Self {
        let format = Format::working(self.format().sig_bits() + other.format().sig_bits() + 1);
        let a = self.widen(self.format().with_unlimited_exponent());
        let b = other.widen(other.format().with_unlimited_exponent());
        if let Some(special) = Self::multiply_special(&a, &b, format) {
            return special;
        }
        let (sig_a, lsb_a) = a.exact_parts();
        let (sig_b, lsb_b) = b.exact_parts();
        Self::round_scaled(
            format,
            a.sign() ^ b.sign(),
            sig_a * sig_b,
            lsb_a + lsb_b,
            RoundingMode::NearestTiesToEven,
        )
    }

    // Table 8.4: Specification of multiplication for floating-point data of
    // positive sign. Page 251.
    fn multiply_special(a: &Self, b: &Self, format: Format) -> Option<Self> {
        let sign = a.sign() ^ b.sign();
        if a.is_nan() || b.is_nan() {
            return Some(Self::nan(format));
        }
        if a.is_infinite() || b.is_infinite() {
            if a.is_zero() || b.is_zero() {
                return Some(Self::nan(format));
            }
            return Some(Self::signed_infinity(format, sign));
        }
        if a.is_zero() || b.is_zero() {
            return Some(Self::signed_zero(format, sign));
        }
        None
    }
}

#[test]
fn test_mul_simple() {
    let f = Format::FLOAT64;
    let a = FloatValue::from_i64(f, -6);
    let b = FloatValue::from_i64(f, 7);
    assert_eq!(a.multiply(&b).f64_value(), -42.);

    let inf = FloatValue::infinity(f);
    assert!(inf.multiply(&FloatValue::zero(f)).is_nan());
    assert!(inf.multiply(&a).is_identical(&FloatValue::negative_infinity(f)));
    let z = FloatValue::negative_zero(f).multiply(&b);
    assert!(z.is_zero() && z.is_negative());
}

#[test]
fn test_mul_special_values() {
    use crate::utils;

    let values = utils::get_special_test_values();
    for v0 in values {
        for v1 in values {
            let r0 = FloatValue::from_f64(v0)
                .multiply(&FloatValue::from_f64(v1))
                .f64_value();
            let r1 = v0 * v1;
            assert_eq!(r0.is_nan(), r1.is_nan());
            assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
        }
    }
}

#[test]
fn test_mul_random_vals() {
    use crate::utils;

    let mut lfsr = utils::Lfsr::new();
    for _ in 0..20000 {
        let f0 = f64::from_bits(lfsr.get64());
        let f1 = f64::from_bits(lfsr.get64());
        let r0 = FloatValue::from_f64(f0)
            .multiply(&FloatValue::from_f64(f1))
            .f64_value();
        let r1 = f0 * f1;
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
    for _ in 0..20000 {
        let f0 = f32::from_bits(lfsr.get());
        let f1 = f32::from_bits(lfsr.get());
        let r0 = FloatValue::from_f32(f0)
            .multiply(&FloatValue::from_f32(f1))
            .f32_value();
        let r1 = f0 * f1;
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
}

#[test]
fn test_multiply_exact() {
    let f = Format::FLOAT32;
    let a = FloatValue::from_f32(1. + f32::EPSILON);
    let p = a.multiply_exact(&a);
    // (1 + 2^-23)^2 = 1 + 2^-22 + 2^-46 needs 47 bits.
    assert!(p.format().precision() >= 47);
    let expected = FloatValue::from_f64(1. + 2f64.powi(-22) + 2f64.powi(-46));
    assert!(p.equal_to(&expected));
    assert!(a.multiply(&a).equal_to(&FloatValue::from_f32(1. + 2. * f32::EPSILON)));
}

/// Returns the number of Newton iterations that bring the initial reciprocal
/// estimate 48/17 - 32/17*D, which is accurate to log2(17) bits, to at least
/// `precision` bits.
fn newton_iterations(precision: u32) -> u32 {
    let seed_bits = 17f64.log2();
    let mut iterations = 0;
    while seed_bits * f64::from(1u32 << iterations) < f64::from(precision + 1) {
        iterations += 1;
    }
    iterations
}

impl FloatValue {
    /// Compute a/b, rounded to nearest, ties to even, using the shared
    /// constants registry.
    pub fn divide(&self, other: &Self) -> Self {
        self.divide_with(other, ConstantsRegistry::shared())
    }

    /// Compute a/b, rounded to nearest, ties to even.
    pub fn divide_with(&self, other: &Self, registry: &ConstantsRegistry) -> Self {
        let format = self.format().sup(&other.format());
        self.divide_into(other, format, registry)
    }

    /// Compute a/b and round the quotient once into `target`.
    pub(crate) fn divide_into(
        &self,
        other: &Self,
        target: Format,
        registry: &ConstantsRegistry,
    ) -> Self {
        let sign = self.sign() ^ other.sign();

        // Table 8.5: Special values for x/y - Page 263.
        if self.is_nan() || other.is_nan() {
            return Self::nan(target);
        }
        if self.is_infinite() && other.is_infinite() {
            return Self::nan(target);
        }
        if self.is_zero() && other.is_zero() {
            return Self::nan(target);
        }
        if self.is_infinite() || other.is_zero() {
            return Self::signed_infinity(target, sign);
        }
        if other.is_infinite() || self.is_zero() {
            return Self::signed_zero(target, sign);
        }

        let work = target
            .sup(&self.format())
            .sup(&other.format())
            .intermediate_precision();
        let dividend = self.abs().with_precision(work);
        let divisor = other.abs().with_precision(work);

        // Scale the divisor into [0.5, 1) and compute its reciprocal.
        let scale = divisor.exponent() + 1;
        let d = divisor.with_exponent(-1);
        let (c48, c32) = registry.newton_seeds(work);
        let two = Self::from_i64(work, 2);
        let mut x = c48.subtract(&c32.multiply(&d));
        for _ in 0..newton_iterations(work.precision()) {
            x = x.multiply(&two.subtract(&d.multiply(&x)));
        }
        let mut quotient = dividend.multiply(&x).scalb(-scale);

        // Exact quotients may sit on a rounding boundary of the target, where
        // the Newton error decides the direction. Snap those to the grid.
        let grid = Format::working(target.sig_bits() + 1);
        let snapped = quotient.with_precision(grid);
        if snapped.multiply_exact(&divisor).equal_to(&dividend) {
            quotient = snapped;
        }

        let result = quotient.with_precision(target);
        if sign {
            result.negate()
        } else {
            result
        }
    }

    /// Computes `numerator/denominator * 2^scale` rounded into `format`, by
    /// long division of the integers. This is slow, and is used to compute
    /// constants and to parse decimal numbers.
    pub(crate) fn from_ratio(
        format: Format,
        sign: bool,
        numerator: &BigUint,
        denominator: &BigUint,
        scale: i64,
    ) -> Self {
        assert!(!denominator.is_zero(), "Division by zero");
        if numerator.is_zero() {
            return Self::signed_zero(format, sign);
        }
        // Make the quotient at least precision + 3 bits wide.
        let wanted = i64::from(format.precision()) + GRS_BITS + 1;
        let shift = (wanted + denominator.bits() as i64 - numerator.bits() as i64).max(0);
        let (q, r) = (numerator << (shift as u64)).div_rem(denominator);
        let sticky = u32::from(!r.is_zero());
        Self::round_scaled(
            format,
            sign,
            (q << 1u32) | BigUint::from(sticky),
            scale - shift - 1,
            RoundingMode::NearestTiesToEven,
        )
    }
}

#[test]
fn test_newton_iterations() {
    assert_eq!(newton_iterations(4), 1);
    assert_eq!(newton_iterations(53), 4);
    assert_eq!(newton_iterations(116), 5);
}

#[test]
fn test_from_ratio() {
    let f = Format::FLOAT64;
    let third = FloatValue::from_ratio(f, false, &1u32.into(), &3u32.into(), 0);
    assert_eq!(third.f64_value(), 1. / 3.);
    let v = FloatValue::from_ratio(f, true, &48u32.into(), &17u32.into(), -2);
    assert_eq!(v.f64_value(), -48. / 17. / 4.);
}

#[test]
fn test_div_simple() {
    let f = Format::FLOAT64;
    let a = FloatValue::from_i64(f, 12);
    let b = FloatValue::from_i64(f, 4);
    assert_eq!(a.divide(&b).f64_value(), 3.);
    assert_eq!(b.divide(&a).f64_value(), 4. / 12.);
    let c = FloatValue::from_i64(f, -7);
    assert_eq!(c.divide(&b).f64_value(), -7. / 4.);
    assert_eq!(b.divide(&c).f64_value(), 4. / -7.);
}

#[test]
fn test_div_special_values() {
    use crate::utils;

    let f = Format::FLOAT32;
    let one = FloatValue::one(f);
    let zero = FloatValue::zero(f);
    assert!(one.divide(&zero).is_identical(&FloatValue::infinity(f)));
    assert!(one
        .negate()
        .divide(&zero)
        .is_identical(&FloatValue::negative_infinity(f)));
    assert!(zero.divide(&zero).is_nan());
    let third = one.divide(&FloatValue::from_i64(f, 3));
    assert_eq!(third.f32_value().to_bits(), (1f32 / 3.).to_bits());

    let values = utils::get_special_test_values();
    for v0 in values {
        for v1 in values {
            let r0 = FloatValue::from_f64(v0)
                .divide(&FloatValue::from_f64(v1))
                .f64_value();
            let r1 = v0 / v1;
            assert_eq!(r0.is_nan(), r1.is_nan());
            assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
        }
    }
}

#[test]
fn test_div_random_vals() {
    use crate::utils;

    let mut lfsr = utils::Lfsr::new();
    for _ in 0..2000 {
        let f0 = f64::from_bits(lfsr.get64());
        let f1 = f64::from_bits(lfsr.get64());
        let r0 = FloatValue::from_f64(f0)
            .divide(&FloatValue::from_f64(f1))
            .f64_value();
        let r1 = f0 / f1;
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
    for _ in 0..2000 {
        let f0 = f32::from_bits(lfsr.get());
        let f1 = f32::from_bits(lfsr.get());
        let r0 = FloatValue::from_f32(f0)
            .divide(&FloatValue::from_f32(f1))
            .f32_value();
        let r1 = f0 / f1;
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
}

#[test]
fn test_div_exact_quotients() {
    // Quotients that land exactly on a representable value, including
    // subnormal results.
    for (a, b) in [
        (1., 0.5),
        (3., 1.5),
        (f64::MIN_POSITIVE, 2.),
        (f64::MIN_POSITIVE, 1024.),
        (1e300, 1e-10),
        (7. * 2f64.powi(-1070), 7.),
    ] {
        let r = FloatValue::from_f64(a).divide(&FloatValue::from_f64(b));
        assert_eq!(r.f64_value().to_bits(), (a / b).to_bits());
    }
}

// Check that the Newton iterations do not carry the Pentium FDIV error.
#[test]
fn test_famous_pentium4_bug() {
    let a = FloatValue::from_i64(Format::FLOAT64, 4_195_835);
    let b = FloatValue::from_i64(Format::FLOAT64, 3_145_727);
    let res = a.divide(&b).f64_value();
    assert_eq!(res, 4_195_835. / 3_145_727.);
}

impl FloatValue {
    /// Compute the square root of the number, rounded to nearest, ties to
    /// even.
    pub fn sqrt(&self) -> Self {
        let format = self.format();
        if self.is_nan() {
            return Self::nan(format);
        }
        if self.is_zero() {
            return self.clone();
        }
        if self.is_negative() {
            return Self::nan(format);
        }
        if self.is_infinite() {
            return self.clone();
        }

        let work = format.intermediate_precision();
        let x = self.with_precision(work);

        // sqrt(f * 2^(2m)) = sqrt(f) * 2^m, with f in [1, 4).
        let exp = x.exponent();
        let f = x.with_exponent(exp.rem_euclid(2));
        let root = f.multiply(&inverse_sqrt(&f)).scalb(exp.div_euclid(2));

        // Perfect squares must not be pushed off the grid by the error of
        // the iteration.
        let grid = Format::working(format.sig_bits() + 1);
        let snapped = root.with_precision(grid);
        let root = if snapped.multiply_exact(&snapped).equal_to(&x) {
            snapped
        } else {
            root
        };
        root.with_precision(format)
    }

    /// Returns the square root if it is exactly representable in the format
    /// of the number.
    pub(crate) fn exact_sqrt(&self) -> Option<Self> {
        let root = self.sqrt();
        if root.is_finite() && root.multiply_exact(&root).equal_to(self) {
            Some(root)
        } else {
            None
        }
    }
}

/// Computes 1/sqrt(f) with the iteration x = x(1.5 - 0.5fx^2), starting at
/// 0.5, until the sequence repeats itself.
fn inverse_sqrt(f: &FloatValue) -> FloatValue {
    let work = f.format();
    let half = FloatValue::one(work).scalb(-1);
    let three_halves = FloatValue::from_i64(work, 3).scalb(-1);
    let half_f = half.multiply(f);

    let mut x = half;
    let mut seen = vec![x.clone()];
    loop {
        let next = x.multiply(&three_halves.subtract(&half_f.multiply(&x.multiply(&x))));
        if seen.iter().any(|c| c.is_identical(&next)) {
            return next;
        }
        seen.push(next.clone());
        x = next;
    }
}

#[test]
fn test_sqrt_simple() {
    let f = Format::FLOAT32;
    let two = FloatValue::from_string(f, "2.0").unwrap();
    assert_eq!(two.sqrt().f32_value().to_bits(), 2f32.sqrt().to_bits());
    let four = FloatValue::from_i64(f, 4);
    assert!(four.sqrt().is_identical(&FloatValue::from_i64(f, 2)));
    assert!(FloatValue::negative_one(f).sqrt().is_nan());
    assert!(FloatValue::negative_zero(f).sqrt().is_identical(&FloatValue::negative_zero(f)));
    assert!(FloatValue::infinity(f).sqrt().is_infinite());
    assert!(FloatValue::negative_infinity(f).sqrt().is_nan());
}

#[test]
fn test_sqrt_random_vals() {
    use crate::utils;

    let mut lfsr = utils::Lfsr::new();
    for v in utils::get_special_test_values() {
        let r0 = FloatValue::from_f64(v).sqrt().f64_value();
        let r1 = v.sqrt();
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
    for _ in 0..2000 {
        let f0 = f64::from_bits(lfsr.get64() & 0x7fff_ffff_ffff_ffff);
        let r0 = FloatValue::from_f64(f0).sqrt().f64_value();
        let r1 = f0.sqrt();
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
    for _ in 0..2000 {
        let f0 = f32::from_bits(lfsr.get() & 0x7fff_ffff);
        let r0 = FloatValue::from_f32(f0).sqrt().f32_value();
        let r1 = f0.sqrt();
        assert_eq!(r0.is_nan(), r1.is_nan());
        assert!(r1.is_nan() || r0.to_bits() == r1.to_bits());
    }
}

#[test]
fn test_sqrt_perfect_squares() {
    for i in 1..200u32 {
        let sq = f64::from(i * i) * 0.0625;
        let r = FloatValue::from_f64(sq).sqrt();
        assert_eq!(r.f64_value(), f64::from(i) * 0.25);
        assert!(FloatValue::from_f64(sq).exact_sqrt().is_some());
    }
    assert!(FloatValue::from_f64(2.).exact_sqrt().is_none());
}

macro_rules! declare_operator {
    ($trait_name:ident, $func_name:ident, $method:ident) => {
        impl core::ops::$trait_name for FloatValue {
            type Output = Self;
            fn $func_name(self, rhs: Self) -> Self {
                FloatValue::$method(&self, &rhs)
            }
        }

        impl core::ops::$trait_name<&FloatValue> for &FloatValue {
            type Output = FloatValue;
            fn $func_name(self, rhs: &FloatValue) -> FloatValue {
                FloatValue::$method(self, rhs)
            }
        }
    };
}

declare_operator!(Add, add, add);
declare_operator!(Sub, sub, subtract);
declare_operator!(Mul, mul, multiply);
declare_operator!(Div, div, divide);

impl core::ops::Neg for FloatValue {
    type Output = Self;
    fn neg(self) -> Self {
        self.negate()
    }
}

impl core::ops::Neg for &FloatValue {
    type Output = FloatValue;
    fn neg(self) -> FloatValue {
        self.negate()
    }
}

#[test]
fn test_operators() {
    let a = FloatValue::from_f32(8.0);
    let b = FloatValue::from_f32(2.0);
    let c = &a + &b;
    let d = &a - &b;
    let e = &a * &b;
    let f = &a / &b;
    let g = -a.clone();
    assert_eq!(c.f32_value(), 10.0);
    assert_eq!(d.f32_value(), 6.0);
    assert_eq!(e.f32_value(), 16.0);
    assert_eq!(f.f32_value(), 4.0);
    assert_eq!(g.f32_value(), -8.0);
    assert_eq!((a / b).f32_value(), 4.0);
}

#[test]
fn test_wide_exponent_subnormals() {
    // Formats with the widest exponent field. The smallest subnormal of
    // Format(25, 10) is 2^-16777224.
    let f = Format::new(25, 10);
    let tiny = FloatValue::min_subnormal(f);
    let units = |n: i64| FloatValue::from_i64(f, n).scalb(-16_777_224);
    assert!(tiny.is_identical(&units(1)));

    let one = FloatValue::one(f);
    assert!(tiny.sqrt().is_identical(&one.scalb(-8_388_612)));
    assert!(units(4).sqrt().is_identical(&one.scalb(-8_388_611)));
    // sqrt(2) * 2^-8388612, rounded to 11 bits.
    let r = units(2).sqrt();
    assert!(r.is_identical(&FloatValue::from_i64(f, 1448).scalb(-8_388_622)));

    let min_normal = FloatValue::min_normal(f);
    assert!(min_normal.divide(&tiny).is_identical(&FloatValue::from_i64(f, 1024)));
    assert!(tiny.divide(&min_normal).is_identical(&one.scalb(-10)));
    // Quotients in the subnormal range are rounded once.
    let three = FloatValue::from_i64(f, 3);
    let two = FloatValue::from_i64(f, 2);
    assert!(min_normal.divide(&three).is_identical(&units(341)));
    assert!(units(3).divide(&two).is_identical(&units(2)));
    assert!(units(5).divide(&two).is_identical(&units(2)));
    assert!(units(7).divide(&two).is_identical(&units(4)));
    assert!(units(3).multiply(&two.scalb(-2)).is_identical(&units(2)));

    // Products of extreme values stay exact.
    let max = FloatValue::max_value(f, false);
    let square = max.multiply_exact(&max);
    assert!(square.is_finite());
    assert_eq!(square.leading_exponent(), 2 * f.max_exp() + 1);
    assert!(square.divide(&max).with_precision(f).is_identical(&max));
    let small = tiny.multiply_exact(&tiny);
    assert!(!small.is_zero());
    assert_eq!(small.leading_exponent(), -2 * 16_777_224);
    assert!(tiny.multiply(&tiny).is_zero());
    assert!(max.multiply(&max).is_infinite());
}

#[test]
fn test_small_formats_against_host() {
    use crate::utils::Lfsr;

    // Rounding the f64 result of the host once more is innocuous for
    // +, -, *, / and sqrt when the f64 significand is wider than 2p + 2.
    let same = |a: &FloatValue, b: &FloatValue| (a.is_nan() && b.is_nan()) || a.is_identical(b);

    // Every pair of FLOAT8 numbers.
    let f = Format::FLOAT8;
    let host = |v: f64| FloatValue::from_f64(v).with_precision(f);
    for i in 0..256u64 {
        let a = FloatValue::from_bits(f, i);
        let fa = a.f64_value();
        assert!(same(&a.sqrt(), &host(fa.sqrt())), "sqrt({})", fa);
        for j in 0..256u64 {
            let b = FloatValue::from_bits(f, j);
            let fb = b.f64_value();
            assert!(same(&a.add(&b), &host(fa + fb)), "{} + {}", fa, fb);
            assert!(same(&a.subtract(&b), &host(fa - fb)), "{} - {}", fa, fb);
            assert!(same(&a.multiply(&b), &host(fa * fb)), "{} * {}", fa, fb);
            assert!(same(&a.divide(&b), &host(fa / fb)), "{} / {}", fa, fb);
        }
    }

    // Every FLOAT16 number, with a random partner for the binary operations.
    let f = Format::FLOAT16;
    let host = |v: f64| FloatValue::from_f64(v).with_precision(f);
    let mut lfsr = Lfsr::new();
    for i in 0..=0xffffu64 {
        let a = FloatValue::from_bits(f, i);
        let b = FloatValue::from_bits(f, u64::from(lfsr.get() & 0xffff));
        let (fa, fb) = (a.f64_value(), b.f64_value());
        assert!(same(&a.sqrt(), &host(fa.sqrt())), "sqrt({})", fa);
        assert!(same(&a.add(&b), &host(fa + fb)), "{} + {}", fa, fb);
        assert!(same(&a.multiply(&b), &host(fa * fb)), "{} * {}", fa, fb);
        assert!(same(&a.divide(&b), &host(fa / fb)), "{} / {}", fa, fb);
    }
}
