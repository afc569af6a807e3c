//! Checks the wide formats against exact rational arithmetic on big integers.

use crfloat::{FloatValue, Format};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed};
use proptest::prelude::*;

const WIDE_FORMATS: [Format; 3] = [Format::FLOAT80, Format::FLOAT128, Format::FLOAT256];

fn make(format: Format, m: u64, e: i64, negative: bool) -> FloatValue {
    let v = FloatValue::from_u64(format, m | 1).scalb(e);
    if negative {
        v.negate()
    } else {
        v
    }
}

/// Returns the exact value of a finite number as m * 2^e.
fn parts(v: &FloatValue) -> (BigInt, i64) {
    let format = v.format();
    let exp = if v.is_normal() {
        v.exponent()
    } else {
        format.min_exp()
    };
    let m = BigInt::from(v.significand().clone());
    (if v.sign() { -m } else { m }, exp - i64::from(format.sig_bits()))
}

fn shifted(m: &BigInt, e: i64, lo: i64) -> BigInt {
    m << ((e - lo) as usize)
}

fn less(a: &(BigInt, i64), b: &(BigInt, i64)) -> bool {
    let lo = a.1.min(b.1);
    shifted(&a.0, a.1, lo) < shifted(&b.0, b.1, lo)
}

fn midpoint(a: &(BigInt, i64), b: &(BigInt, i64)) -> (BigInt, i64) {
    let lo = a.1.min(b.1);
    (shifted(&a.0, a.1, lo) + shifted(&b.0, b.1, lo), lo - 1)
}

/// Returns true if `r` is the number of its format nearest to
/// num * 2^scale / den, with ties going to the even significand.
fn is_nearest(r: &FloatValue, num: &BigInt, scale: i64, den: &BigInt) -> bool {
    let candidates = [r.clone(), r.next_down(), r.next_up()];
    if candidates.iter().any(|c| !c.is_finite()) {
        return false;
    }
    let all: Vec<(BigInt, i64)> = candidates.iter().map(parts).collect();
    let lo = all.iter().map(|p| p.1).fold(scale, i64::min);
    let exact = shifted(num, scale, lo);
    let dist = |(m, e): &(BigInt, i64)| (shifted(&(m * den), *e, lo) - &exact).abs();
    let d = dist(&all[0]);
    let closer = |other: BigInt| d < other || (d == other && r.significand().is_even());
    closer(dist(&all[1])) && closer(dist(&all[2]))
}

/// Returns true if `r` is the nearest number to sqrt(x): the squares of the
/// midpoints between `r` and its neighbors enclose x.
fn is_nearest_root(r: &FloatValue, x: &FloatValue) -> bool {
    let value = parts(r);
    let below = midpoint(&value, &parts(&r.next_down()));
    let above = midpoint(&value, &parts(&r.next_up()));
    let square = |(m, e): (BigInt, i64)| (&m * &m, 2 * e);
    let x = parts(x);
    less(&square(below), &x) && less(&x, &square(above))
}

fn check_operations(a: &FloatValue, b: &FloatValue) -> Result<(), TestCaseError> {
    let (na, ea) = parts(a);
    let (nb, eb) = parts(b);
    let one = BigInt::one();

    let r = a.multiply(b);
    prop_assert!(is_nearest(&r, &(&na * &nb), ea + eb, &one), "{} * {} = {}", a, b, r);

    let num = if nb.is_negative() { -&na } else { na.clone() };
    let r = a.divide(b);
    prop_assert!(is_nearest(&r, &num, ea - eb, &nb.abs()), "{} / {} = {}", a, b, r);

    let lo = ea.min(eb);
    let sum = shifted(&na, ea, lo) + shifted(&nb, eb, lo);
    let r = a.add(b);
    prop_assert!(is_nearest(&r, &sum, lo, &one), "{} + {} = {}", a, b, r);

    let x = a.abs();
    if !x.is_zero() {
        let r = x.sqrt();
        prop_assert!(is_nearest_root(&r, &x), "sqrt({}) = {}", x, r);
    }
    Ok(())
}

proptest! {
    #[test]
    fn wide_arithmetic_is_correctly_rounded(
        ma in any::<u64>(), ea in -300i64..300, sa in any::<bool>(),
        mb in any::<u64>(), eb in -300i64..300, sb in any::<bool>(),
    ) {
        for format in WIDE_FORMATS {
            let a = make(format, ma, ea, sa);
            let b = make(format, mb, eb, sb);
            check_operations(&a, &b)?;
        }
    }

    #[test]
    fn wide_string_round_trip(m in any::<u64>(), e in -16000i64..16000, s in any::<bool>()) {
        for format in WIDE_FORMATS {
            let v = make(format, m, e, s);
            let back = FloatValue::from_string(format, &v.to_string()).unwrap();
            prop_assert!(back.is_identical(&v), "{}", v);
        }
    }

    #[test]
    fn wide_exponent_bottom_is_correctly_rounded(
        ma in any::<u64>(), ea in -16_777_320i64..-16_777_150, sa in any::<bool>(),
        mb in any::<u64>(), eb in -100i64..40, sb in any::<bool>(),
        mc in (1u64 << 63).., ec in -16_777_310i64..-16_777_150,
    ) {
        // The smallest normal number of this format is 2^-16777214, and the
        // smallest subnormal is 2^-16777254. `a` may underflow to zero, `c`
        // can't.
        let f = Format::new(25, 40);
        let a = make(f, ma, ea, sa);
        let b = make(f, mb, eb, sb);
        let c = make(f, mc, ec, !sa);
        check_operations(&a, &b)?;
        check_operations(&a, &c)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn wide_exponent_string_round_trip(m in any::<u64>(), e in -2_100_000i64..2_100_000) {
        let f = Format::new(22, 20);
        let v = make(f, m, e, false);
        let back = FloatValue::from_string(f, &v.to_string()).unwrap();
        prop_assert!(back.is_identical(&v), "{}", v);
    }
}
