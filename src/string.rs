//! This module contains the implementation of string conversion.

use super::error::ParseError;
use super::float::{FloatValue, Format, RoundingMode};
use core::fmt;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::debug;

impl Format {
    /// Returns the number of significant decimal digits that are needed to
    /// print any number of this format and read it back unchanged. This is
    /// 1 + ceil(p * log10(2)), the definition used by MPFR.
    pub fn decimal_digits(&self) -> usize {
        let p = f64::from(self.precision());
        1 + (p * core::f64::consts::LOG10_2).ceil() as usize
    }
}

impl FloatValue {
    /// Convert the number into decimal digits and the decimal exponent of the
    /// first digit, rounded to `digits` significant digits.
    fn to_decimal(&self, digits: usize) -> (String, i64) {
        // The estimate of the decimal exponent of the first digit is exact or
        // one off.
        let lead = self.leading_exponent();
        let estimate = (lead as f64 * core::f64::consts::LOG10_2).floor() as i64;

        // Divide by 10^s, so that the integer part has a few more digits than
        // we print. The identity m * 2^e * 10^-s == m * 2^(e-s) * 5^-s keeps
        // the power of five as the only large number.
        let s = estimate - digits as i64 - 1;
        let (mut num, lsb) = self.exact_parts();
        let mut den = BigUint::one();
        let five = BigUint::from(5u32).pow(s.unsigned_abs() as u32);
        if s >= 0 {
            den = five;
        } else {
            num *= five;
        }
        let shift = lsb - s;
        if shift >= 0 {
            num <<= shift as u64;
        } else {
            den <<= shift.unsigned_abs();
        }
        let (n, rest) = num.div_rem(&den);
        let sticky = !rest.is_zero();

        let cut = (n.to_string().len() - digits) as u32;
        let divisor = BigUint::from(10u32).pow(cut);
        let (q, r) = n.div_rem(&divisor);
        let twice = r << 1u32;
        let round_up = twice > divisor || (twice == divisor && (sticky || q.is_odd()));
        let q = if round_up { q + 1u32 } else { q };

        let mut exp10 = s + i64::from(cut);
        let mut text = q.to_string();
        // Rounding up may produce an extra digit (9.99 -> 10.0).
        if text.len() > digits {
            text.pop();
            exp10 += 1;
        }
        let first = exp10 + text.len() as i64 - 1;
        (text, first)
    }

    /// Format a finite nonzero number.
    fn convert_normal_to_string(&self) -> String {
        let digits = self.format().decimal_digits();
        let (text, exp) = self.to_decimal(digits);
        let text = text.trim_end_matches('0');
        let text = if text.is_empty() { "0" } else { text };

        let mut out = String::new();
        if self.is_negative() {
            out.push('-');
        }

        if exp >= -4 && exp < digits as i64 {
            if exp >= 0 {
                let int_len = exp as usize + 1;
                if text.len() <= int_len {
                    out.push_str(text);
                    out.extend(core::iter::repeat('0').take(int_len - text.len()));
                    out.push_str(".0");
                } else {
                    out.push_str(&text[..int_len]);
                    out.push('.');
                    out.push_str(&text[int_len..]);
                }
            } else {
                out.push_str("0.");
                out.extend(core::iter::repeat('0').take((-exp - 1) as usize));
                out.push_str(text);
            }
        } else {
            out.push_str(&text[..1]);
            out.push('.');
            if text.len() > 1 {
                out.push_str(&text[1..]);
            } else {
                out.push('0');
            }
            out.push('e');
            out.push_str(&exp.to_string());
        }
        out
    }
}

impl fmt::Display for FloatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        if self.is_nan() {
            return write!(f, "{}nan", sign);
        }
        if self.is_infinite() {
            return write!(f, "{}inf", sign);
        }
        if self.is_zero() {
            return write!(f, "{}0.0", sign);
        }
        f.write_str(&self.convert_normal_to_string())
    }
}

/// Walks over the bytes of a literal and keeps track of the offset for error
/// reporting.
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn eat(&mut self, options: &[char]) -> Option<char> {
        let c = self.peek().filter(|c| options.contains(c))?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume a run of digits of the given radix and return them.
    fn digits(&mut self, radix: u32) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_digit(radix) {
                break;
            }
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::InvalidCharacter {
                offset: self.pos,
                found,
            },
            None => ParseError::MissingDigits,
        }
    }

    /// Parse an optionally signed exponent. Values that do not fit in an
    /// i64 are clamped, which is far outside of every format.
    fn exponent(&mut self) -> Result<i64, ParseError> {
        let negative = self.eat(&['+', '-']) == Some('-');
        let digits = self.digits(10);
        if digits.is_empty() {
            return Err(ParseError::InvalidExponent);
        }
        let limit = i64::MAX / 4;
        let mut value: i64 = 0;
        for d in digits.bytes() {
            value = value
                .saturating_mul(10)
                .saturating_add(i64::from(d - b'0'))
                .min(limit);
        }
        Ok(if negative { -value } else { value })
    }
}

impl FloatValue {
    /// Parse a C floating point literal into the format `format`, rounding
    /// to nearest, ties to even. Accepts decimal literals (1.5e-3), hex
    /// literals (0x1.8p3), inf, infinity and nan (in any case), with an
    /// optional sign and an optional f, F, l or L suffix.
    pub fn from_string(format: Format, value: &str) -> Result<Self, ParseError> {
        let result = Self::parse_literal(format, value);
        if let Err(err) = &result {
            debug!(input = value, %err, "rejected float literal");
        }
        result
    }

    fn parse_literal(format: Format, value: &str) -> Result<Self, ParseError> {
        if value.is_empty() {
            return Err(ParseError::Empty);
        }
        let mut scanner = Scanner::new(value);
        let sign = scanner.eat(&['+', '-']) == Some('-');

        let rest = scanner.rest();
        if rest.eq_ignore_ascii_case("inf") || rest.eq_ignore_ascii_case("infinity") {
            return Ok(Self::signed_infinity(format, sign));
        }
        if rest.eq_ignore_ascii_case("nan") {
            return Ok(Self::signed_nan(format, sign));
        }

        let hex = rest.starts_with("0x") || rest.starts_with("0X");
        if hex {
            scanner.pos += 2;
        }
        let radix = if hex { 16 } else { 10 };

        let int_part = scanner.digits(radix);
        let frac_part = if scanner.eat(&['.']).is_some() {
            scanner.digits(radix)
        } else {
            ""
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(scanner.unexpected());
        }

        let markers: &[char] = if hex { &['p', 'P'] } else { &['e', 'E'] };
        let exp = if scanner.eat(markers).is_some() {
            scanner.exponent()?
        } else if hex {
            // Hex literals need a binary exponent to be told apart from
            // integers.
            return Err(ParseError::InvalidExponent);
        } else {
            0
        };
        scanner.eat(&['f', 'F', 'l', 'L']);
        if !scanner.rest().is_empty() {
            return Err(scanner.unexpected());
        }

        let mut all_digits = String::with_capacity(int_part.len() + frac_part.len());
        all_digits.push_str(int_part);
        all_digits.push_str(frac_part);
        let mantissa =
            BigUint::parse_bytes(all_digits.as_bytes(), radix).ok_or(ParseError::MissingDigits)?;
        if mantissa.is_zero() {
            return Ok(Self::signed_zero(format, sign));
        }

        let frac_len = frac_part.len() as i64;
        if hex {
            Ok(Self::from_hex_parts(format, sign, mantissa, exp - 4 * frac_len))
        } else {
            Ok(Self::from_decimal_parts(format, sign, mantissa, exp - frac_len))
        }
    }

    /// Returns `mantissa * 2^exp`. This is exact up to the final rounding.
    fn from_hex_parts(format: Format, sign: bool, mantissa: BigUint, exp: i64) -> Self {
        // Keep the exponent in a range where the arithmetic below can't
        // overflow; anything beyond it overflows or underflows every format.
        let limit = 1i64 << 40;
        let exp = exp.clamp(-limit, limit);
        Self::round_scaled(format, sign, mantissa, exp, RoundingMode::NearestTiesToEven)
    }

    /// Returns `mantissa * 10^exp`, correctly rounded. The value is
    /// represented as the ratio u/v of two integers, and the quotient is
    /// computed with enough bits to make the rounding decision (Algorithm M,
    /// Clinger 1990).
    fn from_decimal_parts(format: Format, sign: bool, mantissa: BigUint, exp: i64) -> Self {
        let log10_2 = core::f64::consts::LOG10_2;
        let digits = mantissa.to_string().len() as i64;

        // Values with a magnitude of at least 10^(magnitude - 1).
        let magnitude = exp.saturating_add(digits);
        let max_digits = ((format.max_exp() + 1) as f64 * log10_2).ceil() as i64 + 1;
        if magnitude > max_digits {
            return Self::signed_infinity(format, sign);
        }
        // Values below half of the smallest subnormal.
        let min_digits = -(((format.bias() + i64::from(format.sig_bits()) + 2) as f64
            * log10_2)
            .ceil() as i64)
            - 2;
        if magnitude < min_digits {
            return Self::signed_zero(format, sign);
        }

        // 10^exp == 5^exp * 2^exp, and the power of two is a shift.
        let five = BigUint::from(5u32).pow(exp.unsigned_abs() as u32);
        if exp >= 0 {
            let u = mantissa * five;
            Self::round_scaled(format, sign, u, exp, RoundingMode::NearestTiesToEven)
        } else {
            Self::from_ratio(format, sign, &mantissa, &five, exp)
        }
    }
}

impl core::str::FromStr for FloatValue {
    type Err = ParseError;

    /// Parse the literal as a FLOAT64 number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FloatValue::from_string(Format::FLOAT64, s)
    }
}

#[test]
fn test_decimal_digits() {
    assert_eq!(Format::FLOAT16.decimal_digits(), 5);
    assert_eq!(Format::FLOAT32.decimal_digits(), 9);
    assert_eq!(Format::FLOAT64.decimal_digits(), 17);
}

#[test]
fn test_convert_to_string() {
    fn to_str_w_fp64(val: f64) -> String {
        FloatValue::from_f64(val).to_string()
    }
    fn to_str_w_fp32(val: f32) -> String {
        FloatValue::from_f32(val).to_string()
    }

    assert_eq!(to_str_w_fp64(3.), "3.0");
    assert_eq!(to_str_w_fp64(-0.5), "-0.5");
    assert_eq!(to_str_w_fp64(0.0), "0.0");
    assert_eq!(to_str_w_fp64(-0.0), "-0.0");
    assert_eq!(to_str_w_fp64(f64::INFINITY), "inf");
    assert_eq!(to_str_w_fp64(f64::NEG_INFINITY), "-inf");
    assert_eq!(to_str_w_fp64(f64::NAN), "nan");
    assert_eq!(to_str_w_fp64(1024.), "1024.0");
    assert_eq!(to_str_w_fp64(0.001), "0.001");
    assert_eq!(to_str_w_fp64(0.1), "0.10000000000000001");
    assert_eq!(to_str_w_fp64(1e100), "1.0e100");
    assert_eq!(to_str_w_fp64(1e-5), "1.0000000000000001e-5");
    assert_eq!(to_str_w_fp32(0.1), "0.100000001");
    assert_eq!(to_str_w_fp32(1.5), "1.5");
    assert_eq!(to_str_w_fp32(1e10), "1.0e10");
    assert_eq!(to_str_w_fp32(123456.), "123456.0");
}

#[test]
fn test_from_string() {
    let f = Format::FLOAT64;
    let parse = |s: &str| FloatValue::from_string(f, s).unwrap().f64_value();

    assert_eq!(parse("0.65625"), 0.65625);
    assert_eq!(parse("-1.5e3"), -1500.);
    assert_eq!(parse("1e-3"), 0.001);
    assert_eq!(parse("+.5"), 0.5);
    assert_eq!(parse("5."), 5.);
    assert_eq!(parse("0.1f"), 0.1);
    assert_eq!(parse("2.5L"), 2.5);
    assert_eq!(parse("0x1.8p1"), 3.);
    assert_eq!(parse("0X10P-4"), 1.);
    assert_eq!(parse("-0x.8p0"), -0.5);
    assert_eq!(parse("0x1.fp3f"), 15.5);
    assert_eq!(parse("1e400"), f64::INFINITY);
    assert_eq!(parse("-1e400"), f64::NEG_INFINITY);
    assert_eq!(parse("1e-400").to_bits(), 0);
    assert_eq!(parse("-0.0").to_bits(), (-0f64).to_bits());
    assert_eq!(parse("INF"), f64::INFINITY);
    assert_eq!(parse("-Infinity"), f64::NEG_INFINITY);
    assert!(parse("nan").is_nan());
    assert!(FloatValue::from_string(f, "-nan").unwrap().is_negative());
    assert_eq!(parse("4.9406564584124654e-324"), f64::from_bits(1));
    assert_eq!(parse("2.2250738585072011e-308"), 2.2250738585072011e-308);
    assert_eq!(parse("1.7976931348623157e308"), f64::MAX);
    assert_eq!(parse("9007199254740993"), 9007199254740992.);
    assert_eq!(parse("0x1.0000000000001p0"), 1. + f64::EPSILON);
    assert_eq!(parse("1e99999999999999999999"), f64::INFINITY);
}

#[test]
fn test_parse_errors() {
    let f = Format::FLOAT32;
    assert_eq!(FloatValue::from_string(f, ""), Err(ParseError::Empty));
    assert_eq!(FloatValue::from_string(f, "-"), Err(ParseError::MissingDigits));
    assert_eq!(FloatValue::from_string(f, "."), Err(ParseError::MissingDigits));
    assert_eq!(FloatValue::from_string(f, "1e"), Err(ParseError::InvalidExponent));
    assert_eq!(FloatValue::from_string(f, "1e+"), Err(ParseError::InvalidExponent));
    assert_eq!(
        FloatValue::from_string(f, "1.2.3"),
        Err(ParseError::InvalidCharacter {
            offset: 3,
            found: '.'
        })
    );
    assert_eq!(
        FloatValue::from_string(f, "12a"),
        Err(ParseError::InvalidCharacter {
            offset: 2,
            found: 'a'
        })
    );
    assert_eq!(
        FloatValue::from_string(f, "0x1.8"),
        Err(ParseError::InvalidExponent)
    );
    assert!(FloatValue::from_string(f, "infinite").is_err());
    assert!(FloatValue::from_string(f, " 1.0").is_err());
}

#[test]
fn test_parse_display_round_trip() {
    use crate::utils::Lfsr;

    let mut lfsr = Lfsr::new();
    for _ in 0..3000 {
        let v = f64::from_bits(lfsr.get64());
        let printed = FloatValue::from_f64(v).to_string();
        let parsed = FloatValue::from_string(Format::FLOAT64, &printed).unwrap();
        assert!(v.is_nan() || parsed.f64_value().to_bits() == v.to_bits());
        // The host parser agrees with the printed digits.
        if v.is_finite() {
            assert_eq!(printed.parse::<f64>().unwrap().to_bits(), v.to_bits());
        }
    }
    for _ in 0..3000 {
        let v = f32::from_bits(lfsr.get());
        let printed = FloatValue::from_f32(v).to_string();
        let parsed = FloatValue::from_string(Format::FLOAT32, &printed).unwrap();
        assert!(v.is_nan() || parsed.f32_value().to_bits() == v.to_bits());
    }
}

#[test]
fn test_parse_matches_host() {
    use crate::utils::Lfsr;

    // Short decimal literals with many different exponents.
    let mut lfsr = Lfsr::new();
    for _ in 0..3000 {
        let mantissa = lfsr.get() % 1_000_000;
        let exp = (lfsr.get() % 640) as i32 - 330;
        let text = format!("{}e{}", mantissa, exp);
        let ours = FloatValue::from_string(Format::FLOAT64, &text).unwrap();
        let host: f64 = text.parse().unwrap();
        assert_eq!(ours.f64_value().to_bits(), host.to_bits());
        let ours = FloatValue::from_string(Format::FLOAT32, &text).unwrap();
        let host: f32 = text.parse().unwrap();
        assert_eq!(ours.f32_value().to_bits(), host.to_bits());
    }
}

#[test]
fn test_print_wide_formats() {
    let third = FloatValue::one(Format::FLOAT128).divide(&FloatValue::from_i64(Format::FLOAT128, 3));
    let printed = third.to_string();
    assert_eq!(printed, "0.333333333333333333333333333333333317");
    let back = FloatValue::from_string(Format::FLOAT128, &printed).unwrap();
    assert!(back.is_identical(&third));
    let x = FloatValue::from_string(Format::FLOAT8, "0.3").unwrap();
    assert_eq!(x.to_string(), "0.312");
    assert!(FloatValue::from_string(Format::FLOAT8, "0.312")
        .unwrap()
        .is_identical(&x));
}

#[test]
fn test_small_formats_round_trip() {
    for format in [Format::FLOAT8, Format::FLOAT16] {
        let count = 1u64 << (1 + format.exp_bits() + format.sig_bits());
        for bits in 0..count {
            let v = FloatValue::from_bits(format, bits);
            let printed = v.to_string();
            let back = FloatValue::from_string(format, &printed).unwrap();
            assert!(
                (v.is_nan() && back.is_nan()) || back.is_identical(&v),
                "{}",
                printed
            );
        }
    }
}

#[test]
fn test_print_wide_exponent() {
    // The decimal exponent is in the millions, the digits are few.
    let f = Format::new(25, 10);
    let tiny = FloatValue::min_subnormal(f);
    assert_eq!(tiny.to_string(), "2.148e-5050448");
    assert!(FloatValue::from_string(f, "2.148e-5050448")
        .unwrap()
        .is_identical(&tiny));
    let max = FloatValue::max_value(f, false);
    assert_eq!(max.to_string(), "1.8177e5050445");
    assert!(FloatValue::from_string(f, "1.8177e5050445")
        .unwrap()
        .is_identical(&max));
    assert_eq!(FloatValue::min_normal(f).to_string(), "2.1995e-5050445");

    let g = Format::new(22, 10);
    let tiny = FloatValue::min_subnormal(g);
    assert_eq!(tiny.to_string(), "8.5959e-631309");
    assert!(FloatValue::from_string(g, &tiny.to_string())
        .unwrap()
        .is_identical(&tiny));
}
