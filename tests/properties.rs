use crfloat::{FloatValue, Format, RoundingMode};
use proptest::prelude::*;

fn same_bits(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

fn same_bits32(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

proptest! {
    #[test]
    fn string_round_trip(bits in any::<u64>()) {
        let v = FloatValue::from_f64(f64::from_bits(bits));
        let parsed = FloatValue::from_string(Format::FLOAT64, &v.to_string()).unwrap();
        prop_assert!(same_bits(parsed.f64_value(), v.f64_value()));
    }

    #[test]
    fn parse_matches_host(bits in any::<u64>()) {
        let v = f64::from_bits(bits);
        prop_assume!(v.is_finite());
        let text = format!("{:e}", v);
        let parsed = FloatValue::from_string(Format::FLOAT64, &text).unwrap();
        prop_assert_eq!(parsed.f64_value().to_bits(), v.to_bits());
    }

    #[test]
    fn widen_then_narrow_is_identity(bits in any::<u32>()) {
        let v = FloatValue::from_f32(f32::from_bits(bits));
        prop_assume!(!v.is_nan());
        for wide in [Format::FLOAT64, Format::FLOAT128, Format::new(25, 30)] {
            let back = v.with_precision(wide).with_precision(Format::FLOAT32);
            prop_assert!(back.is_identical(&v));
        }
    }

    #[test]
    fn rounding_is_idempotent(bits in any::<u64>()) {
        let v = FloatValue::from_f64(f64::from_bits(bits));
        prop_assume!(!v.is_nan());
        for format in [Format::FLOAT8, Format::FLOAT16, Format::FLOAT32] {
            let once = v.with_precision(format);
            prop_assert!(once.with_precision(format).is_identical(&once));
        }
    }

    #[test]
    fn add_and_multiply_commute(a in any::<u64>(), b in any::<u64>()) {
        let x = FloatValue::from_f64(f64::from_bits(a));
        let y = FloatValue::from_f64(f64::from_bits(b));
        prop_assert!(same_bits(x.add(&y).f64_value(), y.add(&x).f64_value()));
        prop_assert!(same_bits(x.multiply(&y).f64_value(), y.multiply(&x).f64_value()));
    }

    #[test]
    fn arithmetic_matches_host(a in any::<u64>(), b in any::<u64>()) {
        let (fa, fb) = (f64::from_bits(a), f64::from_bits(b));
        let x = FloatValue::from_f64(fa);
        let y = FloatValue::from_f64(fb);
        prop_assert!(same_bits(x.add(&y).f64_value(), fa + fb));
        prop_assert!(same_bits(x.subtract(&y).f64_value(), fa - fb));
        prop_assert!(same_bits(x.multiply(&y).f64_value(), fa * fb));
        prop_assert!(same_bits(x.divide(&y).f64_value(), fa / fb));
        prop_assert!(same_bits(x.sqrt().f64_value(), fa.sqrt()));
        prop_assert!(same_bits(x.modulo(&y).f64_value(), fa % fb));
    }

    #[test]
    fn arithmetic_matches_host_f32(a in any::<u32>(), b in any::<u32>()) {
        let (fa, fb) = (f32::from_bits(a), f32::from_bits(b));
        let x = FloatValue::from_f32(fa);
        let y = FloatValue::from_f32(fb);
        prop_assert!(same_bits32(x.add(&y).f32_value(), fa + fb));
        prop_assert!(same_bits32(x.multiply(&y).f32_value(), fa * fb));
        prop_assert!(same_bits32(x.divide(&y).f32_value(), fa / fb));
        prop_assert!(same_bits32(x.sqrt().f32_value(), fa.sqrt()));
    }

    #[test]
    fn round_to_integer_matches_host(bits in any::<u64>()) {
        let v = f64::from_bits(bits);
        let x = FloatValue::from_f64(v);
        let r = |mode| x.round_to_integer(mode).f64_value();
        prop_assert!(same_bits(r(RoundingMode::Truncate), v.trunc()));
        prop_assert!(same_bits(r(RoundingMode::Floor), v.floor()));
        prop_assert!(same_bits(r(RoundingMode::Ceiling), v.ceil()));
        prop_assert!(same_bits(r(RoundingMode::NearestTiesToAway), v.round()));
    }

    #[test]
    fn comparisons_match_host(a in any::<u64>(), b in any::<u64>()) {
        let (fa, fb) = (f64::from_bits(a), f64::from_bits(b));
        let x = FloatValue::from_f64(fa);
        let y = FloatValue::from_f64(fb);
        prop_assert_eq!(x.less_than(&y), fa < fb);
        prop_assert_eq!(x.equal_to(&y), fa == fb);
        prop_assert_eq!(x.greater_or_equal(&y), fa >= fb);
        prop_assert_eq!(x.partial_cmp(&y), fa.partial_cmp(&fb));
    }
}
