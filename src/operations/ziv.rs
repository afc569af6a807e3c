//! Correct rounding of functions whose results can't be bounded ahead of time
//! (the table maker's dilemma), using Ziv's technique: evaluate the function
//! at increasing precisions until the rounded result is provably stable.

use super::constants::ConstantsRegistry;
use crate::error::FloatError;
use crate::float::{FloatValue, Format};
use tracing::debug;

/// Evaluate `eval` on `arg` and return the result correctly rounded into
/// `target`.
///
/// For every working precision that the policy of `registry` allows, `eval`
/// is called on the neighbors of `arg` one ulp below and above it (in the
/// working format), with `guard` more bits of precision for the evaluation
/// itself. The result is accepted when both evaluations, widened by one more
/// ulp, round to the same number, and their valid parts do too. `eval` must
/// be monotone in the neighborhood of `arg`.
pub(crate) fn correctly_rounded<F>(
    function: &'static str,
    arg: &FloatValue,
    target: Format,
    guard: u32,
    registry: &ConstantsRegistry,
    eval: F,
) -> Result<FloatValue, FloatError>
where
    F: Fn(&FloatValue) -> FloatValue,
{
    let policy = registry.policy();
    for extra in policy.extra_bits() {
        let working = target.extended(extra);
        let evaluation = working.extended(guard);
        let x = arg.with_precision(working);

        let below = eval(&x.next_down().with_precision(evaluation));
        let above = eval(&x.next_up().with_precision(evaluation));
        if let Some(result) = rounding_test(&below, &above, working, target) {
            return Ok(result);
        }
        debug!(function, %target, extra, "result is not stable, increasing precision");
    }

    debug!(
        function,
        %target,
        max_extra_bits = policy.max_extra_bits(),
        "giving up on correct rounding"
    );
    Err(FloatError::PrecisionExhausted {
        function,
        format: target,
        max_extra_bits: policy.max_extra_bits(),
    })
}

/// Returns the rounded result if the interval spanned by `a` and `b` can only
/// round to one number of `target`.
fn rounding_test(
    a: &FloatValue,
    b: &FloatValue,
    working: Format,
    target: Format,
) -> Option<FloatValue> {
    if a.is_nan() || b.is_nan() {
        return None;
    }
    let (low, high) = if a.greater_than(b) { (b, a) } else { (a, b) };
    let low = low.with_precision(working).next_down();
    let high = high.with_precision(working).next_up();

    let candidate = low.with_precision(target);
    if !candidate.is_identical(&high.with_precision(target)) {
        return None;
    }
    // The bits in front of the ambiguous tail must round the same way too.
    let stable = [&low, &high]
        .iter()
        .all(|v| v.valid_part().with_precision(target).is_identical(&candidate));
    if stable {
        Some(candidate)
    } else {
        None
    }
}

#[test]
fn test_rounding_test() {
    let target = Format::FLOAT32;
    let working = target.extended(16);
    let one = FloatValue::one(working);

    // A tight interval around a number that is far from a rounding boundary.
    let a = FloatValue::from_f64(1.3).with_precision(working);
    let b = a.next_up().next_up();
    let r = rounding_test(&a, &b, working, target).unwrap();
    assert_eq!(r.f32_value(), 1.3);

    // Just below a FLOAT32 number the valid part is not stable.
    let c = FloatValue::from_f64(1.25).with_precision(working).next_down();
    assert!(rounding_test(&c, &c, working, target).is_none());

    // An interval that straddles the midpoint between two FLOAT32 numbers.
    let mid = one.add(&FloatValue::from_f64(2f64.powi(-24)));
    let r = rounding_test(&mid.next_down(), &mid.next_up(), working, target);
    assert!(r.is_none());
}

#[test]
fn test_precision_exhausted() {
    use super::constants::EscalationPolicy;

    let registry = ConstantsRegistry::with_policy(EscalationPolicy {
        initial_extra_bits: 4,
        max_attempts: 3,
    });
    let x = FloatValue::one(Format::FLOAT32);
    // A function that always lands on a rounding boundary never converges.
    let midpoint = |v: &FloatValue| {
        let half_ulp = FloatValue::from_f64(2f64.powi(-24)).with_precision(v.format());
        FloatValue::one(v.format()).add(&half_ulp)
    };
    let r = correctly_rounded("midpoint", &x, Format::FLOAT32, 8, &registry, midpoint);
    assert_eq!(
        r.unwrap_err(),
        FloatError::PrecisionExhausted {
            function: "midpoint",
            format: Format::FLOAT32,
            max_extra_bits: 16,
        }
    );

    // The identity function converges at once.
    let r = correctly_rounded("id", &x, Format::FLOAT32, 8, &registry, |v| v.clone());
    assert!(r.unwrap().is_one());
}
