//! This module contains the registry of memoized constants that the division
//! and the transcendental functions share: the series coefficients 1/k! and
//! 1/k, ln(2) and the Newton seeds of the division.

use crate::float::{FloatValue, Format};
use num_bigint::BigUint;
use num_traits::One;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::sync::OnceLock;
use tracing::trace;

/// The number of extra bits that the series for ln(2) is evaluated with.
const LN2_GUARD_BITS: u32 = 16;

/// Configures how the correctly rounded functions increase the working
/// precision when a result can't be rounded with confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// The number of extra significand bits of the first attempt.
    pub initial_extra_bits: u32,
    /// The number of attempts. Every attempt doubles the extra bits.
    pub max_attempts: u32,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        EscalationPolicy {
            initial_extra_bits: 16,
            max_attempts: 10,
        }
    }
}

impl EscalationPolicy {
    /// Returns the list of extra bits to try, in order.
    pub fn extra_bits(&self) -> impl Iterator<Item = u32> {
        let initial = u64::from(self.initial_extra_bits.max(1));
        (0..self.max_attempts.min(32))
            .map(move |i| (initial << i).min(u64::from(u32::MAX / 4)) as u32)
    }

    /// Returns the largest number of extra bits that the policy allows.
    pub fn max_extra_bits(&self) -> u32 {
        self.extra_bits().last().unwrap_or(0)
    }
}

/// A thread-safe compute-if-absent table. Racing threads may compute the same
/// entry twice, but only one of the (identical) values is kept.
struct Memo<K, V> {
    entries: RwLock<FxHashMap<K, V>>,
}

impl<K: Hash + Eq, V: Clone> Memo<K, V> {
    fn new() -> Self {
        Memo {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    fn get_or_compute<F: FnOnce() -> V>(&self, key: K, compute: F) -> V {
        if let Some(value) = self.entries.read().get(&key) {
            return value.clone();
        }
        // Compute without holding the lock: computing an entry may need
        // other entries of the same table.
        let value = compute();
        self.entries.write().entry(key).or_insert(value).clone()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Holds the constants that are computed lazily, once per format. The
/// registry is passed to the operations that need it; `shared()` returns a
/// process wide instance that the short forms of the operations use.
pub struct ConstantsRegistry {
    policy: EscalationPolicy,
    inverse_factorials: Memo<(Format, u32), FloatValue>,
    inverses: Memo<(Format, u32), FloatValue>,
    ln2: Memo<Format, FloatValue>,
    newton_seeds: Memo<Format, (FloatValue, FloatValue)>,
}

static SHARED: OnceLock<ConstantsRegistry> = OnceLock::new();

impl Default for ConstantsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantsRegistry {
    pub fn new() -> Self {
        Self::with_policy(EscalationPolicy::default())
    }

    pub fn with_policy(policy: EscalationPolicy) -> Self {
        ConstantsRegistry {
            policy,
            inverse_factorials: Memo::new(),
            inverses: Memo::new(),
            ln2: Memo::new(),
            newton_seeds: Memo::new(),
        }
    }

    /// Returns the registry that is shared by the whole process.
    pub fn shared() -> &'static ConstantsRegistry {
        SHARED.get_or_init(ConstantsRegistry::new)
    }

    pub fn policy(&self) -> EscalationPolicy {
        self.policy
    }

    /// Returns 1/k!, correctly rounded into `format`.
    pub fn inverse_factorial(&self, format: Format, k: u32) -> FloatValue {
        self.inverse_factorials.get_or_compute((format, k), || {
            trace!(%format, k, "computing 1/k!");
            let factorial: BigUint = (1..=k).map(BigUint::from).product();
            FloatValue::from_ratio(format, false, &BigUint::one(), &factorial, 0)
        })
    }

    /// Returns 1/k, correctly rounded into `format`.
    pub fn inverse(&self, format: Format, k: u32) -> FloatValue {
        self.inverses.get_or_compute((format, k), || {
            trace!(%format, k, "computing 1/k");
            FloatValue::from_ratio(format, false, &BigUint::one(), &BigUint::from(k), 0)
        })
    }

    /// Returns ln(2), rounded into `format`.
    pub fn ln2(&self, format: Format) -> FloatValue {
        self.ln2.get_or_compute(format, || {
            trace!(%format, "computing ln(2)");
            // ln(2) = sum(1/(k * 2^k)) for k = 1, 2, ...
            let wide = format.extended(LN2_GUARD_BITS);
            let mut sum = FloatValue::zero(wide);
            for k in 1.. {
                let term = self.inverse(wide, k).scalb(-i64::from(k));
                let next = sum.add(&term);
                if next.is_identical(&sum) {
                    break;
                }
                sum = next;
            }
            sum.with_precision(format)
        })
    }

    /// Returns the constants 48/17 and 32/17 that seed the Newton iteration
    /// of the division.
    pub fn newton_seeds(&self, format: Format) -> (FloatValue, FloatValue) {
        self.newton_seeds.get_or_compute(format, || {
            trace!(%format, "computing Newton seeds");
            let seventeen = BigUint::from(17u32);
            (
                FloatValue::from_ratio(format, false, &BigUint::from(48u32), &seventeen, 0),
                FloatValue::from_ratio(format, false, &BigUint::from(32u32), &seventeen, 0),
            )
        })
    }

    /// Returns the number of memoized entries, over all tables.
    pub fn len(&self) -> usize {
        self.inverse_factorials.len()
            + self.inverses.len()
            + self.ln2.len()
            + self.newton_seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[test]
fn test_escalation_policy() {
    let policy = EscalationPolicy::default();
    let bits: Vec<u32> = policy.extra_bits().collect();
    assert_eq!(bits.len(), 10);
    assert_eq!(bits[0], 16);
    assert_eq!(bits[1], 32);
    assert_eq!(bits[9], 16 << 9);
    assert_eq!(policy.max_extra_bits(), 16 << 9);

    let none = EscalationPolicy {
        initial_extra_bits: 8,
        max_attempts: 0,
    };
    assert_eq!(none.extra_bits().count(), 0);
}

#[test]
fn test_registry_constants() {
    let registry = ConstantsRegistry::new();
    assert!(registry.is_empty());
    let f = Format::FLOAT64;

    let ln2 = registry.ln2(f);
    assert_eq!(ln2.f64_value(), core::f64::consts::LN_2);
    assert_eq!(registry.inverse(f, 3).f64_value(), 1. / 3.);
    assert_eq!(registry.inverse_factorial(f, 5).f64_value(), 1. / 120.);
    assert_eq!(registry.inverse_factorial(f, 0).f64_value(), 1.);
    let (c48, c32) = registry.newton_seeds(f);
    assert_eq!(c48.f64_value(), 48. / 17.);
    assert_eq!(c32.f64_value(), 32. / 17.);

    // Entries are computed once.
    let before = registry.len();
    let _ = registry.ln2(f);
    let _ = registry.inverse(f, 3);
    assert_eq!(registry.len(), before);

    let ln2 = registry.ln2(Format::FLOAT32);
    assert_eq!(ln2.f32_value(), core::f32::consts::LN_2);
}

#[test]
fn test_registry_concurrent_use() {
    let registry = ConstantsRegistry::new();
    let f = Format::FLOAT128;
    let results: Vec<FloatValue> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| registry.inverse_factorial(f, 20)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for r in &results {
        assert!(r.is_identical(&results[0]));
    }
    assert_eq!(registry.len(), 1);
}
