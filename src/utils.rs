//! This file contains simple helper functions and test helpers.

/// Returns a mask full of 1s, of `b` bits. Saturates at 64 bits.
pub fn mask(b: usize) -> u64 {
    if b >= 64 {
        u64::MAX
    } else {
        (1u64 << b) - 1
    }
}

#[test]
fn test_masking() {
    assert_eq!(mask(0), 0x0);
    assert_eq!(mask(1), 0x1);
    assert_eq!(mask(8), 255);
    assert_eq!(mask(52), 0xf_ffff_ffff_ffff);
    assert_eq!(mask(64), u64::MAX);
}

#[cfg(test)]
/// Returns list of interesting values that various tests use to catch edge
/// cases: specials, boundaries of the f64 range and a few constants.
pub fn get_special_test_values() -> [f64; 23] {
    [
        -f64::NAN,
        f64::NAN,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::EPSILON,
        -f64::EPSILON,
        0.000000000000000000000000000000000000001,
        f64::MIN,
        f64::MAX,
        f64::MIN_POSITIVE,
        -5e-324,
        2.2250738585072004e-308,
        std::f64::consts::PI,
        std::f64::consts::LN_2,
        std::f64::consts::SQRT_2,
        std::f64::consts::E,
        0.0,
        -0.0,
        10.,
        -10.,
        -0.00001,
        0.1,
        355. / 113.,
    ]
}

/// Linear-feedback shift register. Tests use this as a deterministic random
/// number generator.
#[cfg(test)]
pub struct Lfsr {
    state: u32,
}

#[cfg(test)]
impl Default for Lfsr {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Lfsr {
    pub fn new() -> Lfsr {
        Lfsr { state: 0x13371337 }
    }

    /// Generate a new LFSR number generator that starts with a specific state.
    pub fn new_with_seed(seed: u32) -> Lfsr {
        Lfsr {
            state: 0x13371337 ^ seed,
        }
    }

    fn step(&mut self) {
        // Taps 25, 24, 23 and 18.
        let a = (self.state >> 24) & 1;
        let b = (self.state >> 23) & 1;
        let c = (self.state >> 22) & 1;
        let d = (self.state >> 17) & 1;
        let n = a ^ b ^ c ^ d ^ 1;
        self.state = (self.state << 1) | n;
    }

    /// Returns the next 32 random bits.
    pub fn get(&mut self) -> u32 {
        let mut res: u32 = 0;
        for _ in 0..32 {
            self.step();
            res = (res << 1) ^ (self.state & 0x1);
        }
        res
    }

    /// Returns the next 64 random bits.
    pub fn get64(&mut self) -> u64 {
        (u64::from(self.get()) << 32) | u64::from(self.get())
    }
}

#[cfg(test)]
impl Iterator for Lfsr {
    type Item = u64;
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.get64())
    }
}

#[test]
fn test_lfsr_balance() {
    let mut lfsr = Lfsr::new();

    // Count the number of bits, and the number of 1s.
    let mut items = 0;
    let mut ones = 0;
    for _ in 0..10000 {
        let u = lfsr.get();
        items += 32;
        ones += u.count_ones();
    }
    // Make sure that we have around 50% 1s and 50% zeros.
    assert!((ones as f64) < (0.55 * items as f64));
    assert!((ones as f64) > (0.45 * items as f64));
}

#[test]
fn test_lfsr_repetition() {
    let mut lfsr = Lfsr::new_with_seed(7);
    let first = lfsr.get();
    let second = lfsr.get();

    // Make sure that the items don't repeat themselves too frequently.
    for _ in 0..30000 {
        assert_ne!(first, lfsr.get());
        assert_ne!(second, lfsr.get());
    }
    assert_eq!(lfsr.take(3).count(), 3);
}
