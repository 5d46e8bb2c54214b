use crate::draw::DrawError;
use crate::RandGen;
use rand::{Error, RngCore, SeedableRng};
use rand_seeder::Seeder;
use serde::{Deserialize, Serialize};

/// Second-order linear congruential generator (Knuth, TAOCP vol. 2, p. 108).
///
/// The sequence only depends on the two seeds and the constants below, so a draw is reproducible
/// on any platform and by any other implementation using the same recurrence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KnuthRng {
    state0: u32,
    state1: u32,
}

impl KnuthRng {
    const A1: u64 = 271_828_183;
    const A2: u64 = 314_159_269;
    /// 2^31 - 1
    const M: u64 = 2_147_483_647;

    /// Creates a generator seeded with `seeds`.
    #[inline]
    pub fn new(seeds: Seeds) -> Self {
        let mut rng = Self::default();
        rng.seed(seeds.first, seeds.second);
        rng
    }

    /// Resets the state. A zero seed is replaced by 1, since an all-zero state only yields zeros.
    pub fn seed(&mut self, s0: u32, s1: u32) {
        self.state0 = (u64::from(s0.max(1)) % Self::M) as u32;
        self.state1 = (u64::from(s1.max(1)) % Self::M) as u32;
    }

    /// Returns the next value of the sequence, always lower than 2^31 - 1.
    #[inline]
    pub fn next(&mut self) -> u32 {
        let state2 =
            (Self::A1 * u64::from(self.state1) + Self::A2 * u64::from(self.state0)) % Self::M;
        self.state0 = self.state1;
        self.state1 = state2 as u32;
        self.state1
    }
}

impl Default for KnuthRng {
    #[inline]
    fn default() -> Self {
        KnuthRng {
            state0: 1,
            state1: 1,
        }
    }
}

impl RngCore for KnuthRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next());
        let high = u64::from(self.next());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for KnuthRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        let [a, b, c, d, e, f, g, h] = seed;
        KnuthRng::new(Seeds {
            first: u32::from_le_bytes([a, b, c, d]),
            second: u32::from_le_bytes([e, f, g, h]),
        })
    }
}

/// The two seeds of a draw.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Seeds {
    /// Seed of the first state word.
    pub first: u32,
    /// Seed of the second state word.
    pub second: u32,
}

impl Seeds {
    #[inline]
    pub fn new(first: u32, second: u32) -> Self {
        Seeds { first, second }
    }

    /// Derives the seeds from a phrase, e.g. the name of the event announced before the draw.
    pub fn from_phrase(phrase: &str) -> Self {
        let mut rng: RandGen = Seeder::from(phrase).make_rng();
        Seeds {
            first: rng.next_u32(),
            second: rng.next_u32(),
        }
    }

    /// Parses both seeds with [`parse_seed`].
    pub fn parse(first: &str, second: &str) -> Result<Self, DrawError> {
        Ok(Seeds {
            first: parse_seed(first)?,
            second: parse_seed(second)?,
        })
    }
}

impl Default for Seeds {
    #[inline]
    fn default() -> Self {
        Seeds::new(1, 1)
    }
}

/// Parses a seed written in decimal, hexadecimal (`0x` prefix) or octal (leading `0`).
pub fn parse_seed(s: &str) -> Result<u32, DrawError> {
    let s = s.trim();
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    // from_str_radix accepts a leading '+'
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(DrawError::InvalidSeed(s.to_owned()));
    }
    u32::from_str_radix(digits, radix).map_err(|_| DrawError::InvalidSeed(s.to_owned()))
}

/// Wraps a [`KnuthRng`] and counts the values drawn from it.
#[cfg(test)]
pub(crate) struct CountingRng {
    inner: KnuthRng,
    draws: std::rc::Rc<std::cell::Cell<usize>>,
}

#[cfg(test)]
impl CountingRng {
    pub(crate) fn new() -> Self {
        CountingRng {
            inner: KnuthRng::default(),
            draws: Default::default(),
        }
    }

    pub(crate) fn draws(&self) -> usize {
        self.draws.get()
    }

    /// Shared counter, still readable once the generator has been moved into a draw.
    pub(crate) fn counter(&self) -> std::rc::Rc<std::cell::Cell<usize>> {
        self.draws.clone()
    }
}

#[cfg(test)]
impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.draws.set(self.draws.get() + 1);
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        unimplemented!()
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        unimplemented!()
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), Error> {
        unimplemented!()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{thread_rng, Rng};

    fn take(rng: &mut KnuthRng, n: usize) -> Vec<u32> {
        (0..n).map(|_| rng.next()).collect()
    }

    #[test]
    fn test_known_sequence() {
        let mut rng = KnuthRng::new(Seeds::new(1, 1));
        // (271828183 + 314159269) mod (2^31 - 1)
        assert_eq!(rng.next(), 585_987_452);
        // (271828183 * 585987452 + 314159269) mod (2^31 - 1)
        let expected = ((271_828_183u64 * 585_987_452 + 314_159_269) % 2_147_483_647) as u32;
        assert_eq!(rng.next(), expected);
    }

    #[test]
    fn test_default_is_seeded_with_ones() {
        assert_eq!(KnuthRng::default(), KnuthRng::new(Seeds::new(1, 1)));
    }

    #[test]
    fn test_zero_seed_remap() {
        let mut rng = thread_rng();
        for _ in 0..50 {
            let other: u32 = rng.gen();

            let mut zero_first = KnuthRng::new(Seeds::new(0, other));
            let mut one_first = KnuthRng::new(Seeds::new(1, other));
            assert_eq!(take(&mut zero_first, 20), take(&mut one_first, 20));

            let mut zero_second = KnuthRng::new(Seeds::new(other, 0));
            let mut one_second = KnuthRng::new(Seeds::new(other, 1));
            assert_eq!(take(&mut zero_second, 20), take(&mut one_second, 20));
        }
    }

    #[test]
    fn test_seeds_reduced_modulo() {
        let mut reduced = KnuthRng::new(Seeds::new(5, 7));
        let mut unreduced = KnuthRng::new(Seeds::new(5 + 2_147_483_647, 7));
        assert_eq!(take(&mut reduced, 10), take(&mut unreduced, 10));
    }

    #[test]
    fn test_reproducibility() {
        let mut rng = thread_rng();
        for _ in 0..50 {
            let seeds = Seeds::new(rng.gen(), rng.gen());
            let expected = take(&mut KnuthRng::new(seeds), 100);
            for _ in 0..10 {
                assert_eq!(take(&mut KnuthRng::new(seeds), 100), expected);
            }
        }
    }

    #[test]
    fn test_values_below_modulus() {
        let mut rng = KnuthRng::new(Seeds::new(u32::MAX, u32::MAX));
        assert!(take(&mut rng, 1000).into_iter().all(|v| v < 2_147_483_647));
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut rng = KnuthRng::new(Seeds::new(42, 43));
        let first = take(&mut rng, 10);
        rng.seed(42, 43);
        assert_eq!(take(&mut rng, 10), first);
    }

    #[test]
    fn test_rng_core_uses_same_sequence() {
        let mut plain = KnuthRng::new(Seeds::new(3, 4));
        let mut core = plain.clone();

        let a = plain.next();
        let b = plain.next();
        assert_eq!(core.next_u64(), (u64::from(b) << 32) | u64::from(a));

        let c = plain.next();
        let d = plain.next();
        let mut bytes = [0u8; 6];
        core.fill_bytes(&mut bytes);
        assert_eq!(bytes[..4], c.to_le_bytes());
        assert_eq!(bytes[4..], d.to_le_bytes()[..2]);
    }

    #[test]
    fn test_from_seed() {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&12345u32.to_le_bytes());
        bytes[4..].copy_from_slice(&678u32.to_le_bytes());
        assert_eq!(
            KnuthRng::from_seed(bytes),
            KnuthRng::new(Seeds::new(12345, 678))
        );
        assert_eq!(KnuthRng::from_seed([0; 8]), KnuthRng::default());
    }

    #[test]
    fn test_phrase_seeds() {
        let seeds = Seeds::from_phrase("RoboCup 2026 Small Size League");
        assert_eq!(seeds, Seeds::from_phrase("RoboCup 2026 Small Size League"));
        assert_ne!(seeds, Seeds::from_phrase("RoboCup 2027 Small Size League"));
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("0").unwrap(), 0);
        assert_eq!(parse_seed("1234").unwrap(), 1234);
        assert_eq!(parse_seed(" 42 ").unwrap(), 42);
        assert_eq!(parse_seed("0x1F").unwrap(), 31);
        assert_eq!(parse_seed("0XdeadBEEF").unwrap(), 0xDEAD_BEEF);
        assert_eq!(parse_seed("017").unwrap(), 15);
        assert_eq!(parse_seed("4294967295").unwrap(), u32::MAX);

        for invalid in ["", "abc", "-1", "+1", "12abc", "0x", "09", "4294967296", "1 2"] {
            assert!(
                matches!(parse_seed(invalid), Err(DrawError::InvalidSeed(_))),
                "{invalid:?} should be rejected"
            );
        }
    }
}
