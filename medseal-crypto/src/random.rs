//! Fallible access to the OS random source.

use crate::error::{CryptoError, CryptoResult};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

/// Fills `buf` from the OS CSPRNG.
///
/// `OsRng` is stateless and safe to call from any number of threads.
pub(crate) fn fill_random(buf: &mut [u8]) -> CryptoResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|_| CryptoError::RandomSourceUnavailable)
}

/// A CSPRNG freshly seeded from the OS source.
///
/// The RSA backend draws through the infallible `fill_bytes`, which panics
/// if `OsRng` fails. Seeding here is the only OS read, so that failure
/// surfaces as `RandomSourceUnavailable` instead.
pub(crate) fn seeded_rng() -> CryptoResult<StdRng> {
    seed_from(OsRng)
}

fn seed_from<R: RngCore>(source: R) -> CryptoResult<StdRng> {
    StdRng::from_rng(source).map_err(|_| CryptoError::RandomSourceUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Entropy source that is always unavailable.
    struct DeadSource;

    impl RngCore for DeadSource {
        fn next_u32(&mut self) -> u32 {
            unreachable!("only try_fill_bytes is used for seeding")
        }

        fn next_u64(&mut self) -> u64 {
            unreachable!("only try_fill_bytes is used for seeding")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!("only try_fill_bytes is used for seeding")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::other("entropy pool closed")))
        }
    }

    #[test]
    fn dead_source_is_random_source_unavailable() {
        assert!(matches!(
            seed_from(DeadSource),
            Err(CryptoError::RandomSourceUnavailable)
        ));
    }

    #[test]
    fn seeded_rngs_are_independent() {
        let mut a = seeded_rng().unwrap();
        let mut b = seeded_rng().unwrap();
        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.fill_bytes(&mut x);
        b.fill_bytes(&mut y);
        assert_ne!(x, y);
    }

    #[test]
    fn fill_random_fills() {
        let mut buf = [0u8; 64];
        fill_random(&mut buf).unwrap();
        assert!(buf.iter().any(|&b| b != 0));
    }
}
