//! Human-memorable key generation for standard shares.
//!
//! Keys are two themed words plus a three-digit number, e.g.
//! `CLOUD-FOREST-482`. The key is the sole credential for a standard
//! share; it is not derived from any recipient secret.

use rand::Rng;

use smartcrypt_core::DecryptionKey;

const FIRST_WORDS: &[&str] = &["CLOUD", "STAR", "SKY", "MOON", "SUN", "WIND", "FIRE"];
const SECOND_WORDS: &[&str] = &["FOREST", "RIVER", "OCEAN", "MEADOW", "PEAK", "DAWN"];

/// Generate a fresh key.
pub fn generate_key<R: Rng + ?Sized>(rng: &mut R) -> DecryptionKey {
    let first = FIRST_WORDS[rng.gen_range(0..FIRST_WORDS.len())];
    let second = SECOND_WORDS[rng.gen_range(0..SECOND_WORDS.len())];
    let number: u16 = rng.gen_range(100..1000);
    DecryptionKey::new(format!("{first}-{second}-{number}"))
}
