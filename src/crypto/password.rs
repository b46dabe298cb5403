//! Random strong password generation.

use rand::Rng;

/// Default length of a generated password.
pub const DEFAULT_LENGTH: usize = 16;

/// ASCII letters, digits, and the 32 ASCII punctuation characters.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\
0123456789\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Draw `length` characters independently and uniformly from `ALPHABET`.
///
/// Uses the thread-local CSPRNG (ChaCha, seeded from the OS).
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}
