//! Random payment references.

use crate::config::{PaymentSettings, DEFAULT_REFERENCE_LENGTH};
use rand::Rng;
use tracing::warn;

/// Characters a reference is drawn from
pub const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `prefix` followed by `length` random characters from [`REFERENCE_ALPHABET`]
pub fn generate_reference<R: Rng + ?Sized>(prefix: &str, length: usize, rng: &mut R) -> String {
    let mut reference = String::with_capacity(prefix.len() + length);
    reference.push_str(prefix);
    reference.extend((0..length).map(|_| {
        let i = rng.random_range(0..REFERENCE_ALPHABET.len());
        char::from(REFERENCE_ALPHABET[i])
    }));
    reference
}

impl PaymentSettings {
    /// Fresh reference from the configured prefix and length
    #[must_use]
    pub fn reference(&self) -> String {
        let length = if self.reference_length == 0 {
            warn!(
                fallback = DEFAULT_REFERENCE_LENGTH,
                "payment reference length is 0, using default"
            );
            DEFAULT_REFERENCE_LENGTH
        } else {
            self.reference_length
        };
        generate_reference(&self.reference_prefix, length, &mut rand::rng())
    }
}
