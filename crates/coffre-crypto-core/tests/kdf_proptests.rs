#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for key derivation.

use coffre_crypto_core::kdf::{
    self, KdfParams, MIN_M_COST, MIN_VERIFICATION_ITERATIONS, SALT_LEN,
};
use proptest::prelude::*;

/// Smallest params the work floor accepts — keeps property runs tolerable.
const PROP_PARAMS: KdfParams = KdfParams {
    m_cost: MIN_M_COST,
    t_cost: 1,
    p_cost: 1,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Identical inputs always derive identical keys.
    #[test]
    fn derive_is_deterministic(
        secret in proptest::collection::vec(any::<u8>(), 1..64),
        salt in proptest::collection::vec(any::<u8>(), SALT_LEN..=SALT_LEN),
    ) {
        let a = kdf::derive(&secret, &salt, &PROP_PARAMS).expect("derive should succeed");
        let b = kdf::derive(&secret, &salt, &PROP_PARAMS).expect("derive should succeed");
        prop_assert_eq!(a.expose(), b.expose());
    }

    /// Verification hash and encryption key never coincide.
    #[test]
    fn hash_and_key_are_separated(
        secret in proptest::collection::vec(any::<u8>(), 1..64),
        salt in proptest::collection::vec(any::<u8>(), SALT_LEN..=SALT_LEN),
    ) {
        let key = kdf::derive(&secret, &salt, &PROP_PARAMS).expect("derive should succeed");
        let hash = kdf::hash_for_verification(&secret, &salt, MIN_VERIFICATION_ITERATIONS)
            .expect("hash should succeed");
        prop_assert_ne!(key.expose(), hash.as_slice());
    }

    /// A secret verifies against its own hash and no mutated variant does.
    #[test]
    fn verification_accepts_only_the_original_secret(
        secret in proptest::collection::vec(any::<u8>(), 1..64),
        salt in proptest::collection::vec(any::<u8>(), SALT_LEN..=SALT_LEN),
        flip in any::<u8>(),
    ) {
        let hash = kdf::hash_for_verification(&secret, &salt, MIN_VERIFICATION_ITERATIONS)
            .expect("hash should succeed");
        let ok = kdf::verify_against_hash(&secret, &salt, MIN_VERIFICATION_ITERATIONS, &hash)
            .expect("verify should succeed");
        prop_assert!(ok);

        let mut mutated = secret.clone();
        mutated[0] ^= flip | 1;
        let ok = kdf::verify_against_hash(&mutated, &salt, MIN_VERIFICATION_ITERATIONS, &hash)
            .expect("verify should succeed");
        prop_assert!(!ok);
    }
}
