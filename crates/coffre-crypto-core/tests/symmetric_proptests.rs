#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for AES-256-GCM sealing.

use coffre_crypto_core::symmetric::{decrypt, encrypt, SealedData, KEY_LEN};
use coffre_crypto_core::CryptoError;
use proptest::prelude::*;

/// Fixed key for property tests.
const PROP_KEY: [u8; KEY_LEN] = [0xCC; KEY_LEN];

proptest! {
    /// Encrypt→decrypt roundtrip always recovers the original plaintext.
    #[test]
    fn encrypt_decrypt_roundtrip(
        plaintext in proptest::collection::vec(any::<u8>(), 0..4096),
        aad in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let sealed = encrypt(&plaintext, &PROP_KEY, &aad)
            .expect("encrypt should succeed");
        let opened = decrypt(&sealed, &PROP_KEY, &aad)
            .expect("decrypt should succeed");
        prop_assert_eq!(opened.expose(), plaintext.as_slice());
    }

    /// Flipping any single ciphertext bit is always detected.
    #[test]
    fn any_bit_flip_fails_authentication(
        plaintext in proptest::collection::vec(any::<u8>(), 1..512),
        byte_index in any::<usize>(),
        bit in 0u8..8,
    ) {
        let mut sealed = encrypt(&plaintext, &PROP_KEY, &[])
            .expect("encrypt should succeed");
        let idx = byte_index % sealed.ciphertext.len();
        sealed.ciphertext[idx] ^= 1u8 << bit;
        let result = decrypt(&sealed, &PROP_KEY, &[]);
        prop_assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    /// A different key never opens the record.
    #[test]
    fn wrong_key_never_decrypts(
        plaintext in proptest::collection::vec(any::<u8>(), 0..512),
        wrong_byte in 0u8..=254,
    ) {
        let sealed = encrypt(&plaintext, &PROP_KEY, &[])
            .expect("encrypt should succeed");
        let mut wrong_key = PROP_KEY;
        wrong_key[0] = wrong_byte.wrapping_add(if wrong_byte == PROP_KEY[0] { 1 } else { 0 });
        prop_assume!(wrong_key != PROP_KEY);
        let result = decrypt(&sealed, &wrong_key, &[]);
        prop_assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    /// Wire-form serialization roundtrips losslessly.
    #[test]
    fn wire_form_roundtrip(
        plaintext in proptest::collection::vec(any::<u8>(), 0..1024),
    ) {
        let sealed = encrypt(&plaintext, &PROP_KEY, &[])
            .expect("encrypt should succeed");
        let restored = SealedData::from_bytes(&sealed.to_bytes())
            .expect("from_bytes should succeed");
        prop_assert_eq!(sealed, restored);
    }
}
