use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::aead::{
    Aad, BoundKey, Nonce, NonceSequence, OpeningKey, SealingKey, UnboundKey, AES_256_GCM,
};
use ring::digest;
use ring::error::Unspecified;
use secrecy::ExposeSecret;

use crate::config::Config;

const NONCE_LEN: usize = 12;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("Encryption key material is absent or empty")]
    MissingKey,

    #[error("Card number encryption failed")]
    EncryptionFailed,

    #[error("Card number decryption failed")]
    DecryptionFailed,

    #[error("Ciphertext is not valid base64")]
    InvalidFormat,
}

impl From<Unspecified> for CryptoError {
    fn from(_: Unspecified) -> Self {
        CryptoError::EncryptionFailed
    }
}

struct FixedNonceSequence {
    nonce: [u8; NONCE_LEN],
}

impl FixedNonceSequence {
    fn new(nonce: [u8; NONCE_LEN]) -> Self {
        Self { nonce }
    }
}

impl NonceSequence for FixedNonceSequence {
    fn advance(&mut self) -> Result<Nonce, Unspecified> {
        Nonce::try_assume_unique_for_key(&self.nonce)
    }
}

/// Reversible card-number codec, AES-256-GCM over a key derived from the
/// configured key material, base64 text output.
///
/// Deliberately **deterministic**: the nonce is fixed per key, so equal
/// plaintexts always yield equal ciphertexts. Duplicate detection across
/// the store compares ciphertexts and depends on this. The cost is that
/// equal card numbers are observable as equal ciphertexts without the
/// key; a scheme wanting both semantic security and dedup would pair
/// randomized encryption with a separate keyed blind index.
#[derive(Clone)]
pub struct CardCodec {
    key: [u8; 32],
    nonce: [u8; NONCE_LEN],
}

impl CardCodec {
    /// Builds a codec from raw key material. The key material is hashed
    /// with SHA-256 into the AES key; the nonce is derived from the same
    /// material under a separate label.
    pub fn new(key_material: &str) -> Result<Self, CryptoError> {
        if key_material.is_empty() {
            return Err(CryptoError::MissingKey);
        }

        let key = derive_key(key_material);

        let mut labeled = key.to_vec();
        labeled.extend_from_slice(b"cardvault.nonce");
        let nonce_hash = digest::digest(&digest::SHA256, &labeled);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&nonce_hash.as_ref()[..NONCE_LEN]);

        Ok(Self { key, nonce })
    }

    /// Builds the process-wide codec from configuration. The configured
    /// salt is intentionally not consumed; only the key material feeds
    /// the derivation.
    pub fn from_config(config: &Config) -> Result<Self, CryptoError> {
        Self::new(config.encryption_key.expose_secret())
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let unbound_key = UnboundKey::new(&AES_256_GCM, &self.key)?;
        let mut sealing_key =
            SealingKey::new(unbound_key, FixedNonceSequence::new(self.nonce));

        let mut in_out = plaintext.as_bytes().to_vec();
        sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(BASE64.encode(in_out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let mut in_out = BASE64
            .decode(ciphertext)
            .map_err(|_| CryptoError::InvalidFormat)?;

        let unbound_key = UnboundKey::new(&AES_256_GCM, &self.key)?;
        let mut opening_key =
            OpeningKey::new(unbound_key, FixedNonceSequence::new(self.nonce));

        let plaintext = opening_key
            .open_in_place(Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Derive a 32-byte AES key from a string via SHA-256.
fn derive_key(key_material: &str) -> [u8; 32] {
    let hash = digest::digest(&digest::SHA256, key_material.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(hash.as_ref());
    key
}

/// Display masking: reveal the first four and last four characters,
/// replace everything between with `*`. Inputs of eight characters or
/// fewer are returned unchanged (there is no middle to hide).
pub fn mask(number: &str) -> String {
    let len = number.chars().count();
    if len <= 8 {
        return number.to_string();
    }

    let mut masked = String::with_capacity(len);
    masked.extend(number.chars().take(4));
    masked.extend(std::iter::repeat('*').take(len - 8));
    masked.extend(number.chars().skip(len - 4));
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CardCodec {
        CardCodec::new("test-encryption-key-32-bytes-minimum").unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let codec = codec();

        for plaintext in ["4456897999999999", "x", ""] {
            let encrypted = codec.encrypt(plaintext).unwrap();
            assert_eq!(codec.decrypt(&encrypted).unwrap(), plaintext);
        }
    }

    #[test]
    fn encryption_is_deterministic() {
        let codec = codec();

        let first = codec.encrypt("4456897999999999").unwrap();
        let second = codec.encrypt("4456897999999999").unwrap();

        // Ciphertext equality is what batch dedup relies on.
        assert_eq!(first, second);
    }

    #[test]
    fn ciphertext_differs_from_plaintext() {
        let codec = codec();
        let plaintext = "4456897999999999";

        assert_ne!(codec.encrypt(plaintext).unwrap(), plaintext);
    }

    #[test]
    fn distinct_plaintexts_distinct_ciphertexts() {
        let codec = codec();

        assert_ne!(
            codec.encrypt("4456897999999991").unwrap(),
            codec.encrypt("4456897999999992").unwrap()
        );
    }

    #[test]
    fn wrong_key_fails_decrypt() {
        let encrypted = codec().encrypt("4456897999999999").unwrap();
        let other = CardCodec::new("a-completely-different-key").unwrap();

        assert!(matches!(
            other.decrypt(&encrypted),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(
            codec().decrypt("not!!valid%%base64"),
            Err(CryptoError::InvalidFormat)
        ));
    }

    #[test]
    fn corrupt_ciphertext_is_rejected() {
        let codec = codec();
        let mut bytes = BASE64.decode(codec.encrypt("4456897999999999").unwrap()).unwrap();
        bytes[0] ^= 0x01;

        assert!(matches!(
            codec.decrypt(&BASE64.encode(bytes)),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn empty_key_material_is_rejected() {
        assert!(matches!(CardCodec::new(""), Err(CryptoError::MissingKey)));
    }

    #[test]
    fn mask_sixteen_digits() {
        assert_eq!(mask("1234567890123456"), "1234********3456");
    }

    #[test]
    fn mask_nineteen_digits() {
        assert_eq!(mask("1234567890123456789"), "1234***********6789");
    }

    #[test]
    fn mask_leaves_short_input_unmasked() {
        assert_eq!(mask("12345678"), "12345678");
        assert_eq!(mask("1234"), "1234");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn mask_nine_characters() {
        assert_eq!(mask("123456789"), "1234*6789");
    }
}
