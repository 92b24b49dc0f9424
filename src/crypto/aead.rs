// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated encryption (AES-256-GCM) over arbitrary byte content under a caller-supplied
//! 256-bit key.
//!
//! The wire format is `base64(nonce ‖ ciphertext ‖ tag)` with a 12-byte nonce and a 16-byte
//! authentication tag, matching what the Nostec web client stores in the post record. A fresh
//! random nonce is drawn for every call; nonces are never reused under the same key short of a
//! 96-bit birthday collision.
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use crate::crypto::rng::{Rng, RngError};
use crate::crypto::secret::Secret;

/// 256-bit AEAD key.
pub const AEAD_KEY_SIZE: usize = 32;

/// 96-bit AEAD nonce, prepended to every ciphertext.
pub const AEAD_NONCE_SIZE: usize = 12;

/// Encrypts plaintext under the given key with a fresh random nonce and no additional
/// authenticated data. Returns `base64(nonce ‖ ciphertext ‖ tag)`.
pub fn encrypt(
    plaintext: &[u8],
    key: &Secret<AEAD_KEY_SIZE>,
    rng: &Rng,
) -> Result<String, EncryptionError> {
    let nonce: [u8; AEAD_NONCE_SIZE] = rng.random_array()?;

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| EncryptionError::Aead)?;

    let mut blob = Vec::with_capacity(AEAD_NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(blob))
}

/// Verifies and decrypts a `base64(nonce ‖ ciphertext ‖ tag)` blob under the given key.
///
/// A wrong key and a corrupted or truncated ciphertext are indistinguishable here, both surface
/// as [`DecryptionError::AuthenticationFailed`].
pub fn decrypt(blob: &str, key: &Secret<AEAD_KEY_SIZE>) -> Result<Vec<u8>, DecryptionError> {
    let blob = BASE64.decode(blob)?;
    if blob.len() < AEAD_NONCE_SIZE {
        return Err(DecryptionError::TruncatedNonce);
    }
    let (nonce, ciphertext) = blob.split_at(AEAD_NONCE_SIZE);

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| DecryptionError::AuthenticationFailed)
}

#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error(transparent)]
    Rng(#[from] RngError),

    #[error("aead encryption failed")]
    Aead,
}

#[derive(Debug, Error)]
pub enum DecryptionError {
    #[error("ciphertext is not valid base64")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("ciphertext is too short to contain a nonce")]
    TruncatedNonce,

    #[error("ciphertext does not authenticate under the given key")]
    AuthenticationFailed,
}
