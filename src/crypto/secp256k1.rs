// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nostr-style secp256k1 key material, hex-encoded end-to-end.
//!
//! Secret keys are 64 hex characters (a 32-byte scalar). Public keys travel either as 128 hex
//! characters (uncompressed x ‖ y with the SEC1 format byte stripped, as the Nostec client
//! stores them) or as 64 hex characters (x-coordinate only).
//!
//! An x-only coordinate is ambiguous between two curve points. This crate always reconstitutes
//! the even-parity (`0x02` prefix) candidate, on both the wrap and unwrap paths, so both sides
//! of a key agreement arrive at the same point.
use std::fmt;
use std::str::FromStr;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::rng::{Rng, RngError};

/// Size of a secret key scalar.
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of an uncompressed public key (x ‖ y, without the SEC1 format byte).
pub const PUBLIC_KEY_SIZE: usize = 64;

/// secp256k1 secret key.
///
/// Holders never persist this server-side; it lives in a [`Session`](crate::Session) for the
/// lifetime of a login and is zeroised on drop.
#[derive(Clone)]
pub struct SecretKey(k256::SecretKey);

impl SecretKey {
    /// Validates and imports a 32-byte scalar. Zero and values at or above the curve order are
    /// rejected.
    pub fn from_bytes(bytes: [u8; SECRET_KEY_SIZE]) -> Result<Self, KeyError> {
        let secret_key =
            k256::SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self(secret_key))
    }

    /// Generates a fresh secret key from the given random number generator.
    pub fn from_rng(rng: &Rng) -> Result<Self, KeyError> {
        // Rejection sampling. A uniform 32-byte string misses the scalar field with probability
        // around 2^-128.
        loop {
            let candidate: [u8; SECRET_KEY_SIZE] = rng.random_array()?;
            if let Ok(secret_key) = k256::SecretKey::from_slice(&candidate) {
                return Ok(Self(secret_key));
            }
        }
    }

    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.0.to_bytes().into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub(crate) fn to_nonzero_scalar(&self) -> k256::NonZeroScalar {
        self.0.to_nonzero_scalar()
    }
}

impl FromStr for SecretKey {
    type Err = KeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(value)?;
        let bytes: [u8; SECRET_KEY_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKeyLength(bytes.len()))?;
        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not reveal the scalar when printing debug info.
        f.debug_struct("SecretKey").field("value", &"***").finish()
    }
}

/// secp256k1 public key, guaranteed to be a valid curve point.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Reconstitutes a public key from its x-coordinate alone, using the even-parity candidate
    /// point as the canonical convention.
    pub fn from_x_only_bytes(bytes: &[u8; SECRET_KEY_SIZE]) -> Result<Self, KeyError> {
        let mut sec1 = [0u8; 33];
        sec1[0] = 0x02;
        sec1[1..].copy_from_slice(bytes);
        let public_key =
            k256::PublicKey::from_sec1_bytes(&sec1).map_err(|_| KeyError::InvalidPoint)?;
        Ok(Self(public_key))
    }

    /// Imports an uncompressed public key (x ‖ y) with the SEC1 format byte already stripped.
    pub fn from_uncompressed_bytes(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Result<Self, KeyError> {
        let mut sec1 = [0u8; 65];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(bytes);
        let public_key =
            k256::PublicKey::from_sec1_bytes(&sec1).map_err(|_| KeyError::InvalidPoint)?;
        Ok(Self(public_key))
    }

    /// Uncompressed x ‖ y hex string (128 characters, format byte stripped).
    pub fn to_hex(&self) -> String {
        let point = self.0.to_encoded_point(false);
        hex::encode(&point.as_bytes()[1..])
    }

    /// X-coordinate hex string (64 characters).
    pub fn to_x_only_hex(&self) -> String {
        let point = self.0.to_encoded_point(false);
        hex::encode(&point.as_bytes()[1..33])
    }

    pub(crate) fn as_affine(&self) -> &k256::AffinePoint {
        self.0.as_affine()
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(value)?;
        match bytes.len() {
            32 => {
                let bytes: [u8; 32] = bytes.as_slice().try_into().expect("length checked");
                Self::from_x_only_bytes(&bytes)
            }
            64 => {
                let bytes: [u8; 64] = bytes.as_slice().try_into().expect("length checked");
                Self::from_uncompressed_bytes(&bytes)
            }
            len => Err(KeyError::InvalidPublicKeyLength(len)),
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value
            .parse()
            .map_err(|err: KeyError| serde::de::Error::custom(err.to_string()))
    }
}

/// Secret and public key of one party.
#[derive(Clone, Debug)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generates a fresh key pair, as on account creation.
    pub fn generate(rng: &Rng) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_rng(rng)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Re-derives the key pair from an imported secret key, as on login.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error(transparent)]
    Rng(#[from] RngError),

    #[error("invalid hex encoding in key string")]
    InvalidHexEncoding(#[from] hex::FromHexError),

    #[error("invalid secret key length {0} bytes, expected 32 bytes")]
    InvalidSecretKeyLength(usize),

    #[error("invalid public key length {0} bytes, expected 32 or 64 bytes")]
    InvalidPublicKeyLength(usize),

    #[error("secret key scalar is zero or exceeds the curve order")]
    InvalidScalar,

    #[error("public key is not a valid secp256k1 point")]
    InvalidPoint,
}
