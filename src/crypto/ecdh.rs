// SPDX-License-Identifier: MIT OR Apache-2.0

//! Elliptic-curve Diffie-Hellman key agreement between two secp256k1 parties.
//!
//! The shared secret is the x-coordinate of `our_secret * TheirPublicPoint` and is used
//! exclusively to wrap and unwrap one-time content keys, never to encrypt content directly. This
//! keeps content-key rotation independent of identity-key lifetime.
use k256::elliptic_curve::ecdh::diffie_hellman;

use crate::crypto::secp256k1::{PublicKey, SecretKey};
use crate::crypto::secret::Secret;

/// 256-bit shared secret.
pub const SHARED_SECRET_SIZE: usize = 32;

/// Symmetric secret shared between two key pairs, recomputed on demand and never persisted.
pub type SharedSecret = Secret<SHARED_SECRET_SIZE>;

/// Derives the ECDH shared secret between our secret key and their public key.
///
/// Symmetric by construction: `derive_shared_secret(a_secret, b_public)` equals
/// `derive_shared_secret(b_secret, a_public)` for any two valid key pairs, which is what lets
/// the author wrap a content key and the subscriber independently unwrap it.
pub fn derive_shared_secret(
    our_secret_key: &SecretKey,
    their_public_key: &PublicKey,
) -> SharedSecret {
    let shared = diffie_hellman(
        our_secret_key.to_nonzero_scalar(),
        their_public_key.as_affine(),
    );
    let mut bytes = [0u8; SHARED_SECRET_SIZE];
    bytes.copy_from_slice(shared.raw_secret_bytes().as_slice());
    Secret::from_bytes(bytes)
}
