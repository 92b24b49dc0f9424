// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic primitives: AEAD cipher, secp256k1 key material, ECDH key agreement, secure
//! randomness and secret containers.
pub mod aead;
pub mod ecdh;
mod rng;
pub mod secp256k1;
mod secret;

pub use rng::{Rng, RngError};
pub use secret::Secret;
