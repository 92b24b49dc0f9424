// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nostec-encryption` is the envelope-encryption core of the Nostec messaging prototype:
//! encrypted posts readable by every party subscribed to the author at posting time.
//!
//! ## Scheme
//!
//! Every encrypted post gets a fresh, one-time 256-bit content key. The content is encrypted
//! with AES-256-GCM under that key, and the key itself is then "wrapped" once per subscriber:
//! the author derives a shared secret with each subscriber via secp256k1 ECDH (Nostr-style
//! keys, x-coordinate shared secret) and encrypts the content key under it. The resulting
//! [`Envelope`] carries the content ciphertext and one `(identity, wrapped key)` entry per
//! subscriber.
//!
//! Readers look up their own entry, recompute the same shared secret from their side of the key
//! agreement, unwrap the content key and decrypt the post. Readers without an entry get a clean
//! [`OpenOutput::NotASubscriber`] answer, distinct from a decryption failure, so applications
//! can offer "subscribe to view" instead of reporting corruption.
//!
//! ## Boundaries
//!
//! This crate is a pure function library. The subscriber list comes from an external directory
//! (see [`traits::SubscriberDirectory`]), envelopes are handed back as values for the caller to
//! store, and key material is passed in explicitly; nothing here performs network or storage
//! I/O, and no operation aborts the process. Key pairs live in a [`Session`] between login and
//! logout and secrets are zeroised when dropped.
//!
//! Event signing and authorship authentication are deliberately out of scope and belong to the
//! surrounding system.
//!
//! ## Usage
//!
//! ```
//! use nostec_encryption::envelope::{OpenOutput, SubscriberRecord, open, seal};
//! use nostec_encryption::{KeyPair, Rng};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rng = Rng::default();
//! let author = KeyPair::generate(&rng)?;
//! let alice = KeyPair::generate(&rng)?;
//!
//! let subscribers = vec![SubscriberRecord {
//!     identity: "alice".to_string(),
//!     public_key: alice.public_key().to_hex(),
//! }];
//!
//! let envelope = seal(b"hello", author.secret_key(), &subscribers, &rng)?;
//!
//! let output = open(&envelope, "alice", alice.secret_key(), author.public_key())?;
//! assert_eq!(output, OpenOutput::Plaintext(b"hello".to_vec()));
//! # Ok(())
//! # }
//! ```
mod crypto;
pub mod envelope;
mod session;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

pub use crypto::aead::{
    AEAD_KEY_SIZE, AEAD_NONCE_SIZE, DecryptionError, EncryptionError, decrypt, encrypt,
};
pub use crypto::ecdh::{SHARED_SECRET_SIZE, SharedSecret, derive_shared_secret};
pub use crypto::secp256k1::{
    KeyError, KeyPair, PUBLIC_KEY_SIZE, PublicKey, SECRET_KEY_SIZE, SecretKey,
};
pub use crypto::{Rng, RngError, Secret};
pub use envelope::{
    CONTENT_KEY_SIZE, ContentKey, Envelope, OpenError, OpenOutput, SealError, SubscriberRecord,
    WrappedKey, generate_content_key,
};
pub use session::Session;
