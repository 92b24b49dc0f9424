// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope encryption for posts readable by every current subscriber of an author.
//!
//! Sealing a post draws a fresh one-time [`ContentKey`], encrypts the content with it and then
//! wraps that key once per subscriber: an ECDH secret is derived between the author's secret key
//! and the subscriber's public key and used to AEAD-encrypt the content key. The resulting
//! [`Envelope`] carries the content ciphertext plus one wrapped-key entry per subscriber and is
//! immutable once stored.
//!
//! Opening scans the wrapped-key list for the reader's own identity. Readers who are not listed
//! get [`OpenOutput::NotASubscriber`], which is the expected outcome for the general public and
//! distinct from a decryption failure. Listed readers recompute the same ECDH secret from their
//! side (the agreement is symmetric), unwrap the content key and decrypt the content.
//!
//! Both operations are pure: sealing has no effect beyond consuming randomness, and opening the
//! same envelope twice yields the same result. Wrapping is independent per subscriber, so a
//! malformed subscriber key skips that entry and the post still reaches everyone else.
//!
//! A post sealed with no subscribers is a valid envelope that nobody can open; the content key
//! is dropped with the call frame and the ciphertext is unrecoverable. Callers get the same
//! `NotASubscriber` answer for every identity.
use std::fmt;

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::crypto::aead::{self, AEAD_KEY_SIZE, DecryptionError, EncryptionError};
use crate::crypto::ecdh::derive_shared_secret;
use crate::crypto::secp256k1::{PublicKey, SecretKey};
use crate::crypto::{Rng, RngError, Secret};

/// 256-bit one-time content key, generated fresh for every sealed post.
pub const CONTENT_KEY_SIZE: usize = AEAD_KEY_SIZE;

/// Symmetric key a post's content is encrypted under.
///
/// Exists only transiently in memory and, wrapped per subscriber, inside the envelope. Never
/// stored or transmitted in the clear.
pub type ContentKey = Secret<CONTENT_KEY_SIZE>;

/// Tag name under which wrapped keys are attached to a stored post record.
pub const WRAPPED_KEY_TAG: &str = "k";

/// One row of the subscription directory: who subscribed and the public key to wrap towards.
///
/// The directory is external; the core treats this as a read-only value fetched once per
/// outgoing post. The public key is hex, either 128 characters (uncompressed x ‖ y) or 64
/// characters (x-only).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    pub identity: String,
    pub public_key: String,
}

/// Content key wrapped towards one recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedKey {
    identity: String,
    wrapped: String,
}

impl WrappedKey {
    /// Identity of the recipient who can unwrap this entry.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The content key, AEAD-encrypted under the ECDH secret, as base64.
    pub fn wrapped(&self) -> &str {
        &self.wrapped
    }
}

// Wrapped keys travel as `[identity, wrapped]` pairs, the list shape the storage layer attaches
// to a post record.
impl Serialize for WrappedKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.identity)?;
        seq.serialize_element(&self.wrapped)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for WrappedKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PairVisitor;

        impl<'de> Visitor<'de> for PairVisitor {
            type Value = WrappedKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("pair of identity and wrapped key strings")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let identity = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let wrapped = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                Ok(WrappedKey { identity, wrapped })
            }
        }

        deserializer.deserialize_seq(PairVisitor)
    }
}

/// Encrypted post payload: the content ciphertext and one wrapped content key per subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    ciphertext: String,
    wrapped_keys: Vec<WrappedKey>,
}

impl Envelope {
    /// Content ciphertext, `base64(nonce ‖ ciphertext ‖ tag)`.
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    /// Wrapped-key entries in subscriber order, at most one per identity.
    pub fn wrapped_keys(&self) -> &[WrappedKey] {
        &self.wrapped_keys
    }

    /// Returns the first wrapped-key entry for the given identity, if any.
    pub fn wrapped_key_for(&self, identity: &str) -> Option<&WrappedKey> {
        self.wrapped_keys
            .iter()
            .find(|entry| entry.identity == identity)
    }

    /// Converts the wrapped-key list into post-record tags, one
    /// `["k", identity, wrapped]` tag per entry.
    pub fn to_tags(&self) -> Vec<Vec<String>> {
        self.wrapped_keys
            .iter()
            .map(|entry| {
                vec![
                    WRAPPED_KEY_TAG.to_string(),
                    entry.identity.clone(),
                    entry.wrapped.clone(),
                ]
            })
            .collect()
    }

    /// Reassembles an envelope from a stored post's content field and tags. Tags which are not
    /// well-formed wrapped-key tags are ignored.
    pub fn from_tags(ciphertext: impl Into<String>, tags: &[Vec<String>]) -> Self {
        let wrapped_keys = tags
            .iter()
            .filter_map(|tag| match tag.as_slice() {
                [name, identity, wrapped] if name == WRAPPED_KEY_TAG => Some(WrappedKey {
                    identity: identity.clone(),
                    wrapped: wrapped.clone(),
                }),
                _ => None,
            })
            .collect();
        Self {
            ciphertext: ciphertext.into(),
            wrapped_keys,
        }
    }
}

/// Result of attempting to open an envelope as a particular reader.
#[derive(Debug, PartialEq, Eq)]
pub enum OpenOutput {
    /// The reader was listed and the content decrypted.
    Plaintext(Vec<u8>),

    /// No wrapped key for this identity. Expected for anyone who is not subscribed; not an
    /// error.
    NotASubscriber,
}

/// Generates a fresh one-time content key.
pub fn generate_content_key(rng: &Rng) -> Result<ContentKey, RngError> {
    Ok(Secret::from_bytes(rng.random_array()?))
}

/// Seals content towards the author's current subscribers.
///
/// Wrapping is independent per subscriber. A record with a malformed public key is logged and
/// skipped without failing the post, and later records repeating an identity already wrapped
/// towards are dropped so that each identity appears at most once. An empty subscriber list
/// produces a valid envelope with no wrapped keys.
pub fn seal(
    content: &[u8],
    author_secret_key: &SecretKey,
    subscribers: &[SubscriberRecord],
    rng: &Rng,
) -> Result<Envelope, SealError> {
    let content_key = generate_content_key(rng)?;
    let ciphertext = aead::encrypt(content, &content_key, rng)?;

    let mut wrapped_keys: Vec<WrappedKey> = Vec::with_capacity(subscribers.len());
    for record in subscribers {
        if wrapped_keys
            .iter()
            .any(|entry| entry.identity == record.identity)
        {
            debug!(identity = %record.identity, "skipping duplicate subscriber entry");
            continue;
        }

        let public_key: PublicKey = match record.public_key.parse() {
            Ok(public_key) => public_key,
            Err(err) => {
                warn!(
                    identity = %record.identity,
                    "skipping subscriber with malformed public key: {err}"
                );
                continue;
            }
        };

        let secret = derive_shared_secret(author_secret_key, &public_key);
        let wrapped = aead::encrypt(content_key.as_bytes(), &secret, rng)?;
        wrapped_keys.push(WrappedKey {
            identity: record.identity.clone(),
            wrapped,
        });
    }

    Ok(Envelope {
        ciphertext,
        wrapped_keys,
    })
}

/// Opens an envelope as the given reader.
///
/// Returns [`OpenOutput::NotASubscriber`] when the reader's identity has no wrapped-key entry.
/// A present entry that fails to unwrap or decrypt (stale or mismatched keys, tampered data)
/// surfaces as an error instead, so callers can tell "subscribe to view" apart from corruption.
pub fn open(
    envelope: &Envelope,
    reader_identity: &str,
    reader_secret_key: &SecretKey,
    author_public_key: &PublicKey,
) -> Result<OpenOutput, OpenError> {
    let Some(entry) = envelope.wrapped_key_for(reader_identity) else {
        return Ok(OpenOutput::NotASubscriber);
    };

    let secret = derive_shared_secret(reader_secret_key, author_public_key);
    let mut key_bytes = aead::decrypt(&entry.wrapped, &secret)?;

    let content_key: ContentKey = match <[u8; CONTENT_KEY_SIZE]>::try_from(key_bytes.as_slice()) {
        Ok(bytes) => Secret::from_bytes(bytes),
        Err(_) => {
            let len = key_bytes.len();
            key_bytes.zeroize();
            return Err(OpenError::InvalidContentKeyLength(len));
        }
    };
    key_bytes.zeroize();

    let plaintext = aead::decrypt(envelope.ciphertext(), &content_key)?;
    Ok(OpenOutput::Plaintext(plaintext))
}

#[derive(Debug, Error)]
pub enum SealError {
    #[error(transparent)]
    Rng(#[from] RngError),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),
}

#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    #[error("unwrapped content key has {0} bytes, expected 32 bytes")]
    InvalidContentKeyLength(usize),
}

#[cfg(test)]
mod tests {
    use crate::crypto::Rng;
    use crate::crypto::aead::DecryptionError;
    use crate::crypto::secp256k1::KeyPair;

    use super::{Envelope, OpenError, OpenOutput, SubscriberRecord, open, seal};

    fn subscriber(identity: &str, key_pair: &KeyPair) -> SubscriberRecord {
        SubscriberRecord {
            identity: identity.to_string(),
            public_key: key_pair.public_key().to_hex(),
        }
    }

    #[test]
    fn subscriber_round_trip() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();

        let envelope = seal(
            b"meet me at the usual place",
            author.secret_key(),
            &[subscriber("alice", &alice)],
            &rng,
        )
        .unwrap();

        let output = open(
            &envelope,
            "alice",
            alice.secret_key(),
            author.public_key(),
        )
        .unwrap();
        assert_eq!(
            output,
            OpenOutput::Plaintext(b"meet me at the usual place".to_vec())
        );
    }

    #[test]
    fn alice_and_bob_scenario() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();
        let bob = KeyPair::generate(&rng).unwrap();

        let envelope = seal(
            b"hello",
            author.secret_key(),
            &[subscriber("alice", &alice)],
            &rng,
        )
        .unwrap();

        // Exactly one wrapped key, tagged for alice.
        assert_eq!(envelope.wrapped_keys().len(), 1);
        assert_eq!(envelope.wrapped_keys()[0].identity(), "alice");

        // Bob is not subscribed.
        let bob_output = open(&envelope, "bob", bob.secret_key(), author.public_key()).unwrap();
        assert_eq!(bob_output, OpenOutput::NotASubscriber);

        // Alice decrypts.
        let alice_output =
            open(&envelope, "alice", alice.secret_key(), author.public_key()).unwrap();
        assert_eq!(alice_output, OpenOutput::Plaintext(b"hello".to_vec()));
    }

    #[test]
    fn empty_subscriber_list() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let reader = KeyPair::generate(&rng).unwrap();

        let envelope = seal(b"into the void", author.secret_key(), &[], &rng).unwrap();
        assert!(envelope.wrapped_keys().is_empty());

        // Nobody can open it, not even the author.
        for identity in ["author", "reader", ""] {
            let output = open(
                &envelope,
                identity,
                reader.secret_key(),
                author.public_key(),
            )
            .unwrap();
            assert_eq!(output, OpenOutput::NotASubscriber);
        }
    }

    #[test]
    fn malformed_subscriber_key_is_skipped() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();

        let subscribers = [
            SubscriberRecord {
                identity: "mallory".to_string(),
                public_key: "zz not hex".to_string(),
            },
            subscriber("alice", &alice),
        ];

        let envelope = seal(b"carry on", author.secret_key(), &subscribers, &rng).unwrap();

        // Mallory's broken record does not abort the post; alice still gets her key.
        assert_eq!(envelope.wrapped_keys().len(), 1);
        assert_eq!(envelope.wrapped_keys()[0].identity(), "alice");

        let output = open(&envelope, "alice", alice.secret_key(), author.public_key()).unwrap();
        assert_eq!(output, OpenOutput::Plaintext(b"carry on".to_vec()));
    }

    #[test]
    fn duplicate_identities_wrap_once() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();
        let impostor = KeyPair::generate(&rng).unwrap();

        let subscribers = [subscriber("alice", &alice), subscriber("alice", &impostor)];
        let envelope = seal(b"first one wins", author.secret_key(), &subscribers, &rng).unwrap();

        assert_eq!(envelope.wrapped_keys().len(), 1);
        let output = open(&envelope, "alice", alice.secret_key(), author.public_key()).unwrap();
        assert_eq!(output, OpenOutput::Plaintext(b"first one wins".to_vec()));
    }

    #[test]
    fn x_only_subscriber_key() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();

        // Directory stored only the x-coordinate.
        let subscribers = [SubscriberRecord {
            identity: "alice".to_string(),
            public_key: alice.public_key().to_x_only_hex(),
        }];

        let envelope = seal(b"short keys", author.secret_key(), &subscribers, &rng).unwrap();
        let output = open(&envelope, "alice", alice.secret_key(), author.public_key()).unwrap();
        assert_eq!(output, OpenOutput::Plaintext(b"short keys".to_vec()));
    }

    #[test]
    fn stale_reader_key_is_a_decryption_error() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();
        let rotated = KeyPair::generate(&rng).unwrap();

        let envelope = seal(
            b"old subscription",
            author.secret_key(),
            &[subscriber("alice", &alice)],
            &rng,
        )
        .unwrap();

        // Alice rotated her key pair after subscribing. The entry is present but no longer
        // unwraps, which is a decryption failure, not `NotASubscriber`.
        let result = open(&envelope, "alice", rotated.secret_key(), author.public_key());
        assert!(matches!(
            result,
            Err(OpenError::Decryption(DecryptionError::AuthenticationFailed))
        ));
    }

    #[test]
    fn tag_round_trip() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();
        let bob = KeyPair::generate(&rng).unwrap();

        let envelope = seal(
            b"stored as tags",
            author.secret_key(),
            &[subscriber("alice", &alice), subscriber("bob", &bob)],
            &rng,
        )
        .unwrap();

        let tags = envelope.to_tags();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0][0], "k");
        assert_eq!(tags[0][1], "alice");

        // Foreign tags in the post record are ignored on the way back.
        let mut stored = tags.clone();
        stored.push(vec!["e".to_string(), "some-event-id".to_string()]);
        stored.push(vec!["k".to_string(), "truncated".to_string()]);

        let restored = Envelope::from_tags(envelope.ciphertext(), &stored);
        assert_eq!(restored, envelope);

        let output = open(&restored, "bob", bob.secret_key(), author.public_key()).unwrap();
        assert_eq!(output, OpenOutput::Plaintext(b"stored as tags".to_vec()));
    }

    #[test]
    fn serde_list_of_pairs() {
        let rng = Rng::from_seed([3; 32]);
        let author = KeyPair::generate(&rng).unwrap();
        let alice = KeyPair::generate(&rng).unwrap();

        let envelope = seal(
            b"over the wire",
            author.secret_key(),
            &[subscriber("alice", &alice)],
            &rng,
        )
        .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["wrapped_keys"][0][0], "alice");
        assert!(json["wrapped_keys"][0][1].is_string());

        let restored: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(restored, envelope);
    }
}
