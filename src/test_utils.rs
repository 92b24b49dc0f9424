// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for tests and downstream integration testing.
use std::collections::HashMap;
use std::convert::Infallible;

use crate::crypto::secp256k1::PublicKey;
use crate::envelope::SubscriberRecord;
use crate::traits::SubscriberDirectory;

/// In-memory subscription directory keyed by author public key.
#[derive(Debug, Default)]
pub struct TestDirectory {
    subscriptions: HashMap<String, Vec<SubscriberRecord>>,
}

impl TestDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription of `identity` (with their public key) to the author.
    pub fn subscribe(&mut self, author: &PublicKey, identity: &str, subscriber: &PublicKey) {
        self.subscriptions
            .entry(author.to_hex())
            .or_default()
            .push(SubscriberRecord {
                identity: identity.to_string(),
                public_key: subscriber.to_hex(),
            });
    }
}

impl SubscriberDirectory for TestDirectory {
    type Error = Infallible;

    fn subscribers_of(&self, author: &PublicKey) -> Result<Vec<SubscriberRecord>, Self::Error> {
        Ok(self
            .subscriptions
            .get(&author.to_hex())
            .cloned()
            .unwrap_or_default())
    }
}
