// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces onto external collaborators.
use std::error::Error;

use crate::crypto::secp256k1::PublicKey;
use crate::envelope::SubscriberRecord;

/// Source of the subscriber list for an author.
///
/// The directory lives outside this crate (the Nostec client keeps it in a hosted database).
/// Sealing a post fetches the list once and passes it in as a value; retrying and caching are
/// the caller's concern.
pub trait SubscriberDirectory {
    type Error: Error;

    /// Returns everyone currently subscribed to the given author, in directory order.
    fn subscribers_of(&self, author: &PublicKey) -> Result<Vec<SubscriberRecord>, Self::Error>;
}
