// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle of the local user's key material.
//!
//! A [`Session`] is created once at account creation or login and owns the key pair for as long
//! as the user stays signed in. Core operations never reach into ambient state; the caller takes
//! the keys out of the session and passes them in explicitly. Logging out drops the session,
//! which zeroises the secret scalar.
use crate::crypto::Rng;
use crate::crypto::secp256k1::{KeyError, KeyPair, PublicKey, SecretKey};

/// Signed-in state holding the local user's key pair.
#[derive(Debug)]
pub struct Session {
    key_pair: KeyPair,
}

impl Session {
    /// Starts a session with a freshly generated key pair, as on account creation.
    pub fn create_account(rng: &Rng) -> Result<Self, KeyError> {
        let key_pair = KeyPair::generate(rng)?;
        Ok(Self { key_pair })
    }

    /// Starts a session from a pasted secret key in hex, as on login. Fails on malformed key
    /// material.
    pub fn login(secret_key_hex: &str) -> Result<Self, KeyError> {
        let secret_key: SecretKey = secret_key_hex.parse()?;
        Ok(Self {
            key_pair: KeyPair::from_secret_key(secret_key),
        })
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn secret_key(&self) -> &SecretKey {
        self.key_pair.secret_key()
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    /// Ends the session, dropping and zeroising the key material.
    pub fn logout(self) {}
}

#[cfg(test)]
mod tests {
    use crate::crypto::Rng;
    use crate::crypto::secp256k1::KeyError;

    use super::Session;

    #[test]
    fn login_restores_same_identity() {
        let rng = Rng::from_seed([5; 32]);
        let session = Session::create_account(&rng).unwrap();

        let exported = session.secret_key().to_hex();
        let public_key = *session.public_key();
        session.logout();

        let restored = Session::login(&exported).unwrap();
        assert_eq!(restored.public_key(), &public_key);
    }

    #[test]
    fn malformed_login_key_is_rejected() {
        assert!(matches!(
            Session::login("definitely not hex"),
            Err(KeyError::InvalidHexEncoding(_))
        ));
        assert!(matches!(
            Session::login("abcd"),
            Err(KeyError::InvalidSecretKeyLength(2))
        ));
    }
}
