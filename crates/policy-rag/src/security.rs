//! Shared-secret checks for the HTTP surface

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// A shared secret that callers must present.
///
/// Only the SHA-256 digest is kept. An unconfigured gate rejects everything.
#[derive(Clone, Default)]
pub struct SecretGate {
    digest: Option<[u8; 32]>,
}

impl std::fmt::Debug for SecretGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl SecretGate {
    /// Gate for `secret`; a missing or blank secret leaves it unconfigured
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            digest: secret.filter(|s| !s.is_empty()).map(digest),
        }
    }

    /// Whether a secret has been set
    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    /// Compare `candidate` against the secret in constant time
    pub fn verify(&self, candidate: &str) -> bool {
        match &self.digest {
            Some(expected) => expected[..].ct_eq(&digest(candidate)[..]).into(),
            None => false,
        }
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
