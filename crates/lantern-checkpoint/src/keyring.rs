//! Ed25519 key material: the signing side (opaque to `lantern-chain`) and
//! the verifying side (a `kid -> public key` ring used by the verifier).

use std::collections::HashMap;
use std::path::Path;

use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

use crate::error::SignatureError;

/// The core treats signing keys opaquely: it only needs something that can
/// sign bytes under a named `kid`. A caller may plug in any implementation
/// (HSM-backed, KMS-backed, ...) without `lantern-checkpoint` changing.
pub trait SigningKeyProvider: Send + Sync {
    fn kid(&self) -> &str;
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

/// A signing key held directly in process memory, loaded from a PKCS8 PEM
/// file. This is the concrete provider this workspace ships.
pub struct StaticSigningKeyProvider {
    kid: String,
    signing_key: SigningKey,
}

impl StaticSigningKeyProvider {
    pub fn new(kid: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            kid: kid.into(),
            signing_key,
        }
    }

    /// Load a PKCS8 PEM-encoded Ed25519 private key from disk.
    pub fn from_pem_file(
        path: impl AsRef<Path>,
        kid: impl Into<String>,
    ) -> Result<Self, SignatureError> {
        let pem = std::fs::read_to_string(path)?;
        let signing_key = SigningKey::from_pkcs8_pem(&pem)
            .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
        Ok(Self::new(kid, signing_key))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl SigningKeyProvider for StaticSigningKeyProvider {
    fn kid(&self) -> &str {
        &self.kid
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

/// A `kid -> public key` mapping used by the offline verifier.
///
/// Resolution never silently falls back across multiple distinct keys:
/// the single-key shortcut only applies when the ring holds exactly one
/// key, and even then is disabled by `--strict-kid`.
#[derive(Debug, Default)]
pub struct KeyRing {
    keys: HashMap<String, VerifyingKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    pub fn insert(&mut self, kid: impl Into<String>, key: VerifyingKey) {
        self.keys.insert(kid.into(), key);
    }

    /// Load every `<kid>.pem` file in `dir` as a verifying key.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SignatureError> {
        let mut ring = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pem") {
                continue;
            }
            let kid = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let pem = std::fs::read_to_string(&path)?;
            let key = VerifyingKey::from_public_key_pem(&pem)
                .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
            ring.insert(kid, key);
        }
        Ok(ring)
    }

    /// Load a single PEM file as `kid = "default"`.
    pub fn from_single_file(path: impl AsRef<Path>) -> Result<Self, SignatureError> {
        let pem = std::fs::read_to_string(path)?;
        let key = VerifyingKey::from_public_key_pem(&pem)
            .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
        let mut ring = Self::new();
        ring.insert("default", key);
        Ok(ring)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Resolve a verifying key for `kid`. Falls back to the ring's sole key
    /// only when exactly one key is present and `strict_kid` is false.
    pub fn resolve(&self, kid: &str, strict_kid: bool) -> Result<&VerifyingKey, SignatureError> {
        if let Some(key) = self.keys.get(kid) {
            return Ok(key);
        }
        if !strict_kid && self.keys.len() == 1 {
            return Ok(self.keys.values().next().expect("len checked"));
        }
        Err(SignatureError::KeyNotFound(kid.to_string()))
    }
}
