#![forbid(unsafe_code)]

//! Environment-context fingerprints.
//!
//! Measured kernel costs are only valid on the hardware/software stack that
//! produced them, so every persisted partition is keyed by an opaque
//! fingerprint of that stack. The token itself is caller-defined and must be
//! stable for the lifetime of one process and reproducible on identical
//! stacks; [`EnvFingerprint::from_components`] is a convenience that digests
//! a component map into such a token.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Opaque token identifying the execution environment a measurement is
/// valid under. Only equality, hashing, and the string form matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvFingerprint(String);

impl EnvFingerprint {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Digest a set of environment components (e.g., device name, driver
    /// version, library versions) into a fingerprint token. Components are
    /// sorted by key before hashing, so insertion order never changes the
    /// resulting token.
    #[must_use]
    pub fn from_components<'a, I>(components: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let sorted: BTreeMap<&str, &str> = components.into_iter().collect();

        let mut hasher = Sha256::new();
        for (key, value) in &sorted {
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"|");
        }
        let digest = hasher.finalize();

        Self(format!("env-{}", bytes_to_hex(&digest)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EnvFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    const HEX_LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        out.push(HEX_LUT[(byte >> 4) as usize] as char);
        out.push(HEX_LUT[(byte & 0x0f) as usize] as char);
    }
    out
}
