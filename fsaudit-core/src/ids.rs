//! Opaque identifiers and change-detection fingerprints.

use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{AuditError, Result};

/// Number of random bytes behind every generated token.
const ID_BYTES: usize = 5;

/// Length of the name-derived identity prefix.
pub const IDENTITY_LEN: usize = 10;

/// Produce a fresh uppercase hexadecimal token from the OS random source.
///
/// Failure means the process can no longer mint scan tokens or event ids,
/// so callers treat [`AuditError::IdGeneration`] as fatal.
pub fn generate_id() -> Result<String> {
    let mut buf = [0u8; ID_BYTES];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|err| AuditError::IdGeneration(err.to_string()))?;
    Ok(hex::encode_upper(buf))
}

/// Deterministic SHA-256 digest of `bytes`, lowercase hex.
pub fn fingerprint(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Stable identity for an entry, derived from its base name alone.
pub fn identity_for(name: &str) -> String {
    let mut digest = fingerprint(name);
    digest.truncate(IDENTITY_LEN);
    digest
}

/// Fingerprint that moves whenever the modification second moves.
pub fn change_fingerprint(identity: &str, modified_epoch_secs: i64) -> String {
    fingerprint(format!("{identity}:{modified_epoch_secs}"))
}
