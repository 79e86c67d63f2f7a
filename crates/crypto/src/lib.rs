// Path: crates/crypto/src/lib.rs
//! Token and identifier generation (spec §4.1 "C1 — Identifier & Token
//! Service"). No cryptographic signing is performed here; the contract's
//! own digital signatures are opaque payloads supplied by parties and
//! recorded verbatim (spec §3, "SignaturePayload").

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::RngCore;
use rental_types::ids::ContractNumber;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Generates a new random (v4) UUID. Thin wrapper kept for symmetry with
/// `new_token`/`new_contract_number` so callers go through one module for
/// all identifier generation.
pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}

/// A freshly minted invitation token: the plaintext handed to the invitee
/// out-of-band, and the SHA-256 hex digest that is actually persisted
/// (spec §4.5, "Security": "the plaintext token is never stored").
#[derive(Debug, Clone)]
pub struct GeneratedToken {
    pub plaintext: String,
    pub hash: String,
}

/// Generates a 32-byte random token, base64url-no-pad encoded (43 characters),
/// together with its SHA-256 hex hash.
pub fn new_token() -> GeneratedToken {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plaintext = base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes);
    let hash = hash_token(&plaintext);
    GeneratedToken { plaintext, hash }
}

/// Hashes a plaintext token the same way `new_token` does, for verifying a
/// token presented back by an invitee against a stored `token_hash`.
pub fn hash_token(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}

/// A token is well-formed if it is 43 characters of base64url alphabet
/// (`[A-Za-z0-9_-]`), matching the length `new_token` always produces.
pub fn is_well_formed_token(s: &str) -> bool {
    s.len() == 43
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Allocates contract numbers of the form `VH-YYYY-NNNNNN`, serialized per
/// calendar year (spec §4.1, SPEC_FULL §2: "Contract-number allocator race
/// safety"). Each year gets its own atomic counter; a mutex guards only the
/// first insertion of a new year so concurrent allocators racing to create
/// that year's counter don't double-initialize it.
#[derive(Debug, Default)]
pub struct ContractNumberAllocator {
    counters: DashMap<i32, Arc<AtomicU64>>,
    create_lock: Mutex<()>,
}

impl ContractNumberAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next contract number for `year`.
    pub fn allocate(&self, year: i32) -> ContractNumber {
        let counter = match self.counters.get(&year) {
            Some(c) => c.clone(),
            None => {
                let _guard = self.create_lock.lock();
                self.counters
                    .entry(year)
                    .or_insert_with(|| Arc::new(AtomicU64::new(0)))
                    .clone()
            }
        };
        let sequence = counter.fetch_add(1, Ordering::SeqCst) + 1;
        ContractNumber::new(year, sequence as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_through_hash() {
        let t = new_token();
        assert!(is_well_formed_token(&t.plaintext));
        assert_eq!(hash_token(&t.plaintext), t.hash);
    }

    #[test]
    fn allocator_increments_per_year_independently() {
        let alloc = ContractNumberAllocator::new();
        assert_eq!(alloc.allocate(2026).0, "VH-2026-000001");
        assert_eq!(alloc.allocate(2026).0, "VH-2026-000002");
        assert_eq!(alloc.allocate(2027).0, "VH-2027-000001");
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!is_well_formed_token("too-short"));
        assert!(!is_well_formed_token(&"x".repeat(43).replace('x', "!")));
    }
}
