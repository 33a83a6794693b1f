//! Identifier generation for issues and stored files.
//!
//! IDs have the form `{prefix}_{unix_millis}_{suffix}` (e.g.
//! `issue_1718000000000_k3x9a0q2m`). The suffix is nine base36 characters
//! taken from a SHA256 hash over the timestamp, a per-generator salt, a
//! monotonic counter and a retry nonce.
//!
//! # Uniqueness
//!
//! The counter makes every ID a generator produces distinct from every other
//! ID it produced. IDs that entered the system some other way (imported
//! records) are registered with [`IdGenerator::register_id`] and avoided by
//! retrying with the next nonce.
//!
//! # Example
//!
//! ```
//! use grommet::id_generation::{validate_id, IdGenerator};
//!
//! let mut generator = IdGenerator::new("issue");
//! let id = generator.generate().unwrap();
//!
//! assert!(validate_id(&id, "issue"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;

/// Number of base36 characters in the random suffix
pub const SUFFIX_LENGTH: usize = 9;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Unable to generate a unique ID after exhausting all nonces
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried
        attempts: u32,
    },

    /// Invalid length parameter
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Time-prefixed ID generator with collision detection
pub struct IdGenerator {
    prefix: String,
    salt: u64,
    counter: u64,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new ID generator for the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            salt: rand::random(),
            counter: 0,
            existing_ids: HashSet::new(),
        }
    }

    /// The prefix every generated ID starts with
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: String) {
        self.existing_ids.insert(id);
    }

    /// Generate a new unique ID
    ///
    /// # Errors
    ///
    /// Returns an error if every nonce produced an already registered ID.
    pub fn generate(&mut self) -> Result<String, IdGenerationError> {
        let millis = Utc::now().timestamp_millis();
        self.counter += 1;

        for nonce in 0..MAX_NONCE {
            let suffix = self.hash_suffix(millis, nonce)?;
            let id = format!("{}_{}_{}", self.prefix, millis, suffix);

            if self.existing_ids.insert(id.clone()) {
                if nonce > 0 {
                    debug!(nonce, %id, "Generated unique ID after collision retries");
                }
                return Ok(id);
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    fn hash_suffix(&self, millis: i64, nonce: u32) -> Result<String, IdGenerationError> {
        let content = format!("{}|{}|{}|{}", millis, self.salt, self.counter, nonce);

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        encode_base36(&hash_bytes[..8], SUFFIX_LENGTH)
    }
}

/// Encode bytes as a fixed-length base36 string.
///
/// At most 8 bytes are folded into a `u64`; longer input wraps.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut num: u64 = 0;
    for &byte in bytes {
        num = num.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut result = Vec::with_capacity(length);
    let mut n = num;
    while result.len() < length {
        let remainder = (n % 36) as usize;
        result.push(BASE36_CHARS[remainder] as char);
        n /= 36;
    }

    Ok(result.into_iter().rev().collect())
}

/// Validate ID format: `{prefix}_{digits}_{9 base36 chars}`
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(rest) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    let Some((millis, suffix)) = rest.split_once('_') else {
        return false;
    };

    !millis.is_empty()
        && millis.chars().all(|c| c.is_ascii_digit())
        && suffix.len() == SUFFIX_LENGTH
        && suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}
