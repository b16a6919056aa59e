//! Short public identifiers that resolve a scanned link to a target.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;
use crate::storage::Storage;
use crate::telemetry::{metric_inc, SHARE_CODE_COLLISION};

/// 32 symbols; `0`, `O`, `1` and `I` are left out as easily confused.
pub const SHARE_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const SHARE_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareCodeError {
    #[error("share code must be {} characters", SHARE_CODE_LEN)]
    InvalidLength,

    #[error("share code contains unsupported character {0:?}")]
    InvalidCharacter(char),
}

/// A 6-character public lookup key.
///
/// Deserialization goes through [`ShareCode::parse`], so stored values are
/// normalized and checked like user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareCode(String);

impl ShareCode {
    /// Normalize user input (trim, uppercase) and check it against the
    /// alphabet.
    pub fn parse(input: &str) -> Result<Self, ShareCodeError> {
        let code = input.trim().to_ascii_uppercase();
        if code.chars().count() != SHARE_CODE_LEN {
            return Err(ShareCodeError::InvalidLength);
        }
        if let Some(bad) = code.chars().find(|c| !c.is_ascii() || !SHARE_CODE_ALPHABET.contains(&(*c as u8))) {
            return Err(ShareCodeError::InvalidCharacter(bad));
        }
        Ok(Self(code))
    }

    /// Map random bytes onto the alphabet, one symbol per byte.
    pub fn from_random_bytes(bytes: [u8; SHARE_CODE_LEN]) -> Self {
        let code = bytes
            .iter()
            .map(|b| SHARE_CODE_ALPHABET[usize::from(*b) % SHARE_CODE_ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShareCode {
    type Error = ShareCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShareCode> for String {
    fn from(code: ShareCode) -> Self {
        code.0
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draws share codes and retries until one is unused in storage.
///
/// Uses the OS random source by default; any `RngCore` can be injected.
#[derive(Debug, Clone)]
pub struct ShareCodeGenerator<R = OsRng> {
    rng: R,
}

impl Default for ShareCodeGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareCodeGenerator<OsRng> {
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl<R: RngCore> ShareCodeGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// One candidate, without a uniqueness check.
    pub fn draw(&mut self) -> ShareCode {
        let mut bytes = [0u8; SHARE_CODE_LEN];
        self.rng.fill_bytes(&mut bytes);
        ShareCode::from_random_bytes(bytes)
    }

    /// A code not currently bound to any target.
    ///
    /// Retries without bound on collision; at 32^6 combinations a retry is
    /// already rare. The check and the caller's later insert are separate
    /// store calls, so a unique constraint on the stored code is still
    /// needed to close the race.
    pub async fn generate(&mut self, storage: &dyn Storage) -> Result<ShareCode, StoreError> {
        let mut attempt = 1u32;
        loop {
            let code = self.draw();
            if storage.find_target_by_share_code(&code).await?.is_none() {
                return Ok(code);
            }
            metric_inc(SHARE_CODE_COLLISION);
            tracing::debug!(attempt, "share code collision, drawing again");
            attempt += 1;
        }
    }
}
