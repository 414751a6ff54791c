use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Seeds used when `all` is requested.
pub const DEFAULT_SEEDS: [u64; 8] = [1337, 42, 7, 2024, 0xC0FFEE, 99_991, 31_337, 123_456_789];

/// Seed metadata used for logic and playability analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Original token when the seed came from a text phrase.
    pub label: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, label: None }
    }

    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        Self {
            seed: phrase_seed(phrase),
            label: Some(phrase.to_string()),
        }
    }

    /// Label for reports: the phrase if one was given, else the number.
    #[must_use]
    pub fn display(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.seed.to_string())
    }
}

/// First eight bytes of the phrase's SHA-256, big-endian.
#[must_use]
pub fn phrase_seed(phrase: &str) -> u64 {
    let digest = Sha256::digest(phrase.trim().to_lowercase().as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Resolve CLI seed tokens into canonical seed metadata.
///
/// Accepts decimal integers (negative values use their magnitude), `0x` hex,
/// `@phrase` text seeds, and `all` for the default seed set. Duplicates keep
/// their first position.
///
/// # Errors
///
/// Returns an error for tokens that match none of those forms.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(phrase) = token.strip_prefix('@')
            && !phrase.trim().is_empty()
        {
            pending.push(SeedInfo::from_phrase(phrase));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(DEFAULT_SEEDS.into_iter().map(SeedInfo::from_numeric));
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed));

    if pending.is_empty() {
        pending.push(SeedInfo::from_numeric(DEFAULT_SEEDS[0]));
    }

    Ok(pending)
}
