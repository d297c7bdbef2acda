//! Signing key acquisition.
//!
//! The key is read from `CHAINVID_SIGNING_KEY` or prompted for, validated,
//! and handed to the ledger client for the duration of the run. It is never
//! written to disk.

use anyhow::bail;

const KEY_ENV_VAR: &str = "CHAINVID_SIGNING_KEY";

/// Obtains the signing key: environment variable first, interactive prompt
/// as a fallback.
pub fn acquire_signing_key() -> anyhow::Result<String> {
    if let Ok(raw) = std::env::var(KEY_ENV_VAR) {
        match normalize_key(&raw) {
            Ok(key) => return Ok(key),
            Err(error) => {
                tracing::warn!(%error, "invalid signing key in {}, prompting", KEY_ENV_VAR);
            }
        }
    }

    loop {
        let raw = crate::prompt::read_line(&format!(
            "{KEY_ENV_VAR} is not set, please enter your signing key. \
             For security reasons, we strongly recommend using a separate \
             key for this project: "
        ))?;
        match normalize_key(&raw) {
            Ok(key) => return Ok(key),
            Err(error) => eprintln!("Invalid signing key: {error}"),
        }
    }
}

/// Validates a signing key and normalizes it to `0x`-prefixed lowercase.
///
/// A key is 64 hex characters, optionally already `0x`-prefixed.
pub fn normalize_key(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if hex_part.len() != 64 {
        bail!("signing key must be a 64-character hex string");
    }
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("signing key contains non-hex characters");
    }

    Ok(format!("0x{}", hex_part.to_ascii_lowercase()))
}
