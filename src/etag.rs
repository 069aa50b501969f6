use std::fmt;
use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;
use tracing::warn;
use xxhash_rust::xxh3::xxh3_64;

/// The metadata an ETag is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified_secs: i64,
    pub size: u64,
}

impl Fingerprint {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified_secs = metadata
            .modified()
            .map(unix_secs)
            .unwrap_or_else(|_| unix_secs(SystemTime::now()));
        Self {
            modified_secs,
            size: metadata.len(),
        }
    }

    /// Used when attributes cannot be read: `(now, 0)`.
    ///
    /// The resulting tag will not match anything a client cached, so the
    /// worst case is an unnecessary full download.
    pub fn fallback() -> Self {
        Self {
            modified_secs: unix_secs(SystemTime::now()),
            size: 0,
        }
    }

    fn canonical_bytes(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&self.modified_secs.to_le_bytes());
        buf[8..].copy_from_slice(&self.size.to_le_bytes());
        buf
    }
}

fn unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Entity tag derived from `(mtime in whole seconds, size)`, never from
/// contents. Two writes of equal size inside the same second share a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETag(String);

impl ETag {
    /// Fixed-width lowercase hex of `xxh3_64` over the canonical fingerprint bytes.
    pub fn from_fingerprint(fingerprint: Fingerprint) -> Self {
        let h = xxh3_64(&fingerprint.canonical_bytes());
        Self(format!("{:016x}", h))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether an `If-None-Match` header value names this tag.
    ///
    /// Comparison ignores ASCII case. Quoted and weak (`W/`) forms, lists
    /// and `*` are accepted.
    pub fn matches(&self, if_none_match: &str) -> bool {
        if_none_match.split(',').any(|candidate| {
            let candidate = candidate.trim();
            if candidate == "*" {
                return true;
            }
            let candidate = candidate
                .strip_prefix("W/")
                .or_else(|| candidate.strip_prefix("w/"))
                .unwrap_or(candidate);
            let candidate = candidate.trim_matches('"');
            !candidate.is_empty() && candidate.eq_ignore_ascii_case(&self.0)
        })
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the ETag for `path` from a fresh metadata read.
///
/// A failed read does not fail the caller; the fallback fingerprint is used
/// instead and a warning is logged.
pub async fn for_path(path: &Path) -> ETag {
    let fingerprint = match fs::metadata(path).await {
        Ok(metadata) => Fingerprint::from_metadata(&metadata),
        Err(e) => {
            warn!(
                "Could not read attributes of {}, using fallback ETag: {}",
                path.display(),
                e
            );
            Fingerprint::fallback()
        }
    };
    ETag::from_fingerprint(fingerprint)
}
