use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Longest key accepted, so keys stay valid single path components.
const MAX_KEY_LEN: usize = 255;

/// Fallback name used when sanitizing strips every character.
const FALLBACK_NAME: &str = "file";

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp that never repeats within this process.
fn next_timestamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Keep ASCII alphanumerics and dots, lowercased.
pub fn sanitize_name(original_name: &str) -> String {
    let cleaned: String = original_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Server-generated identifier of a stored blob, e.g. `1700000000000-call.pdf`.
///
/// A key is always a single, non-hidden path component.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    /// Generate a fresh key from the uploader-supplied filename.
    pub fn generate(original_name: &str) -> Self {
        let mut name = sanitize_name(original_name);
        // Leave room for the timestamp prefix.
        name.truncate(MAX_KEY_LEN - 24);
        Self(format!("{}-{}", next_timestamp(), name))
    }

    /// Validate a key received from a client or read back from storage.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidKey("key must not be empty".into()));
        }
        if s.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        if s.starts_with('.') {
            return Err(StorageError::InvalidKey(
                "key must not start with '.'".into(),
            ));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(StorageError::InvalidKey(format!(
                "unexpected character {c:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StorageKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for StorageKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StorageKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Folder classification a blob is tagged with for listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlobFolder {
    #[serde(rename = "pdfs")]
    Pdfs,
    #[serde(rename = "images/publications")]
    PublicationImages,
    #[serde(rename = "images/team")]
    TeamImages,
}

impl BlobFolder {
    /// Hint value that routes images to the team folder.
    pub const TEAM_HINT: &'static str = "team";

    /// Anything that is not an image is filed under `pdfs`.
    pub fn classify(mime_type: &str, hint: Option<&str>) -> Self {
        if !mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Self::Pdfs;
        }
        match hint.map(str::trim) {
            Some(Self::TEAM_HINT) => Self::TeamImages,
            _ => Self::PublicationImages,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdfs => "pdfs",
            Self::PublicationImages => "images/publications",
            Self::TeamImages => "images/team",
        }
    }
}

impl fmt::Display for BlobFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlobFolder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdfs" => Ok(Self::Pdfs),
            "images/publications" => Ok(Self::PublicationImages),
            "images/team" => Ok(Self::TeamImages),
            other => Err(format!(
                "Unknown folder '{other}'; expected one of: pdfs, images/publications, images/team"
            )),
        }
    }
}
