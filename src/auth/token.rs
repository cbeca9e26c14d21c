//! OAuth tokens and their on-disk cache.
//!
//! The cache uses the common token JSON shape
//! (`access_token`, `token_type`, `refresh_token`, `expiry`), so caches
//! written by other OAuth clients load unchanged.

use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GmailError, Result};

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// A cached access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// `true` when the access token can no longer be used at `now`.
    ///
    /// A missing expiry, or the zero timestamp `0001-01-01T00:00:00Z`,
    /// means the token never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) if expiry.year() > 1 => {
                expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS)
            }
            _ => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Body of a token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Convert to a [`Token`], keeping `previous_refresh` when the endpoint
    /// did not issue a new refresh token.
    pub fn into_token(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

/// Load a cached token.
///
/// A missing file is `Ok(None)`. A file that exists but does not hold a
/// token is an error.
pub fn load_token(path: &Path) -> Result<Option<Token>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No cached token");
            return Ok(None);
        }
        Err(e) => return Err(GmailError::io(path, e)),
    };
    let token = serde_json::from_str(&contents).map_err(|e| GmailError::TokenCache {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Some(token))
}

/// Write `token` to `path`, creating the parent directory (mode 0700 on Unix).
pub fn save_token(path: &Path, token: &Token) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }
    let json = serde_json::to_string(token).map_err(|e| GmailError::TokenCache {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    write_private(path, json.as_bytes()).map_err(|e| GmailError::io(path, e))?;
    info!(path = %path.display(), "Saved token cache");
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|e| GmailError::io(dir, e))
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| GmailError::io(dir, e))
}

/// Write `contents` to a file only the owner can read.
///
/// New files are created with mode 0600. An existing file is narrowed to
/// 0600 before it is truncated.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.set_len(0)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(expiry: Option<DateTime<Utc>>) -> Token {
        Token {
            access_token: "ya29.access".into(),
            token_type: "Bearer".into(),
            refresh_token: Some("1//refresh".into()),
            expiry,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ezGmail").join("ezGmail.json");
        let tok = token(Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));

        save_token(&path, &tok).unwrap();
        let loaded = load_token(&path).unwrap().expect("token present");
        assert_eq!(loaded, tok);
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("ezGmail.json");
        save_token(&path, &token(None)).unwrap();
        let dir_mode = std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode();
        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_cache_is_narrowed_and_replaced() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ezGmail.json");
        std::fs::write(&path, "x".repeat(4096)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let tok = token(None);
        save_token(&path, &tok).unwrap();

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(load_token(&path).unwrap(), Some(tok));
    }

    #[test]
    fn test_missing_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_token(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_cache_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ezGmail.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_token(&path),
            Err(GmailError::TokenCache { .. })
        ));
    }

    #[test]
    fn test_reads_zero_expiry() {
        let json = r#"{"access_token":"a","token_type":"Bearer","refresh_token":"r","expiry":"0001-01-01T00:00:00Z"}"#;
        let tok: Token = serde_json::from_str(json).unwrap();
        assert!(!tok.is_expired());
    }

    #[test]
    fn test_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(!token(None).is_expired_at(now));
        assert!(token(Some(now - Duration::minutes(1))).is_expired_at(now));
        // Within the safety margin.
        assert!(token(Some(now + Duration::seconds(5))).is_expired_at(now));
        assert!(!token(Some(now + Duration::minutes(30))).is_expired_at(now));
    }

    #[test]
    fn test_response_keeps_previous_refresh_token() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"new","token_type":"Bearer","expires_in":3599}"#,
        )
        .unwrap();
        let tok = resp.into_token(now, Some("old-refresh".into()));
        assert_eq!(tok.access_token, "new");
        assert_eq!(tok.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(tok.expiry, Some(now + Duration::seconds(3599)));
    }
}
