//! Browser collector: chromium-family saved passwords.
//!
//! The live `Login Data` SQLite store is locked by a running browser, so each
//! profile's store is copied to a scratch directory first and queried there.
//! The scratch copy lives in a [`tempfile::TempDir`], which is removed on all
//! exit paths (including panics) when the guard drops.
//!
//! Values protected by the modern per-profile AES key (the `v10`/`v11` magic)
//! are recorded as opaque sentinels; unwrapping that key is out of scope.

use std::path::PathBuf;
use tracing::{debug, warn};

use crate::core::model::{Location, Metadata, RawHit, SourceType};
use crate::utils::paths::local_app_data_dir;

/// Modern chromium values we do not attempt to unwrap.
pub const ENCRYPTED_AES_GCM: &str = "[ENCRYPTED_AES_GCM_TODO]";
/// DPAPI unseal failed (or is unavailable on this platform).
pub const BROWSER_DECRYPT_FAILED: &str = "[DECRYPTION_FAILED]";

const LOGIN_DB: &str = "Login Data";

/// A discovered chromium profile holding a `Login Data` store.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub browser: &'static str,
    pub profile: String,
    pub path: PathBuf,
}

/// Locate chromium-family profiles under the local-app-data directory.
pub fn find_profiles() -> Vec<BrowserProfile> {
    let Some(local) = local_app_data_dir() else {
        return Vec::new();
    };

    let browser_roots: [(&'static str, PathBuf); 3] = [
        ("Chrome", local.join("Google").join("Chrome").join("User Data")),
        ("Edge", local.join("Microsoft").join("Edge").join("User Data")),
        (
            "Brave",
            local
                .join("BraveSoftware")
                .join("Brave-Browser")
                .join("User Data"),
        ),
    ];

    let mut profiles = Vec::new();
    for (browser, user_data) in browser_roots {
        if !user_data.exists() {
            continue;
        }

        let mut names = vec!["Default".to_string()];
        if let Ok(entries) = std::fs::read_dir(&user_data) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with("Profile ") {
                    names.push(name);
                }
            }
        }

        for name in names {
            let profile_path = user_data.join(&name);
            if profile_path.join(LOGIN_DB).exists() {
                profiles.push(BrowserProfile {
                    browser,
                    profile: name,
                    path: profile_path,
                });
            }
        }
    }

    profiles
}

/// Collect saved logins from every discovered profile.
pub fn collect() -> Vec<RawHit> {
    let mut hits = Vec::new();
    for profile in find_profiles() {
        match extract_logins(&profile) {
            Ok(mut profile_hits) => hits.append(&mut profile_hits),
            Err(e) => {
                warn!(
                    browser = profile.browser,
                    profile = %profile.profile,
                    error = %e,
                    "browser profile extraction failed"
                );
            }
        }
    }
    hits
}

fn extract_logins(profile: &BrowserProfile) -> anyhow::Result<Vec<RawHit>> {
    let scratch = tempfile::TempDir::new()?;
    let scratch_db = scratch.path().join(LOGIN_DB);
    std::fs::copy(profile.path.join(LOGIN_DB), &scratch_db)?;

    let conn = rusqlite::Connection::open(&scratch_db)?;
    let mut stmt = conn
        .prepare("SELECT origin_url, username_value, password_value, date_created FROM logins")?;

    let mut hits = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let origin_url: String = row.get(0)?;
        let username: String = row.get(1)?;
        let encrypted: Vec<u8> = row.get(2)?;
        let date_created: i64 = row.get(3).unwrap_or_default();

        if username.is_empty() || encrypted.is_empty() {
            continue;
        }

        let password = decrypt_login_value(&encrypted);

        let mut metadata = Metadata::new();
        metadata.insert("origin".into(), origin_url.clone().into());
        metadata.insert("created".into(), date_created.into());

        hits.push(RawHit {
            source_type: SourceType::BrowserPassword,
            location: Location::Browser {
                browser: profile.browser.to_string(),
                profile: profile.profile.clone(),
                path: profile.path.clone(),
            },
            secret_value: password,
            username: Some(username),
            domain: Some(origin_url),
            metadata,
        });
    }

    debug!(
        browser = profile.browser,
        profile = %profile.profile,
        count = hits.len(),
        "extracted browser logins"
    );
    Ok(hits)
}

/// Decrypt one `password_value` blob.
///
/// chromium < 80 sealed values directly with user-scope DPAPI; >= 80 wraps
/// them with a per-profile AES-GCM key (the `v10`/`v11` magic), which this
/// agent records as opaque.
pub fn decrypt_login_value(encrypted: &[u8]) -> String {
    if encrypted.starts_with(b"v10") || encrypted.starts_with(b"v11") {
        return ENCRYPTED_AES_GCM.to_string();
    }

    #[cfg(windows)]
    {
        match crate::security::keystore::dpapi::unprotect(encrypted) {
            Ok(plain) => match String::from_utf8(plain) {
                Ok(s) => s,
                Err(_) => BROWSER_DECRYPT_FAILED.to_string(),
            },
            Err(_) => BROWSER_DECRYPT_FAILED.to_string(),
        }
    }
    #[cfg(not(windows))]
    {
        BROWSER_DECRYPT_FAILED.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Build a profile dir with a minimal chromium-shaped logins table.
    fn seed_profile(dir: &Path, rows: &[(&str, &str, &[u8])]) {
        let conn = rusqlite::Connection::open(dir.join(LOGIN_DB)).unwrap();
        conn.execute_batch(
            "CREATE TABLE logins (
                origin_url TEXT,
                username_value TEXT,
                password_value BLOB,
                date_created INTEGER
            )",
        )
        .unwrap();
        for (origin, user, pw) in rows {
            conn.execute(
                "INSERT INTO logins VALUES (?1, ?2, ?3, 13370000000000000)",
                rusqlite::params![origin, user, pw],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_v10_magic_is_recorded_opaque() {
        assert_eq!(decrypt_login_value(b"v10\x01\x02\x03"), ENCRYPTED_AES_GCM);
        assert_eq!(decrypt_login_value(b"v11rest"), ENCRYPTED_AES_GCM);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_legacy_blob_without_dpapi_fails_closed() {
        assert_eq!(decrypt_login_value(b"legacy-blob"), BROWSER_DECRYPT_FAILED);
    }

    #[test]
    fn test_extract_logins_skips_empty_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        seed_profile(
            dir.path(),
            &[
                ("https://github.com/login", "octocat", b"v10secret" as &[u8]),
                ("https://example.com", "", b"v10secret"),
                ("https://example.org", "bob", b""),
            ],
        );

        let profile = BrowserProfile {
            browser: "Chrome",
            profile: "Default".to_string(),
            path: dir.path().to_path_buf(),
        };
        let hits = extract_logins(&profile).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username.as_deref(), Some("octocat"));
        assert_eq!(hits[0].domain.as_deref(), Some("https://github.com/login"));
        assert_eq!(hits[0].secret_value, ENCRYPTED_AES_GCM);
        assert_eq!(hits[0].metadata["origin"], "https://github.com/login");
    }

    #[test]
    fn test_missing_login_db_is_an_error_not_a_panic() {
        let dir = tempfile::TempDir::new().unwrap();
        let profile = BrowserProfile {
            browser: "Edge",
            profile: "Default".to_string(),
            path: dir.path().to_path_buf(),
        };
        assert!(extract_logins(&profile).is_err());
    }
}
