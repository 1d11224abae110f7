//! Encrypted findings store on SQLite.
//!
//! Sensitive fields (preview, username, explanation) are encrypted at the
//! application layer with per-value AES-256-GCM under the master key before
//! they touch disk. `secret_hash` and `domain` stay plaintext; detection
//! correlates by hash and queries filter by domain.
//!
//! Single writer: the handle serializes access through a mutex and the
//! orchestrator performs all writes. WAL mode keeps concurrent read handles
//! consistent.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::model::{CredentialFinding, Metadata};
use crate::security::{MasterKey, ValueCipher};

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS findings (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    source_type        TEXT NOT NULL,
    location_json      TEXT NOT NULL,
    secret_hash        TEXT NOT NULL,
    secret_preview_enc BLOB,
    username_enc       BLOB,
    domain             TEXT,
    metadata_json      TEXT,
    issue_flags_json   TEXT,
    risk_score         INTEGER NOT NULL DEFAULT 0,
    ai_type            TEXT,
    ai_service_guess   TEXT,
    ai_explanation_enc BLOB,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_findings_hash ON findings(secret_hash);

CREATE TABLE IF NOT EXISTS scans (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at   TEXT NOT NULL,
    finished_at  TEXT,
    status       TEXT,
    num_findings INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT
);
"#;

/// A findings row as surfaced to consumers, sensitive fields decrypted.
///
/// `location` and `metadata` are decoded from their JSON columns; a damaged
/// column degrades to a default rather than failing the whole query, matching
/// the decrypt-failure stance.
#[derive(Debug, Serialize)]
pub struct StoredFinding {
    pub id: i64,
    pub source_type: String,
    pub location: serde_json::Value,
    pub secret_hash: String,
    pub preview: String,
    pub username: Option<String>,
    pub domain: Option<String>,
    pub metadata: Metadata,
    pub issue_flags: Vec<String>,
    pub risk_score: u8,
    pub ai_type: Option<String>,
    pub ai_service_guess: Option<String>,
    pub ai_explanation: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One row of the `scans` bookkeeping table.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub num_findings: i64,
}

pub struct Database {
    conn: Mutex<Connection>,
    cipher: ValueCipher,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the store at `path` and apply the schema. Idempotent.
    pub fn open(path: &Path, master_key: &MasterKey) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create db dir {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to apply database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
            cipher: ValueCipher::new(master_key),
            path: path.to_path_buf(),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory(master_key: &MasterKey) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            cipher: ValueCipher::new(master_key),
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a finding, or update the existing row with the same
    /// `secret_hash`. Identical plaintext across any two sources collapses to
    /// a single row; the later scan's source fields win.
    pub fn upsert_finding(&self, finding: &CredentialFinding) -> Result<()> {
        let preview_enc = self.cipher.encrypt(&finding.preview)?;
        let username_enc = finding
            .username
            .as_deref()
            .map(|u| self.cipher.encrypt(u))
            .transpose()?;
        let explanation_enc = finding
            .ai_explanation
            .as_deref()
            .map(|e| self.cipher.encrypt(e))
            .transpose()?;

        let location_json = serde_json::to_string(&finding.location)?;
        let metadata_json = serde_json::to_string(&finding.metadata)?;
        let issue_flags_json = serde_json::to_string(&finding.issue_flags)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock().expect("storage mutex poisoned");
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM findings WHERE secret_hash = ?1",
                params![finding.secret_hash],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE findings SET
                        source_type = ?1,
                        location_json = ?2,
                        secret_preview_enc = ?3,
                        username_enc = ?4,
                        domain = ?5,
                        metadata_json = ?6,
                        issue_flags_json = ?7,
                        risk_score = ?8,
                        ai_type = ?9,
                        ai_service_guess = ?10,
                        ai_explanation_enc = ?11,
                        updated_at = ?12
                     WHERE id = ?13",
                    params![
                        finding.source_type.as_str(),
                        location_json,
                        preview_enc,
                        username_enc,
                        finding.domain,
                        metadata_json,
                        issue_flags_json,
                        finding.risk_score,
                        finding.ai_type,
                        finding.ai_service_guess,
                        explanation_enc,
                        now,
                        id,
                    ],
                )?;
            }
            None => {
                conn.execute(
                    "INSERT INTO findings (
                        source_type, location_json, secret_hash, secret_preview_enc,
                        username_enc, domain, metadata_json, issue_flags_json,
                        risk_score, ai_type, ai_service_guess, ai_explanation_enc,
                        created_at, updated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                    params![
                        finding.source_type.as_str(),
                        location_json,
                        finding.secret_hash,
                        preview_enc,
                        username_enc,
                        finding.domain,
                        metadata_json,
                        issue_flags_json,
                        finding.risk_score,
                        finding.ai_type,
                        finding.ai_service_guess,
                        explanation_enc,
                        now,
                    ],
                )?;
            }
        }

        Ok(())
    }

    /// All findings, highest risk first, sensitive fields decrypted. A row
    /// whose ciphertext fails to authenticate surfaces the sentinel string;
    /// one corrupted row must not abort the listing.
    pub fn list_all(&self) -> Result<Vec<StoredFinding>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, source_type, location_json, secret_hash, secret_preview_enc,
                    username_enc, domain, metadata_json, issue_flags_json, risk_score,
                    ai_type, ai_service_guess, ai_explanation_enc, created_at, updated_at
             FROM findings ORDER BY risk_score DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            let preview_enc: Option<Vec<u8>> = row.get(4)?;
            let username_enc: Option<Vec<u8>> = row.get(5)?;
            let explanation_enc: Option<Vec<u8>> = row.get(12)?;
            let location_json: String = row.get(2)?;
            let metadata_json: Option<String> = row.get(7)?;
            let issue_flags_json: Option<String> = row.get(8)?;

            Ok(StoredFinding {
                id: row.get(0)?,
                source_type: row.get(1)?,
                location: serde_json::from_str(&location_json)
                    .unwrap_or(serde_json::Value::Null),
                secret_hash: row.get(3)?,
                preview: self.cipher.decrypt(&preview_enc.unwrap_or_default()),
                username: username_enc.map(|ct| self.cipher.decrypt(&ct)),
                domain: row.get(6)?,
                metadata: metadata_json
                    .and_then(|m| serde_json::from_str(&m).ok())
                    .unwrap_or_default(),
                issue_flags: issue_flags_json
                    .and_then(|f| serde_json::from_str(&f).ok())
                    .unwrap_or_default(),
                risk_score: row.get(9)?,
                ai_type: row.get(10)?,
                ai_service_guess: row.get(11)?,
                ai_explanation: explanation_enc.map(|ct| self.cipher.decrypt(&ct)),
                created_at: row.get(13)?,
                updated_at: row.get(14)?,
            })
        })?;

        let mut findings = Vec::new();
        for row in rows {
            findings.push(row?);
        }
        Ok(findings)
    }

    /// `secret_hash → row ids`, restricted to groups of two or more.
    pub fn reuse_groups(&self) -> Result<HashMap<String, Vec<i64>>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare("SELECT secret_hash, id FROM findings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut groups: HashMap<String, Vec<i64>> = HashMap::new();
        for row in rows {
            let (hash, id) = row?;
            groups.entry(hash).or_default().push(id);
        }

        groups.retain(|_, ids| ids.len() >= 2);
        Ok(groups)
    }

    pub fn findings_count(&self) -> Result<i64> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        Ok(conn.query_row("SELECT COUNT(*) FROM findings", [], |row| row.get(0))?)
    }

    // ── Scan bookkeeping ─────────────────────────────────────────────────────

    pub fn record_scan(
        &self,
        started_at: &str,
        finished_at: &str,
        status: &str,
        num_findings: usize,
    ) -> Result<i64> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT INTO scans (started_at, finished_at, status, num_findings)
             VALUES (?1, ?2, ?3, ?4)",
            params![started_at, finished_at, status, num_findings as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn latest_scan(&self) -> Result<Option<ScanRecord>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.query_row(
            "SELECT id, started_at, finished_at, status, num_findings
             FROM scans ORDER BY id DESC LIMIT 1",
            [],
            |row| {
                Ok(ScanRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    status: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    num_findings: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{IssueFlag, Location, SourceType};
    use crate::core::normalize::normalize_raw_hit;
    use crate::core::model::RawHit;
    use crate::security::keystore::{load_or_create, PlainSealer};
    use crate::security::DECRYPTION_FAILED;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let key = load_or_create(dir.path(), &PlainSealer).unwrap();
        let db = Database::open_in_memory(&key).unwrap();
        (db, dir)
    }

    fn sample_finding(secret: &str, path: &str) -> CredentialFinding {
        let mut item = normalize_raw_hit(RawHit {
            source_type: SourceType::FileSecret,
            location: Location::File {
                path: path.into(),
                line: 7,
            },
            secret_value: secret.to_string(),
            username: Some("alice".to_string()),
            domain: Some("github.com".to_string()),
            metadata: Metadata::new(),
        });
        item.finding.issue_flags.push(IssueFlag::PlaintextFile);
        item.finding.risk_score = 55;
        item.finding
    }

    #[test]
    fn test_upsert_then_list_roundtrip() {
        let (db, _dir) = test_db();
        db.upsert_finding(&sample_finding("hunter2-secret", "/tmp/a.txt"))
            .unwrap();

        let rows = db.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.preview, "hu**********et");
        assert_eq!(row.username.as_deref(), Some("alice"));
        assert_eq!(row.domain.as_deref(), Some("github.com"));
        assert_eq!(row.risk_score, 55);
        assert_eq!(row.issue_flags, vec!["plaintext_file"]);
        assert_eq!(row.location["kind"], "file");
        assert_eq!(row.location["line"], 7);
    }

    #[test]
    fn test_upsert_same_hash_updates_in_place() {
        let (db, _dir) = test_db();
        db.upsert_finding(&sample_finding("reused-secret-value", "/tmp/a.txt"))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let mut second = sample_finding("reused-secret-value", "/tmp/b.txt");
        second.risk_score = 80;
        db.upsert_finding(&second).unwrap();

        let rows = db.list_all().unwrap();
        assert_eq!(rows.len(), 1, "same hash must collapse to one row");
        assert_eq!(rows[0].risk_score, 80);
        assert_eq!(rows[0].location["path"], "/tmp/b.txt");
        assert!(rows[0].updated_at > rows[0].created_at);
    }

    #[test]
    fn test_different_hash_inserts_new_row() {
        let (db, _dir) = test_db();
        db.upsert_finding(&sample_finding("first-secret-value", "/tmp/a.txt"))
            .unwrap();
        db.upsert_finding(&sample_finding("second-secret-value", "/tmp/a.txt"))
            .unwrap();
        assert_eq!(db.findings_count().unwrap(), 2);
    }

    #[test]
    fn test_list_orders_by_risk_desc() {
        let (db, _dir) = test_db();
        let mut low = sample_finding("low-risk-secret", "/tmp/a.txt");
        low.risk_score = 10;
        let mut high = sample_finding("high-risk-secret", "/tmp/b.txt");
        high.risk_score = 95;
        db.upsert_finding(&low).unwrap();
        db.upsert_finding(&high).unwrap();

        let rows = db.list_all().unwrap();
        assert_eq!(rows[0].risk_score, 95);
        assert_eq!(rows[1].risk_score, 10);
    }

    #[test]
    fn test_corrupted_row_surfaces_sentinel_not_error() {
        let (db, _dir) = test_db();
        db.upsert_finding(&sample_finding("will-be-corrupted", "/tmp/a.txt"))
            .unwrap();

        {
            let conn = db.conn.lock().unwrap();
            conn.execute(
                "UPDATE findings SET secret_preview_enc = X'deadbeefdeadbeefdeadbeefdeadbeef'",
                [],
            )
            .unwrap();
        }

        let rows = db.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].preview, DECRYPTION_FAILED);
    }

    #[test]
    fn test_reuse_groups_requires_two_or_more() {
        let (db, _dir) = test_db();
        db.upsert_finding(&sample_finding("solo-secret-value", "/tmp/a.txt"))
            .unwrap();
        // Upsert collapses same-hash rows, so grow a group by inserting
        // distinct hashes and checking the filter instead
        db.upsert_finding(&sample_finding("other-secret-value", "/tmp/b.txt"))
            .unwrap();

        assert!(db.reuse_groups().unwrap().is_empty());
    }

    #[test]
    fn test_scan_bookkeeping() {
        let (db, _dir) = test_db();
        assert!(db.latest_scan().unwrap().is_none());

        db.record_scan("2026-08-01T10:00:00Z", "2026-08-01T10:00:05Z", "success", 3)
            .unwrap();
        db.record_scan("2026-08-01T11:00:00Z", "2026-08-01T11:00:09Z", "success", 7)
            .unwrap();

        let latest = db.latest_scan().unwrap().unwrap();
        assert_eq!(latest.num_findings, 7);
        assert_eq!(latest.status, "success");
    }

    #[test]
    fn test_settings_roundtrip_and_overwrite() {
        let (db, _dir) = test_db();
        assert_eq!(db.get_setting("agent_id").unwrap(), None);

        db.set_setting("agent_id", "host-1").unwrap();
        db.set_setting("agent_id", "host-2").unwrap();
        assert_eq!(db.get_setting("agent_id").unwrap().as_deref(), Some("host-2"));
    }

    #[test]
    fn test_open_is_idempotent_on_disk() {
        let dir = TempDir::new().unwrap();
        let key = load_or_create(dir.path(), &PlainSealer).unwrap();
        let db_path = dir.path().join("findings.db");

        {
            let db = Database::open(&db_path, &key).unwrap();
            db.upsert_finding(&sample_finding("persisted-secret", "/tmp/a.txt"))
                .unwrap();
        }

        let db = Database::open(&db_path, &key).unwrap();
        assert_eq!(db.findings_count().unwrap(), 1);
        assert_eq!(db.list_all().unwrap()[0].preview, "pe************et");
    }
}
