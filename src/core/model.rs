//! Canonical data model shared by collectors, detection, and storage.
//!
//! Collectors emit [`RawHit`]s, the normalizer turns each into a
//! [`CredentialFinding`] paired with a short-lived [`SecretMaterial`] handle,
//! and only the finding half ever reaches storage. The pairing is enforced by
//! the type split: [`ScanItem`] owns both, the storage API accepts only
//! `&CredentialFinding`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Producer-specific context carried through normalization verbatim.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Where a raw hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    BrowserPassword,
    FileSecret,
    GitSecret,
    GitHistory,
    EnvConfig,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::BrowserPassword => "browser_password",
            SourceType::FileSecret => "file_secret",
            SourceType::GitSecret => "git_secret",
            SourceType::GitHistory => "git_history",
            SourceType::EnvConfig => "env_config",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "browser_password" => Some(SourceType::BrowserPassword),
            "file_secret" => Some(SourceType::FileSecret),
            "git_secret" => Some(SourceType::GitSecret),
            "git_history" => Some(SourceType::GitHistory),
            "env_config" => Some(SourceType::EnvConfig),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured location of a discovery. Variant shape depends on the source;
/// JSON-serialized at the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    File {
        path: PathBuf,
        line: usize,
    },
    GitFile {
        repo: PathBuf,
        path: PathBuf,
        line: usize,
    },
    GitCommit {
        repo: PathBuf,
        commit: String,
        path: String,
    },
    Browser {
        browser: String,
        profile: String,
        path: PathBuf,
    },
}

impl Location {
    /// Best-effort filesystem path for exposure heuristics and display.
    pub fn path_hint(&self) -> String {
        match self {
            Location::File { path, .. } => path.display().to_string(),
            Location::GitFile { repo, path, .. } => repo.join(path).display().to_string(),
            Location::GitCommit { repo, path, .. } => {
                format!("{}:{}", repo.display(), path)
            }
            Location::Browser { path, .. } => path.display().to_string(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::File { path, line } => write!(f, "{}:{}", path.display(), line),
            Location::GitFile { repo, path, line } => {
                write!(f, "{}/{}:{}", repo.display(), path.display(), line)
            }
            Location::GitCommit { repo, commit, path } => {
                write!(f, "{}@{}:{}", repo.display(), &commit[..commit.len().min(12)], path)
            }
            Location::Browser {
                browser, profile, ..
            } => write!(f, "{browser} ({profile})"),
        }
    }
}

/// Closed vocabulary of issue tags attached by the detection battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueFlag {
    WeakPassword,
    ShortPassword,
    ReusedPassword,
    ExposedInGitHistory,
    CommittedToGit,
    PlaintextFile,
    InsecureLocation,
}

impl IssueFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueFlag::WeakPassword => "weak_password",
            IssueFlag::ShortPassword => "short_password",
            IssueFlag::ReusedPassword => "reused_password",
            IssueFlag::ExposedInGitHistory => "exposed_in_git_history",
            IssueFlag::CommittedToGit => "committed_to_git",
            IssueFlag::PlaintextFile => "plaintext_file",
            IssueFlag::InsecureLocation => "insecure_location",
        }
    }
}

impl std::fmt::Display for IssueFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unnormalized discovery from a collector. Lives only until normalization.
#[derive(Debug, Clone)]
pub struct RawHit {
    pub source_type: SourceType,
    pub location: Location,
    pub secret_value: String,
    pub username: Option<String>,
    pub domain: Option<String>,
    pub metadata: Metadata,
}

/// Canonical record about one discovered credential occurrence.
///
/// The plaintext itself is *not* here; see [`ScanItem`].
#[derive(Debug, Clone, Serialize)]
pub struct CredentialFinding {
    pub source_type: SourceType,
    pub location: Location,
    pub secret_hash: String,
    pub preview: String,
    pub username: Option<String>,
    pub domain: Option<String>,
    pub metadata: Metadata,
    pub issue_flags: Vec<IssueFlag>,
    pub risk_score: u8,
    pub ai_type: Option<String>,
    pub ai_service_guess: Option<String>,
    pub ai_explanation: Option<String>,
}

/// Transient carrier of a raw secret. Zeroed on drop; owned by the scan and
/// discarded before `run_full_scan` returns.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretMaterial(String);

impl SecretMaterial {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretMaterial(<redacted>)")
    }
}

/// A finding plus its transient plaintext, paired for the lifetime of one
/// scan's detection phase. `plaintext` is `None` when the collector produced
/// an empty value.
pub struct ScanItem {
    pub finding: CredentialFinding,
    pub plaintext: Option<SecretMaterial>,
}
