//! Enrichment hooks: classification and explanation.
//!
//! Both are pluggable seams: the orchestrator only sees the traits, and any
//! implementation satisfying the signatures is compliant. The reference
//! implementations here are rule-based over the producer metadata; an
//! LLM-backed variant would slot in behind the same traits.

use crate::core::model::{CredentialFinding, Metadata};
use serde::{Deserialize, Serialize};

/// Credential categories the classifier may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretClass {
    Password,
    ApiKey,
    SessionCookie,
    SshKey,
    DbConnection,
    Unknown,
}

impl SecretClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretClass::Password => "password",
            SecretClass::ApiKey => "api_key",
            SecretClass::SessionCookie => "session_cookie",
            SecretClass::SshKey => "ssh_key",
            SecretClass::DbConnection => "db_connection",
            SecretClass::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub class: SecretClass,
    pub service_guess: String,
}

pub trait Classifier: Send + Sync {
    fn classify(&self, metadata: &Metadata, domain: Option<&str>) -> Classification;
}

pub trait Explainer: Send + Sync {
    fn explain(&self, finding: &CredentialFinding) -> String;
}

// ── Rule-based reference implementations ──────────────────────────────────────

pub struct RuleBasedClassifier;

impl Classifier for RuleBasedClassifier {
    fn classify(&self, metadata: &Metadata, domain: Option<&str>) -> Classification {
        let pattern_name = metadata
            .get("pattern_name")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        if pattern_name.contains("AWS") {
            return Classification {
                class: SecretClass::ApiKey,
                service_guess: "AWS".to_string(),
            };
        }
        if pattern_name.contains("Slack") {
            return Classification {
                class: SecretClass::ApiKey,
                service_guess: "Slack".to_string(),
            };
        }
        if pattern_name.contains("Private Key") {
            return Classification {
                class: SecretClass::SshKey,
                service_guess: "SSH".to_string(),
            };
        }

        let origin = metadata
            .get("origin")
            .and_then(|v| v.as_str())
            .or(domain)
            .unwrap_or("");
        if origin.contains("github.com") {
            return Classification {
                class: SecretClass::Password,
                service_guess: "GitHub".to_string(),
            };
        }
        if origin.contains("google.com") {
            return Classification {
                class: SecretClass::Password,
                service_guess: "Google".to_string(),
            };
        }

        Classification {
            class: SecretClass::Unknown,
            service_guess: "Unknown".to_string(),
        }
    }
}

pub struct TieredExplainer;

impl Explainer for TieredExplainer {
    fn explain(&self, finding: &CredentialFinding) -> String {
        let flags = finding
            .issue_flags
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let risk = finding.risk_score;

        if risk > 80 {
            format!("CRITICAL: This credential has a risk score of {risk}. Issues: {flags}. Rotate immediately.")
        } else if risk > 40 {
            format!("HIGH: Risk score {risk}. Issues: {flags}. Consider rotating.")
        } else {
            format!("INFO: Risk score {risk}. Issues: {flags}.")
        }
    }
}
