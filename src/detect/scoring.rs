//! Additive risk scoring, clamped to [0, 100].

use crate::core::model::{CredentialFinding, IssueFlag};

/// Domains whose credentials carry outsized blast radius.
pub const SENSITIVE_DOMAINS: &[&str] = &[
    "google", "facebook", "twitter", "github", "aws", "azure", "bank", "chase", "paypal",
];

const HEAVY_REUSE_THRESHOLD: usize = 5;

pub fn compute_risk_score(finding: &CredentialFinding, reuse_count: usize) -> u8 {
    let mut score: i32 = 0;

    let domain = finding.domain.as_deref().unwrap_or("");
    if SENSITIVE_DOMAINS.iter().any(|s| domain.contains(s)) {
        score += 40;
    } else if !domain.is_empty() {
        score += 10;
    }

    if finding.issue_flags.contains(&IssueFlag::WeakPassword) {
        score += 20;
    }
    if finding.issue_flags.contains(&IssueFlag::ShortPassword) {
        score += 10;
    }

    if reuse_count > 1 {
        score += 15;
    }
    if reuse_count >= HEAVY_REUSE_THRESHOLD {
        score += 15;
    }

    if finding.issue_flags.contains(&IssueFlag::ExposedInGitHistory) {
        score += 20;
    }
    if finding.issue_flags.contains(&IssueFlag::CommittedToGit) {
        score += 30;
    }
    if finding.issue_flags.contains(&IssueFlag::PlaintextFile) {
        score += 15;
    }
    if finding.issue_flags.contains(&IssueFlag::InsecureLocation) {
        score += 10;
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Location, Metadata, SourceType};
    use std::path::PathBuf;

    fn finding(domain: Option<&str>, flags: Vec<IssueFlag>) -> CredentialFinding {
        CredentialFinding {
            source_type: SourceType::FileSecret,
            location: Location::File {
                path: PathBuf::from("/tmp/x"),
                line: 1,
            },
            secret_hash: String::new(),
            preview: String::new(),
            username: None,
            domain: domain.map(str::to_string),
            metadata: Metadata::new(),
            issue_flags: flags,
            risk_score: 0,
            ai_type: None,
            ai_service_guess: None,
            ai_explanation: None,
        }
    }

    #[test]
    fn test_sensitive_domain_weak_committed() {
        // 40 (github) + 20 (weak) + 30 (committed) = 90
        let f = finding(
            Some("github.com"),
            vec![IssueFlag::WeakPassword, IssueFlag::CommittedToGit],
        );
        assert_eq!(compute_risk_score(&f, 0), 90);
    }

    #[test]
    fn test_other_domain_scores_ten() {
        let f = finding(Some("internal.example.net"), vec![]);
        assert_eq!(compute_risk_score(&f, 0), 10);
    }

    #[test]
    fn test_no_domain_no_flags_scores_zero() {
        let f = finding(None, vec![]);
        assert_eq!(compute_risk_score(&f, 1), 0);
    }

    #[test]
    fn test_reuse_tiers_are_cumulative() {
        let f = finding(None, vec![]);
        assert_eq!(compute_risk_score(&f, 2), 15);
        assert_eq!(compute_risk_score(&f, 5), 30);
    }

    #[test]
    fn test_score_is_clamped_to_100() {
        let f = finding(
            Some("bank.example.com"),
            vec![
                IssueFlag::WeakPassword,
                IssueFlag::ShortPassword,
                IssueFlag::ExposedInGitHistory,
                IssueFlag::CommittedToGit,
                IssueFlag::PlaintextFile,
                IssueFlag::InsecureLocation,
            ],
        );
        assert_eq!(compute_risk_score(&f, 10), 100);
    }
}
