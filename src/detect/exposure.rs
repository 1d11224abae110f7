//! Exposure flags: a deterministic function of the finding alone.

use crate::core::model::{CredentialFinding, IssueFlag, SourceType};

pub fn detect_exposure(finding: &CredentialFinding) -> Vec<IssueFlag> {
    let mut flags = Vec::new();

    match finding.source_type {
        SourceType::GitHistory => flags.push(IssueFlag::ExposedInGitHistory),
        SourceType::GitSecret => flags.push(IssueFlag::CommittedToGit),
        SourceType::FileSecret => flags.push(IssueFlag::PlaintextFile),
        SourceType::BrowserPassword | SourceType::EnvConfig => {}
    }

    let path = finding.location.path_hint().to_lowercase();
    if path.contains("desktop") || path.contains("downloads") {
        flags.push(IssueFlag::InsecureLocation);
    }

    flags
}
