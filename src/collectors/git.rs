//! Git collector: working-tree and commit-history scans driven by the `git`
//! binary.
//!
//! A directory containing a `.git` entry is a repository; the discovery walk
//! does not descend into it. Subprocess failures (no git on PATH, not a repo
//! after all, permission trouble) are logged and yield no hits for that repo.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::warn;
use walkdir::WalkDir;

use crate::collectors::filesystem::{detect_secrets_in_file, hit_metadata, IGNORE_DIRS};
use crate::collectors::patterns::{extract_secret, is_placeholder, PATTERNS};
use crate::core::model::{Location, RawHit, SourceType};

pub const DEFAULT_MAX_COMMITS: u32 = 500;
const MAX_CONTEXT_LEN: usize = 100;

/// Find git repositories under the given roots.
pub fn find_git_repos(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut repos = Vec::new();

    for root in roots {
        if !root.exists() {
            continue;
        }

        let mut walker = WalkDir::new(root).follow_links(false).into_iter();
        while let Some(entry) = walker.next() {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if IGNORE_DIRS.contains(&name.as_ref()) {
                walker.skip_current_dir();
                continue;
            }

            if entry.path().join(".git").exists() {
                repos.push(entry.path().to_path_buf());
                walker.skip_current_dir();
            }
        }
    }

    repos
}

/// Pattern-scan every tracked file in the repository's working tree.
pub fn scan_working_tree(repo: &Path) -> Vec<RawHit> {
    let output = match Command::new("git")
        .args(["ls-files"])
        .current_dir(repo)
        .output()
    {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            warn!(repo = %repo.display(), status = %o.status, "git ls-files failed");
            return Vec::new();
        }
        Err(e) => {
            warn!(repo = %repo.display(), error = %e, "could not run git");
            return Vec::new();
        }
    };

    let mut hits = Vec::new();
    for rel in String::from_utf8_lossy(&output.stdout).lines() {
        let full = repo.join(rel);
        if !full.exists() {
            continue;
        }

        for hit in detect_secrets_in_file(&full) {
            let line = match &hit.location {
                Location::File { line, .. } => *line,
                _ => 0,
            };
            hits.push(RawHit {
                source_type: SourceType::GitSecret,
                location: Location::GitFile {
                    repo: repo.to_path_buf(),
                    path: PathBuf::from(rel),
                    line,
                },
                ..hit
            });
        }
    }

    hits
}

/// Scan added lines in the last `max_commits` commits via a streaming parse of
/// `git log -p`.
pub fn scan_history(repo: &Path, max_commits: u32) -> Vec<RawHit> {
    let mut child = match Command::new("git")
        .args(["log", "-p", "-n", &max_commits.to_string()])
        .current_dir(repo)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(repo = %repo.display(), error = %e, "could not run git log");
            return Vec::new();
        }
    };

    let mut hits = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let reader = BufReader::new(stdout);
        let mut current_commit = String::new();
        let mut current_file = String::new();

        for line in reader.lines() {
            let Ok(line) = line else { break };

            if let Some(rest) = line.strip_prefix("commit ") {
                current_commit = rest
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                continue;
            }

            if line.starts_with("diff --git") {
                if let Some(name) = diff_file_name(&line) {
                    current_file = name;
                }
                continue;
            }

            // Only added lines are candidates
            if !line.starts_with('+') || line.starts_with("+++") {
                continue;
            }
            let added = &line[1..];

            for pattern in PATTERNS.iter() {
                let Some(caps) = pattern.regex.captures(added) else {
                    continue;
                };
                let secret = extract_secret(&caps);
                if is_placeholder(secret) {
                    continue;
                }

                let context: String = added.trim().chars().take(MAX_CONTEXT_LEN).collect();
                hits.push(RawHit {
                    source_type: SourceType::GitHistory,
                    location: Location::GitCommit {
                        repo: repo.to_path_buf(),
                        commit: current_commit.clone(),
                        path: current_file.clone(),
                    },
                    secret_value: secret.to_string(),
                    username: None,
                    domain: None,
                    metadata: hit_metadata(pattern.name, pattern.score, &context, secret),
                });
            }
        }
    }

    if let Err(e) = child.wait() {
        warn!(repo = %repo.display(), error = %e, "git log did not exit cleanly");
    }

    hits
}

/// File named by a `diff --git a/old b/new` header: the basename of the
/// `b/` side.
fn diff_file_name(line: &str) -> Option<String> {
    let b_side = line.split(' ').next_back()?;
    let stripped = b_side.strip_prefix("b/").unwrap_or(b_side);
    stripped.rsplit('/').next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_repo_discovery_does_not_descend_into_repos() {
        let dir = TempDir::new().unwrap();
        let outer = dir.path().join("projects").join("app");
        let nested = outer.join("vendor").join("dep");
        fs::create_dir_all(outer.join(".git")).unwrap();
        fs::create_dir_all(nested.join(".git")).unwrap();

        let repos = find_git_repos(&[dir.path().to_path_buf()]);
        assert_eq!(repos, vec![outer]);
    }

    #[test]
    fn test_repo_discovery_skips_ignored_dirs() {
        let dir = TempDir::new().unwrap();
        let buried = dir.path().join("node_modules").join("pkg");
        fs::create_dir_all(buried.join(".git")).unwrap();

        assert!(find_git_repos(&[dir.path().to_path_buf()]).is_empty());
    }

    #[test]
    fn test_diff_file_name_takes_basename_of_b_side() {
        assert_eq!(
            diff_file_name("diff --git a/src/config.py b/src/config.py"),
            Some("config.py".to_string())
        );
        assert_eq!(
            diff_file_name("diff --git a/deploy.sh b/deploy.sh"),
            Some("deploy.sh".to_string())
        );
        // Renames name the file after the b/ side
        assert_eq!(
            diff_file_name("diff --git a/old/name.txt b/new/deep/name2.txt"),
            Some("name2.txt".to_string())
        );
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let repos = find_git_repos(&[PathBuf::from("/definitely/not/here")]);
        assert!(repos.is_empty());
    }

    #[test]
    fn test_working_tree_scan_tolerates_non_repo() {
        // ls-files fails outside a repository; that repo just yields no hits
        let dir = TempDir::new().unwrap();
        assert!(scan_working_tree(dir.path()).is_empty());
    }

    #[test]
    fn test_history_scan_tolerates_non_repo() {
        let dir = TempDir::new().unwrap();
        assert!(scan_history(dir.path(), DEFAULT_MAX_COMMITS).is_empty());
    }
}
