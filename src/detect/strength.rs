//! Password strength estimation over the transient plaintext.

use crate::core::model::IssueFlag;
use zxcvbn::{zxcvbn, Score};

const SHORT_PASSWORD_LEN: usize = 8;

/// Result of strength analysis for one secret.
#[derive(Debug)]
pub struct StrengthReport {
    /// zxcvbn score, 0 (trivially guessable) through 4.
    pub score: u8,
    /// Base-10 log of the estimated guess count.
    pub guesses_log10: f64,
    pub flags: Vec<IssueFlag>,
}

/// Analyze a raw secret. Returns `None` for empty input: nothing to measure.
pub fn analyze_strength(secret: &str) -> Option<StrengthReport> {
    if secret.is_empty() {
        return None;
    }

    let estimate = zxcvbn(secret, &[]);
    let score = match estimate.score() {
        Score::Zero => 0,
        Score::One => 1,
        Score::Two => 2,
        Score::Three => 3,
        _ => 4,
    };

    let mut flags = Vec::new();
    if score <= 1 {
        flags.push(IssueFlag::WeakPassword);
    }
    if secret.chars().count() < SHORT_PASSWORD_LEN {
        flags.push(IssueFlag::ShortPassword);
    }

    Some(StrengthReport {
        score,
        guesses_log10: estimate.guesses_log10(),
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_is_skipped() {
        assert!(analyze_strength("").is_none());
    }

    #[test]
    fn test_weak_and_short() {
        let report = analyze_strength("abc").unwrap();
        assert!(report.flags.contains(&IssueFlag::WeakPassword));
        assert!(report.flags.contains(&IssueFlag::ShortPassword));
        assert!(report.score <= 1);
    }

    #[test]
    fn test_common_password_is_weak_but_not_short() {
        let report = analyze_strength("password1234").unwrap();
        assert!(report.flags.contains(&IssueFlag::WeakPassword));
        assert!(!report.flags.contains(&IssueFlag::ShortPassword));
    }

    #[test]
    fn test_strong_password_has_no_flags() {
        let report = analyze_strength("correct-HORSE-battery-staple-91!").unwrap();
        assert!(report.flags.is_empty());
        assert!(report.score >= 3);
        assert!(report.guesses_log10 > 8.0);
    }
}
