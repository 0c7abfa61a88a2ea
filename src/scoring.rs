//! Compliance scoring and strict promotion.

use crate::result::{PartialResult, ValidationIssue};

/// Score after a fatal short-circuit.
pub const FATAL_SCORE: u8 = 0;

/// `round(100 * passed / total)` clamped to 0..=100. Nothing to check is a
/// vacuous pass and scores 100.
pub fn compliance_score(passed_checks: u32, total_checks: u32) -> u8 {
    if total_checks == 0 {
        return 100;
    }
    let ratio = f64::from(passed_checks.min(total_checks)) / f64::from(total_checks);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Reclassify medium-or-higher warnings as errors, keeping their relative
/// order. Warnings without a severity, and low ones, stay warnings.
///
/// Returns the number of promoted issues.
pub fn promote_strict(partial: &mut PartialResult) -> usize {
    let mut kept = Vec::with_capacity(partial.warnings.len());
    let mut promoted = 0;
    for issue in std::mem::take(&mut partial.warnings) {
        match issue {
            ValidationIssue::Warning(mut detail)
                if detail.severity.is_some_and(|s| s.promotes_in_strict()) =>
            {
                detail.promoted = true;
                partial.errors.push(ValidationIssue::Error(detail));
                promoted += 1;
            }
            other => kept.push(other),
        }
    }
    partial.warnings = kept;
    promoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::IssueDetail;
    use crate::rules::Severity;

    #[test]
    fn test_score_vacuous_and_rounding() {
        assert_eq!(compliance_score(0, 0), 100);
        assert_eq!(compliance_score(9, 9), 100);
        assert_eq!(compliance_score(2, 3), 67);
        assert_eq!(compliance_score(1, 3), 33);
        assert_eq!(compliance_score(0, 5), 0);
    }

    #[test]
    fn test_score_clamps_inconsistent_counts() {
        assert_eq!(compliance_score(7, 5), 100);
    }

    #[test]
    fn test_promotion_threshold() {
        let mut partial = PartialResult::new();
        partial.warning(IssueDetail::new("low", "x").with_severity(Severity::Low));
        partial.warning(IssueDetail::new("medium", "x").with_severity(Severity::Medium));
        partial.warning(IssueDetail::new("unrated", "x"));
        partial.warning(IssueDetail::new("critical", "x").with_severity(Severity::Critical));

        assert_eq!(promote_strict(&mut partial), 2);

        let errors: Vec<_> = partial.errors.iter().map(|i| i.code()).collect();
        let warnings: Vec<_> = partial.warnings.iter().map(|i| i.code()).collect();
        assert_eq!(errors, vec!["medium", "critical"]);
        assert_eq!(warnings, vec!["low", "unrated"]);
        assert!(partial.errors[0].detail().promoted);
    }
}
