use crate::model::StatusCounts;

/// `round((passed + warning * 0.5) / total * 100)`, half rounding up.
///
/// Skipped, failed and unsettled steps add nothing to the numerator but stay in
/// the denominator. Integer arithmetic keeps the result exact.
pub fn calculate_score(counts: &StatusCounts) -> u8 {
    if counts.total == 0 {
        return 0;
    }
    let numerator = 200 * counts.passed + 100 * counts.warning;
    let denominator = 2 * counts.total;
    let score = (numerator + counts.total) / denominator;
    score.min(100) as u8
}
