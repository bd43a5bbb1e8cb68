//! Verdict aggregation
//!
//! Two levels: the verdicts of all judges for one claim merge into a single
//! verdict, and the merged verdicts of all claims merge into the article's
//! [`FactCheckStatus`].

use serde::{Deserialize, Serialize};

use crate::article::FactCheckStatus;

/// A judge's answer about one claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    True,
    False,
    /// Judge failure, unparseable answer, or (after merging) judge conflict
    Unknown,
}

impl Verdict {
    pub fn is_defined(&self) -> bool {
        !matches!(self, Verdict::Unknown)
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value {
            Verdict::True
        } else {
            Verdict::False
        }
    }
}

/// Merge the verdicts of every judge for a single claim.
///
/// Looks only at the distinct defined verdicts: none gives `Unknown`, exactly
/// one is adopted, both `True` and `False` is a conflict and gives `Unknown`.
/// The result does not depend on judge order.
pub fn merge_verdicts<I>(verdicts: I) -> Verdict
where
    I: IntoIterator<Item = Verdict>,
{
    let (seen_true, seen_false) = verdicts
        .into_iter()
        .fold((false, false), |(t, f), verdict| match verdict {
            Verdict::True => (true, f),
            Verdict::False => (t, true),
            Verdict::Unknown => (t, f),
        });

    match (seen_true, seen_false) {
        (true, false) => Verdict::True,
        (false, true) => Verdict::False,
        _ => Verdict::Unknown,
    }
}

/// Derive the article status from the merged verdict of every claim.
///
/// An empty claim set is `PartiallyVerified`: nothing was checked, so the
/// article cannot be called verified. Any `False` claim rules out both
/// `Verified` and `PartiallyVerified` and lands on `Uncertain`.
pub fn article_status<I>(merged: I) -> FactCheckStatus
where
    I: IntoIterator<Item = Verdict>,
{
    let mut total = 0usize;
    let mut trues = 0usize;
    let mut falses = 0usize;

    for verdict in merged {
        total += 1;
        match verdict {
            Verdict::True => trues += 1,
            Verdict::False => falses += 1,
            Verdict::Unknown => {}
        }
    }

    if total == 0 {
        FactCheckStatus::PartiallyVerified
    } else if trues == total {
        FactCheckStatus::Verified
    } else if trues > 0 && falses == 0 {
        FactCheckStatus::PartiallyVerified
    } else {
        FactCheckStatus::Uncertain
    }
}

/// Per-judge verdicts for one claim plus their merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCheck {
    pub claim: String,
    /// (judge name, verdict) in judge order
    pub verdicts: Vec<(String, Verdict)>,
    pub merged: Verdict,
}

impl ClaimCheck {
    pub fn new(claim: impl Into<String>, verdicts: Vec<(String, Verdict)>) -> Self {
        let merged = merge_verdicts(verdicts.iter().map(|(_, v)| *v));
        Self {
            claim: claim.into(),
            verdicts,
            merged,
        }
    }

    /// Judges disagreed on a defined answer
    pub fn is_conflict(&self) -> bool {
        self.merged == Verdict::Unknown
            && self.verdicts.iter().any(|(_, v)| *v == Verdict::True)
            && self.verdicts.iter().any(|(_, v)| *v == Verdict::False)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Verdict::{False as F, True as T, Unknown as U};

    const ALL: [Verdict; 3] = [T, F, U];

    /// Every verdict vector of the given length
    fn all_vectors(len: usize) -> Vec<Vec<Verdict>> {
        (0..len).fold(vec![vec![]], |acc, _| {
            acc.into_iter()
                .flat_map(|prefix| {
                    ALL.into_iter().map(move |v| {
                        let mut next = prefix.clone();
                        next.push(v);
                        next
                    })
                })
                .collect()
        })
    }

    #[test]
    fn unanimous_judges_win() {
        assert_eq!(merge_verdicts([T, T, T]), T);
        assert_eq!(merge_verdicts([F, F]), F);
        assert_eq!(merge_verdicts([T]), T);
    }

    #[test]
    fn unknown_votes_do_not_override_defined_ones() {
        assert_eq!(merge_verdicts([T, U]), T);
        assert_eq!(merge_verdicts([U, F, U]), F);
        assert_eq!(merge_verdicts([U, U]), U);
        assert_eq!(merge_verdicts(std::iter::empty()), U);
    }

    #[test]
    fn conflict_is_unknown_regardless_of_unknown_votes() {
        assert_eq!(merge_verdicts([T, F]), U);
        assert_eq!(merge_verdicts([F, T]), U);
        assert_eq!(merge_verdicts([T, U, U, F, U]), U);
        // Three judges: a pairwise "last write wins" would get this wrong
        assert_eq!(merge_verdicts([T, F, T]), U);
    }

    #[test]
    fn merge_is_order_independent() {
        for len in 0..=4 {
            for votes in all_vectors(len) {
                let expected = merge_verdicts(votes.clone());
                let mut reversed = votes.clone();
                reversed.reverse();
                assert_eq!(merge_verdicts(reversed), expected, "{:?}", votes);
                for shift in 0..len {
                    let mut rotated = votes.clone();
                    rotated.rotate_left(shift);
                    assert_eq!(merge_verdicts(rotated), expected, "{:?}", votes);
                }
            }
        }
    }

    #[test]
    fn verified_only_for_non_empty_all_true() {
        for len in 0..=4 {
            for merged in all_vectors(len) {
                let status = article_status(merged.clone());
                let all_true = !merged.is_empty() && merged.iter().all(|v| *v == T);
                assert_eq!(status == FactCheckStatus::Verified, all_true, "{:?}", merged);
                assert_ne!(status, FactCheckStatus::Pending);
                assert_ne!(status, FactCheckStatus::Error);
            }
        }
    }

    #[test]
    fn article_status_table() {
        assert_eq!(article_status(std::iter::empty()), FactCheckStatus::PartiallyVerified);
        assert_eq!(article_status([T, T]), FactCheckStatus::Verified);
        assert_eq!(article_status([T, U]), FactCheckStatus::PartiallyVerified);
        assert_eq!(article_status([U]), FactCheckStatus::Uncertain);
        assert_eq!(article_status([U, F]), FactCheckStatus::Uncertain);
        assert_eq!(article_status([F, F]), FactCheckStatus::Uncertain);
        assert_eq!(article_status([T, F]), FactCheckStatus::Uncertain);
    }

    #[test]
    fn two_judges_disagreeing_leave_the_article_uncertain() {
        let check = ClaimCheck::new(
            "Inflation fell last month.",
            vec![("judge1".to_string(), T), ("judge2".to_string(), F)],
        );
        assert_eq!(check.merged, U);
        assert!(check.is_conflict());
        assert_eq!(article_status([check.merged]), FactCheckStatus::Uncertain);
    }

    #[test]
    fn failed_judges_are_not_a_conflict() {
        let check = ClaimCheck::new("claim", vec![("a".to_string(), U), ("b".to_string(), U)]);
        assert_eq!(check.merged, U);
        assert!(!check.is_conflict());
    }

    #[test]
    fn verdict_serialization() {
        assert_eq!(serde_json::to_string(&U).unwrap(), "\"unknown\"");
        assert_eq!(Verdict::from(true), T);
        assert!(!U.is_defined());
    }
}
