//! Vote aggregation per voting scheme
//!
//! Pure functions from a proposal's vote set to a frozen result. Ties are
//! reported as multiple winners, never broken arbitrarily.

use chrono::{DateTime, Utc};
use newswire_types::{CloseReason, DecisionResult, Proposal, VoteChoice, VotingScheme};
use std::collections::BTreeMap;

const TALLY_EPSILON: f64 = 1e-9;

/// Compute the frozen result for a proposal at close time.
pub fn aggregate(proposal: &Proposal, reason: CloseReason, closed_at: DateTime<Utc>) -> DecisionResult {
    let tally = match proposal.scheme {
        VotingScheme::Binary | VotingScheme::MultipleChoice | VotingScheme::WeightedConsensus => {
            weight_tally(proposal)
        }
        VotingScheme::Ranked => borda_tally(proposal),
    };

    let total_weight: f64 = proposal.eligible.values().sum();
    let winners = winners_of(&tally);

    // The winning share is exposed only for weighted consensus with an
    // untied winner; callers apply their own quorum threshold to it.
    let winning_share = match (proposal.scheme, winners.as_slice()) {
        (VotingScheme::WeightedConsensus, [single]) if total_weight > 0.0 => {
            tally.get(single).map(|weight_sum| weight_sum / total_weight)
        }
        _ => None,
    };

    DecisionResult {
        winners,
        tally,
        total_weight,
        winning_share,
        reason,
        closed_at,
    }
}

/// Sum of vote weights per option.
fn weight_tally(proposal: &Proposal) -> BTreeMap<String, f64> {
    let mut tally = BTreeMap::new();
    for vote in proposal.votes.values() {
        let option = match &vote.choice {
            VoteChoice::Binary(yes) => {
                if *yes {
                    "yes".to_string()
                } else {
                    "no".to_string()
                }
            }
            VoteChoice::Selected(option) => option.clone(),
            // A ranked ballot on a non-ranked scheme counts its first preference.
            VoteChoice::Ranked(ranking) => match ranking.first() {
                Some(option) => option.clone(),
                None => continue,
            },
        };
        *tally.entry(option).or_insert(0.0) += vote.weight;
    }
    tally
}

/// Borda-count scoring: with n options, rank position i (0-based)
/// contributes `weight * (n - i)`.
fn borda_tally(proposal: &Proposal) -> BTreeMap<String, f64> {
    let n = proposal.options.len();
    let mut tally = BTreeMap::new();
    for vote in proposal.votes.values() {
        let VoteChoice::Ranked(ranking) = &vote.choice else {
            continue;
        };
        for (position, option) in ranking.iter().enumerate() {
            let points = vote.weight * (n - position) as f64;
            *tally.entry(option.clone()).or_insert(0.0) += points;
        }
    }
    tally
}

/// Option(s) with the highest aggregate score. More than one entry means
/// a tie.
fn winners_of(tally: &BTreeMap<String, f64>) -> Vec<String> {
    let Some(max) = tally.values().copied().fold(None::<f64>, |acc, v| {
        Some(acc.map_or(v, |m| if v > m { v } else { m }))
    }) else {
        return Vec::new();
    };

    tally
        .iter()
        .filter(|(_, score)| (max - **score).abs() < TALLY_EPSILON)
        .map(|(option, _)| option.clone())
        .collect()
}
