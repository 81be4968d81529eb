//! Fingerprint voting over the ensemble's attempts.
//!
//! Attempts that agree on every test prediction form one solution group;
//! groups are ranked and the final attempts are emitted diversity-first, so
//! distinct candidate solutions are exhausted before any group repeats.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use mosaic_core::{Attempt, Grid};

#[derive(Debug, Clone, PartialEq)]
/// One emitted attempt: predictions aligned to the puzzle's test inputs,
/// plus the provenance of the representative that produced them (absent for
/// null attempts).
pub struct RankedAttempt {
    pub predictions: Vec<Option<Grid>>,
    pub expert_id: Option<String>,
    pub iteration_index: Option<usize>,
}

impl RankedAttempt {
    fn null(test_count: usize) -> Self {
        Self {
            predictions: vec![None; test_count],
            expert_id: None,
            iteration_index: None,
        }
    }

    fn from_member(member: &Attempt) -> Self {
        Self {
            predictions: member.test_predictions.clone(),
            expert_id: Some(member.expert_id.clone()),
            iteration_index: Some(member.iteration_index),
        }
    }
}

#[derive(Debug, Clone)]
/// Attempts sharing one test-prediction fingerprint.
pub struct SolutionGroup {
    pub fingerprint: String,
    /// Members, deduplicated by (expert, iteration) and ordered by
    /// representative preference: highest aggregate score, then earliest
    /// iteration, then lexicographically smallest expert id.
    pub members: Vec<Attempt>,
    pub vote_count: usize,
    pub best_aggregate_score: f64,
    pub contains_passer: bool,
    pub min_iteration: usize,
}

/// Derives ranked solution groups from the flattened ensemble attempts.
///
/// Attempts with no non-null test prediction are dropped. A duplicated
/// attempt (same expert, same iteration) collapses to one member, so replays
/// cannot inflate votes. A group's votes come from its passers; failed
/// members whose expert opted into `count_failed_matches` reinforce a group
/// that already has a passer but never create votes of their own.
pub fn solution_groups(attempts: &[Attempt]) -> Vec<SolutionGroup> {
    let mut by_fingerprint: HashMap<String, Vec<&Attempt>> = HashMap::new();
    for attempt in attempts {
        if let Some(fingerprint) = attempt.fingerprint() {
            by_fingerprint.entry(fingerprint).or_default().push(attempt);
        }
    }

    let mut groups: Vec<SolutionGroup> = by_fingerprint
        .into_iter()
        .map(|(fingerprint, members)| build_group(fingerprint, members))
        .collect();

    groups.sort_by(|a, b| {
        b.contains_passer
            .cmp(&a.contains_passer)
            .then(b.vote_count.cmp(&a.vote_count))
            .then(
                b.best_aggregate_score
                    .partial_cmp(&a.best_aggregate_score)
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.min_iteration.cmp(&b.min_iteration))
            .then(a.fingerprint.cmp(&b.fingerprint))
    });
    groups
}

fn build_group(fingerprint: String, members: Vec<&Attempt>) -> SolutionGroup {
    let mut seen = HashSet::new();
    let mut members: Vec<Attempt> = members
        .into_iter()
        .filter(|attempt| seen.insert((attempt.expert_id.clone(), attempt.iteration_index)))
        .cloned()
        .collect();
    members.sort_by(|a, b| {
        b.aggregate_score
            .partial_cmp(&a.aggregate_score)
            .unwrap_or(Ordering::Equal)
            .then(a.iteration_index.cmp(&b.iteration_index))
            .then(a.expert_id.cmp(&b.expert_id))
    });

    let contains_passer = members.iter().any(|attempt| attempt.all_pass);
    let passers = members.iter().filter(|attempt| attempt.all_pass).count();
    let reinforcements = if contains_passer {
        members
            .iter()
            .filter(|attempt| !attempt.all_pass && attempt.counts_when_failed)
            .count()
    } else {
        0
    };
    let best_aggregate_score = members
        .iter()
        .map(|attempt| attempt.aggregate_score)
        .fold(0.0_f64, f64::max);
    let min_iteration = members
        .iter()
        .map(|attempt| attempt.iteration_index)
        .min()
        .unwrap_or(0);

    SolutionGroup {
        fingerprint,
        members,
        vote_count: passers + reinforcements,
        best_aggregate_score,
        contains_passer,
        min_iteration,
    }
}

/// Emits up to `attempts_per_puzzle` final attempts, diversity-first: each
/// group's representative in rank order, then second representatives, and so
/// on. With no groups at all, emits all-null attempts.
pub fn rank_attempts(
    attempts: &[Attempt],
    test_count: usize,
    attempts_per_puzzle: usize,
) -> Vec<RankedAttempt> {
    let groups = solution_groups(attempts);
    if groups.is_empty() {
        return vec![RankedAttempt::null(test_count); attempts_per_puzzle];
    }

    let mut emitted = Vec::new();
    let mut depth = 0;
    while emitted.len() < attempts_per_puzzle {
        let mut any_at_depth = false;
        for group in &groups {
            let Some(member) = group.members.get(depth) else {
                continue;
            };
            any_at_depth = true;
            emitted.push(RankedAttempt::from_member(member));
            if emitted.len() == attempts_per_puzzle {
                break;
            }
        }
        if !any_at_depth {
            break;
        }
        depth += 1;
    }
    emitted
}
