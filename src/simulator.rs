use std::collections::HashMap;

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter at least 2 destinations.")]
    TooFewDestinations,
    #[error("Please enter at least 1 participant.")]
    TooFewParticipants,
}

/// Occurrence counts per destination label. Labels that were never drawn are
/// absent, so a zero-draw run produces an empty tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally(HashMap<String, u64>);

impl Tally {
    pub fn from_picks(picks: &[String]) -> Tally {
        let mut counts = HashMap::new();
        for pick in picks {
            *counts.entry(pick.clone()).or_insert(0) += 1;
        }
        Tally(counts)
    }

    pub fn count(&self, label: &str) -> u64 {
        self.0.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: &Tally) {
        for (label, count) in &other.0 {
            *self.0.entry(label.clone()).or_insert(0) += count;
        }
    }

    /// Entries ordered by descending count, ties broken by label so the order
    /// is stable for a given result.
    pub fn sorted_desc(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.0.iter().map(|(l, c)| (l.as_str(), *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries
    }

    pub fn top_pick(&self) -> Option<(&str, u64)> {
        self.sorted_desc().into_iter().next()
    }
}

pub struct ParticipantResult {
    pub name: String,
    pub picks: Vec<String>,
    pub tally: Tally,
}

pub struct SimulationResult {
    /// One entry per participant, in input order.
    pub participants: Vec<ParticipantResult>,
    pub overall: Tally,
}

pub fn validate(destinations: &[String], participants: &[String]) -> Result<(), ValidationError> {
    if destinations.len() < 2 {
        return Err(ValidationError::TooFewDestinations);
    }
    if participants.is_empty() {
        return Err(ValidationError::TooFewParticipants);
    }
    Ok(())
}

/// Draws `draws` destinations per participant, each chosen uniformly at random
/// with replacement. Entries are not deduplicated: a label listed twice is two
/// slots sharing a name, so it is twice as likely to be drawn and its counts
/// merge in the tallies.
pub fn run_simulation(
    destinations: &[String],
    participants: &[String],
    draws: u32,
    rng: &mut impl Rng,
) -> SimulationResult {
    let mut results = Vec::with_capacity(participants.len());
    let mut overall = Tally::default();

    for name in participants {
        let picks: Vec<String> = (0..draws)
            .map(|_| destinations[rng.random_range(0..destinations.len())].clone())
            .collect();
        let tally = Tally::from_picks(&picks);
        overall.merge(&tally);
        results.push(ParticipantResult {
            name: name.clone(),
            picks,
            tally,
        });
    }

    SimulationResult {
        participants: results,
        overall,
    }
}
