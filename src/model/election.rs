use serde::{Deserialize, Serialize};

use crate::model::serde_string;

/// Elections are numbered per organization by the contract, in creation order.
pub type ElectionId = u128;

/// Candidates have no identity of their own; a vote targets a position in the
/// election's candidate list.
pub type CandidateId = u8;

/// A new election, as submitted by an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Voting opens, in nanoseconds since the epoch.
    #[serde(with = "serde_string")]
    pub start: u64,
    /// Voting closes, in nanoseconds since the epoch.
    #[serde(with = "serde_string")]
    pub end: u64,
    /// Election name.
    pub title: String,
    /// Longer ballot text.
    pub description: String,
    /// Candidate names, in ballot order.
    pub candidates: Vec<String>,
}

/// An election as stored on the ledger, including running tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionView {
    /// Voting opens, in nanoseconds since the epoch.
    #[serde(with = "serde_string")]
    pub start: u64,
    /// Voting closes, in nanoseconds since the epoch.
    #[serde(with = "serde_string")]
    pub end: u64,
    /// Election name.
    pub title: String,
    /// Longer ballot text.
    pub description: String,
    /// Candidates with their current tallies, in ballot order.
    pub candidates: Vec<Candidate>,
}

/// One line of an election's ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate name.
    pub name: String,
    /// Votes received so far. Only ever increases.
    #[serde(with = "serde_string")]
    pub votes: u128,
}

/// Response body for a successful election creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedElection {
    /// The ID the contract assigned to the new election.
    #[serde(with = "serde_string")]
    pub id: ElectionId,
}

impl ElectionSpec {
    /// The view the contract would return for this spec before any votes.
    pub fn into_view(self) -> ElectionView {
        ElectionView {
            start: self.start,
            end: self.end,
            title: self.title,
            description: self.description,
            candidates: self
                .candidates
                .into_iter()
                .map(|name| Candidate { name, votes: 0 })
                .collect(),
        }
    }
}
