//! Typed client for the remote elections contract.
//!
//! The contract scopes all data to an organization account; the gateway acts
//! as the one configured in `Config`. View methods pass it explicitly, change
//! methods sign as it.

mod rpc;

use std::str::FromStr;

use rocket::serde::json::serde_json;
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::election::{CandidateId, ElectionId, ElectionSpec, ElectionView};
use crate::model::serde_string;
use rpc::NearRpcClient;

/// Gas attached to every change call.
const FUNCTION_CALL_GAS: u64 = 300_000_000_000_000;

/// Deposit the contract charges for election creation, in yoctoNEAR (1 NEAR).
const CREATE_ELECTION_DEPOSIT: u128 = 1_000_000_000_000_000_000_000_000;

/// The elections contract, one method per remote method of the same name.
///
/// Errors from the remote call propagate unchanged; the gateway adds no
/// retries or fallbacks on top.
#[rocket::async_trait]
pub trait ElectionsContract: Send + Sync {
    /// Create an election under the organization. Returns the assigned ID;
    /// IDs number elections per organization in creation order.
    async fn create_election(&self, spec: &ElectionSpec) -> Result<ElectionId>;

    /// How many elections the organization has created so far.
    async fn elections_count(&self) -> Result<u128>;

    /// Fetch one election with its current tallies.
    async fn get_election(&self, election_id: ElectionId) -> Result<ElectionView>;

    /// Cast the signing account's vote for the candidate at `candidate_id`.
    async fn vote(&self, election_id: ElectionId, candidate_id: CandidateId) -> Result<()>;

    /// Whether the signing account has already voted in this election.
    async fn have_voted(&self, election_id: ElectionId) -> Result<bool>;
}

#[derive(Serialize)]
struct CreateElectionArgs<'a> {
    election: &'a ElectionSpec,
}

#[derive(Serialize)]
struct OrganizationArgs<'a> {
    organization_id: &'a str,
}

#[derive(Serialize)]
struct ElectionArgs<'a> {
    organization_id: &'a str,
    #[serde(with = "serde_string")]
    election_id: ElectionId,
}

#[derive(Serialize)]
struct VoteArgs<'a> {
    organization_id: &'a str,
    #[serde(with = "serde_string")]
    election_id: ElectionId,
    candidate_id: CandidateId,
}

/// Adapter from the typed interface to the contract's wire surface.
pub struct NearContract {
    rpc: NearRpcClient,
    contract_id: String,
    organization_id: String,
}

impl NearContract {
    /// Build a client for the contract and account in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let rpc = NearRpcClient::new(
            config.node_url().to_string(),
            config.account_id().to_string(),
            config.signing_key()?,
        )?;
        Ok(Self {
            rpc,
            contract_id: config.contract_id().to_string(),
            organization_id: config.account_id().to_string(),
        })
    }
}

#[rocket::async_trait]
impl ElectionsContract for NearContract {
    async fn create_election(&self, spec: &ElectionSpec) -> Result<ElectionId> {
        let value = self
            .rpc
            .function_call(
                &self.contract_id,
                "create_election",
                &CreateElectionArgs { election: spec },
                FUNCTION_CALL_GAS,
                CREATE_ELECTION_DEPOSIT,
            )
            .await?;
        parse_integer(&value)
    }

    async fn elections_count(&self) -> Result<u128> {
        let value = self
            .rpc
            .view_call(
                &self.contract_id,
                "elections_count",
                &OrganizationArgs {
                    organization_id: &self.organization_id,
                },
            )
            .await?;
        parse_integer(&value)
    }

    async fn get_election(&self, election_id: ElectionId) -> Result<ElectionView> {
        let value = self
            .rpc
            .view_call(
                &self.contract_id,
                "get_election",
                &ElectionArgs {
                    organization_id: &self.organization_id,
                    election_id,
                },
            )
            .await?;
        Ok(serde_json::from_slice(&value)?)
    }

    async fn vote(&self, election_id: ElectionId, candidate_id: CandidateId) -> Result<()> {
        self.rpc
            .function_call(
                &self.contract_id,
                "vote",
                &VoteArgs {
                    organization_id: &self.organization_id,
                    election_id,
                    candidate_id,
                },
                FUNCTION_CALL_GAS,
                0,
            )
            .await?;
        Ok(())
    }

    async fn have_voted(&self, election_id: ElectionId) -> Result<bool> {
        let value = self
            .rpc
            .function_call(
                &self.contract_id,
                "have_voted",
                &ElectionArgs {
                    organization_id: &self.organization_id,
                    election_id,
                },
                FUNCTION_CALL_GAS,
                0,
            )
            .await?;
        Ok(serde_json::from_slice(&value)?)
    }
}

/// Integers come back as JSON-encoded decimal strings; parse them exactly.
fn parse_integer<T: FromStr>(value: &[u8]) -> Result<T> {
    let string: String = serde_json::from_slice(value)?;
    string
        .parse()
        .map_err(|_| Error::Response(format!("expected a decimal integer, got \"{string}\"")))
}

/// In-memory contract for route tests: creation order assigns IDs, votes
/// tally positionally, and one vote is allowed per election, mirroring the
/// remote rules the tests rely on.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    pub struct MockContract {
        elections: Mutex<Vec<ElectionView>>,
        voted: Mutex<HashSet<ElectionId>>,
    }

    impl MockContract {
        pub fn new() -> Self {
            Self::with_elections(Vec::new())
        }

        pub fn with_elections(elections: Vec<ElectionView>) -> Self {
            Self {
                elections: Mutex::new(elections),
                voted: Mutex::new(HashSet::new()),
            }
        }

        pub fn boxed(self) -> Box<dyn ElectionsContract> {
            Box::new(self)
        }
    }

    #[rocket::async_trait]
    impl ElectionsContract for MockContract {
        async fn create_election(&self, spec: &ElectionSpec) -> Result<ElectionId> {
            let mut elections = self.elections.lock().unwrap();
            elections.push(spec.clone().into_view());
            Ok(elections.len() as ElectionId - 1)
        }

        async fn elections_count(&self) -> Result<u128> {
            Ok(self.elections.lock().unwrap().len() as u128)
        }

        async fn get_election(&self, election_id: ElectionId) -> Result<ElectionView> {
            self.elections
                .lock()
                .unwrap()
                .get(election_id as usize)
                .cloned()
                .ok_or_else(|| Error::Contract(format!("Election {election_id} does not exist")))
        }

        async fn vote(&self, election_id: ElectionId, candidate_id: CandidateId) -> Result<()> {
            let mut elections = self.elections.lock().unwrap();
            let election = elections
                .get_mut(election_id as usize)
                .ok_or_else(|| Error::Contract(format!("Election {election_id} does not exist")))?;
            let candidate = election
                .candidates
                .get_mut(usize::from(candidate_id))
                .ok_or_else(|| Error::Contract(format!("No candidate {candidate_id}")))?;
            if !self.voted.lock().unwrap().insert(election_id) {
                return Err(Error::Contract(
                    "Account has already voted in this election".to_string(),
                ));
            }
            candidate.votes += 1;
            Ok(())
        }

        async fn have_voted(&self, election_id: ElectionId) -> Result<bool> {
            Ok(self.voted.lock().unwrap().contains(&election_id))
        }
    }

    /// A contract whose node is never reachable.
    pub struct FailingContract;

    #[rocket::async_trait]
    impl ElectionsContract for FailingContract {
        async fn create_election(&self, _spec: &ElectionSpec) -> Result<ElectionId> {
            Err(Error::Contract("the node is down".to_string()))
        }

        async fn elections_count(&self) -> Result<u128> {
            Err(Error::Contract("the node is down".to_string()))
        }

        async fn get_election(&self, _election_id: ElectionId) -> Result<ElectionView> {
            Err(Error::Contract("the node is down".to_string()))
        }

        async fn vote(&self, _election_id: ElectionId, _candidate_id: CandidateId) -> Result<()> {
            Err(Error::Contract("the node is down".to_string()))
        }

        async fn have_voted(&self, _election_id: ElectionId) -> Result<bool> {
            Err(Error::Contract("the node is down".to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::model::election::Candidate;

        #[rocket::async_test]
        async fn votes_tally_positionally_and_once_per_account() {
            let contract = MockContract::with_elections(vec![
                ElectionSpec::example1().into_view(),
            ]);

            assert!(!contract.have_voted(0).await.unwrap());
            contract.vote(0, 1).await.unwrap();
            assert!(contract.have_voted(0).await.unwrap());

            let election = contract.get_election(0).await.unwrap();
            assert_eq!(
                election.candidates,
                vec![
                    Candidate {
                        name: "Ada".to_string(),
                        votes: 0,
                    },
                    Candidate {
                        name: "Grace".to_string(),
                        votes: 1,
                    },
                ]
            );

            contract.vote(0, 0).await.unwrap_err();
        }
    }
}
