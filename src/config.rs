use data_encoding::HEXLOWER_PERMISSIVE;
use ed25519_dalek::SigningKey;
use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::near::{ElectionsContract, NearContract};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. The server consumes it inside [`ContractFairing`];
/// the voter CLI extracts it from the same figment.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    network_id: String,
    node_url: String,
    account_id: String,
    contract_id: String,
    // secrets
    signing_key: String,
}

impl Config {
    /// Name of the chain the node belongs to (e.g. `testnet`).
    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    /// JSON-RPC endpoint of the contract node.
    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// The organization account the gateway acts (and signs) as.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Account the elections contract is deployed to.
    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// The account's ed25519 key, configured as a hex-encoded 32-byte seed
    /// (with or without the `ed25519:` prefix).
    /// Named to avoid colliding with Rocket's own `secret_key` value.
    pub fn signing_key(&self) -> Result<SigningKey> {
        let hex = self
            .signing_key
            .strip_prefix("ed25519:")
            .unwrap_or(&self.signing_key);
        let bytes = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|err| Error::SigningKey(err.to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| {
                Error::SigningKey(format!("expected 32 bytes, got {}", bytes.len()))
            })?;
        Ok(SigningKey::from_bytes(&seed))
    }
}

/// A fairing that loads the application config, builds the contract client
/// from it, and puts both in managed state. Routes only ever see the
/// `ElectionsContract` trait object, so tests can swap the client out.
pub struct ContractFairing;

#[rocket::async_trait]
impl Fairing for ContractFairing {
    fn info(&self) -> Info {
        Info {
            name: "Elections Contract",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Construct the contract client.
        let contract = match NearContract::new(&config) {
            Ok(contract) => contract,
            Err(e) => {
                error!("Failed to construct contract client: {e}");
                return Err(rocket);
            }
        };
        info!(
            "Acting as {} on contract {} via {} ({})",
            config.account_id(),
            config.contract_id(),
            config.node_url(),
            config.network_id()
        );

        // Manage the state.
        rocket = rocket.manage(Box::new(contract) as Box<dyn ElectionsContract>);
        Ok(rocket)
    }
}
