//! REST gateway in front of a NEAR elections contract.
//!
//! The server translates three HTTP endpoints into calls on the contract and
//! nothing more; the contract remains the authority on every rule. The
//! `voter-cli` binary (feature `voter`) covers the voter-side operations the
//! gateway does not expose over HTTP.

#[macro_use]
extern crate rocket;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod near;

use rocket::{Build, Rocket};

use config::ContractFairing;
use logging::LoggerFairing;

/// Assemble the server: routes plus the fairings that load the config and
/// connect the contract client.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ContractFairing)
        .attach(LoggerFairing)
}

/// A local client over the routes with the given contract substituted for
/// the real one.
#[cfg(test)]
pub(crate) async fn client_for_contract(
    contract: Box<dyn near::ElectionsContract>,
) -> rocket::local::asynchronous::Client {
    let rocket = rocket::build().mount("/", api::routes()).manage(contract);
    rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .unwrap()
}
