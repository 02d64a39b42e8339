use rocket::{
    futures::future::try_join_all, response::status::Created, serde::json::Json, Route, State,
};

use crate::error::Result;
use crate::model::{
    election::{CreatedElection, ElectionId, ElectionSpec, ElectionView},
    pagination::{Page, PaginationRequest},
};
use crate::near::ElectionsContract;

pub fn routes() -> Vec<Route> {
    routes![create_election, get_election, get_elections]
}

/// Create an election under the configured organization. The contract
/// answers with the assigned ID, echoed in the `Location` header and body.
#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    spec: Json<ElectionSpec>,
    contract: &State<Box<dyn ElectionsContract>>,
) -> Result<Created<Json<CreatedElection>>> {
    let id = contract.create_election(&spec.0).await?;
    let location = uri!(get_election(id)).to_string();
    Ok(Created::new(location).body(Json(CreatedElection { id })))
}

/// Fetch one election with its current tallies.
#[get("/elections/<election_id>")]
async fn get_election(
    election_id: ElectionId,
    contract: &State<Box<dyn ElectionsContract>>,
) -> Result<Json<ElectionView>> {
    Ok(Json(contract.get_election(election_id).await?))
}

/// Page through the organization's elections: read the count, locate the
/// page, then fetch every row on it concurrently. The join keeps responses
/// in index order regardless of arrival order.
#[get("/elections")]
async fn get_elections(
    pagination: PaginationRequest,
    contract: &State<Box<dyn ElectionsContract>>,
) -> Result<Json<Page<ElectionView>>> {
    let elements_count = contract.elections_count().await?;
    let bounds = pagination.bounds(elements_count);
    let values = try_join_all(
        (0..bounds.length).map(|offset| contract.get_election(bounds.start + u128::from(offset))),
    )
    .await?;
    Ok(Json(pagination.into_page(elements_count, values)))
}
