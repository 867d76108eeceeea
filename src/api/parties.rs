use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            membership::{MembershipStatus, RegisterPartyRequest},
        },
        common::Principal,
        ledger::Ledger,
        pagination::{Paginated, PaginationRequest},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![
        register_party,
        list_parties,
        request_membership,
        list_requested_voters,
        membership_status,
        accept_membership,
        reject_membership,
        remove_membership,
    ]
}

#[post("/parties", data = "<request>", format = "json")]
async fn register_party(
    token: AuthToken,
    request: Json<RegisterPartyRequest>,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger.register_party(&token.principal(), request.party)?;
    Ok(())
}

#[get("/parties?<pagination..>")]
async fn list_parties(
    pagination: PaginationRequest,
    ledger: &State<Ledger>,
    config: &State<Config>,
) -> Json<Paginated<Principal>> {
    let pagination = pagination.capped(config.max_page_size());
    let page = ledger.list_parties(pagination.offset, pagination.limit);
    Json(pagination.to_paginated(page))
}

#[post("/parties/<party>/requests")]
async fn request_membership(
    token: AuthToken,
    party: Principal,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger.request_membership(token.principal(), party)?;
    Ok(())
}

#[get("/parties/<party>/requests?<pagination..>")]
async fn list_requested_voters(
    party: Principal,
    pagination: PaginationRequest,
    ledger: &State<Ledger>,
    config: &State<Config>,
) -> Json<Paginated<Principal>> {
    let pagination = pagination.capped(config.max_page_size());
    let page = ledger.list_requested_voters(&party, pagination.offset, pagination.limit);
    Json(pagination.to_paginated(page))
}

#[get("/parties/<party>/members/<voter>")]
async fn membership_status(
    party: Principal,
    voter: Principal,
    ledger: &State<Ledger>,
) -> Json<MembershipStatus> {
    Json(ledger.membership_state(&party, &voter).into())
}

#[post("/party/requests/<voter>/accept")]
async fn accept_membership(
    token: AuthToken,
    voter: Principal,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger.accept_membership(token.principal(), voter)?;
    Ok(())
}

#[post("/party/requests/<voter>/reject")]
async fn reject_membership(
    token: AuthToken,
    voter: Principal,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger.reject_membership(token.principal(), voter)?;
    Ok(())
}

#[delete("/party/members/<voter>")]
async fn remove_membership(
    token: AuthToken,
    voter: Principal,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger.remove_membership(token.principal(), voter)?;
    Ok(())
}
