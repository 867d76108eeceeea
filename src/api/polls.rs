use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            poll::{CreatedPoll, VoteRequest},
        },
        common::{PollId, PollScope, Principal},
        ledger::Ledger,
        pagination::{Paginated, PaginationRequest},
        voting::{OptionTally, PollDetails, PollSpec},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_global_poll,
        list_global_polls,
        global_poll_details,
        cast_global_vote,
        tally_global,
        global_results,
        has_voted_global,
        create_local_poll,
        list_local_polls,
        local_poll_details,
        cast_local_vote,
        tally_local,
        local_results,
        has_voted_local,
    ]
}

// Global polls.

#[post("/polls", data = "<spec>", format = "json")]
async fn create_global_poll(
    token: AuthToken,
    spec: Json<PollSpec>,
    ledger: &State<Ledger>,
) -> Result<Json<CreatedPoll>> {
    let id = ledger
        .create_global_poll(&token.principal(), spec.into_inner())?;
    Ok(Json(CreatedPoll { id }))
}

#[get("/polls?<pagination..>")]
async fn list_global_polls(
    pagination: PaginationRequest,
    ledger: &State<Ledger>,
    config: &State<Config>,
) -> Json<Paginated<PollId>> {
    let pagination = pagination.capped(config.max_page_size());
    let page = ledger.list_global_poll_ids(pagination.offset, pagination.limit);
    Json(pagination.to_paginated(page))
}

#[get("/polls/<poll_id>")]
async fn global_poll_details(poll_id: PollId, ledger: &State<Ledger>) -> Json<PollDetails> {
    Json(ledger.global_poll_details(poll_id))
}

#[post("/polls/<poll_id>/votes", data = "<vote>", format = "json")]
async fn cast_global_vote(
    token: AuthToken,
    poll_id: PollId,
    vote: Json<VoteRequest>,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger
        .cast_global_vote(token.principal(), poll_id, vote.into_inner().option)?;
    Ok(())
}

#[get("/polls/<poll_id>/tally?<option>")]
async fn tally_global(
    poll_id: PollId,
    option: String,
    ledger: &State<Ledger>,
) -> Json<OptionTally> {
    let votes = ledger.tally_global(poll_id, &option);
    Json(OptionTally { option, votes })
}

#[get("/polls/<poll_id>/results")]
async fn global_results(poll_id: PollId, ledger: &State<Ledger>) -> Json<Vec<OptionTally>> {
    Json(ledger.results(&PollScope::Global, poll_id))
}

#[get("/polls/<poll_id>/voters/<principal>")]
async fn has_voted_global(
    poll_id: PollId,
    principal: Principal,
    ledger: &State<Ledger>,
) -> Json<bool> {
    Json(ledger.has_voted(&PollScope::Global, poll_id, &principal))
}

// Party polls.

#[post("/party/polls", data = "<spec>", format = "json")]
async fn create_local_poll(
    token: AuthToken,
    spec: Json<PollSpec>,
    ledger: &State<Ledger>,
) -> Result<Json<CreatedPoll>> {
    let id = ledger
        .create_local_poll(&token.principal(), spec.into_inner())?;
    Ok(Json(CreatedPoll { id }))
}

#[get("/parties/<party>/polls?<pagination..>")]
async fn list_local_polls(
    party: Principal,
    pagination: PaginationRequest,
    ledger: &State<Ledger>,
    config: &State<Config>,
) -> Json<Paginated<PollId>> {
    let pagination = pagination.capped(config.max_page_size());
    let page = ledger.list_local_poll_ids(party, pagination.offset, pagination.limit);
    Json(pagination.to_paginated(page))
}

#[get("/parties/<party>/polls/<poll_id>")]
async fn local_poll_details(
    party: Principal,
    poll_id: PollId,
    ledger: &State<Ledger>,
) -> Json<PollDetails> {
    Json(ledger.local_poll_details(party, poll_id))
}

#[post("/parties/<party>/polls/<poll_id>/votes", data = "<vote>", format = "json")]
async fn cast_local_vote(
    token: AuthToken,
    party: Principal,
    poll_id: PollId,
    vote: Json<VoteRequest>,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger
        .cast_local_vote(token.principal(), party, poll_id, vote.into_inner().option)?;
    Ok(())
}

#[get("/parties/<party>/polls/<poll_id>/tally?<option>")]
async fn tally_local(
    party: Principal,
    poll_id: PollId,
    option: String,
    ledger: &State<Ledger>,
) -> Json<OptionTally> {
    let votes = ledger.tally_local(party, poll_id, &option);
    Json(OptionTally { option, votes })
}

#[get("/parties/<party>/polls/<poll_id>/results")]
async fn local_results(
    party: Principal,
    poll_id: PollId,
    ledger: &State<Ledger>,
) -> Json<Vec<OptionTally>> {
    Json(ledger.results(&PollScope::Local(party), poll_id))
}

#[get("/parties/<party>/polls/<poll_id>/voters/<principal>")]
async fn has_voted_local(
    party: Principal,
    poll_id: PollId,
    principal: Principal,
    ledger: &State<Ledger>,
) -> Json<bool> {
    Json(ledger.has_voted(&PollScope::Local(party), poll_id, &principal))
}
