use rocket::Route;

mod auth;
mod parties;
mod polls;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(parties::routes());
    routes.extend(polls::routes());
    routes
}
