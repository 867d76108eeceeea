#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use std::sync::Arc;

use rocket::{figment::Figment, Build, Rocket};

use crate::config::{ConfigFairing, LedgerFairing};
use crate::logging::LoggerFairing;
use crate::model::clock::{Clock, SystemClock};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Build the server from `Rocket.toml` and `ROCKET_*` variables, over the wall clock.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build(), Arc::new(SystemClock))
}

/// Build the server from an explicit configuration and clock.
pub fn rocket_with_clock(figment: Figment, clock: Arc<dyn Clock>) -> Rocket<Build> {
    assemble(rocket::custom(figment), clock)
}

fn assemble(rocket: Rocket<Build>, clock: Arc<dyn Clock>) -> Rocket<Build> {
    rocket
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(LedgerFairing::with_clock(clock))
}

/// Configuration used by the HTTP tests.
#[cfg(test)]
pub(crate) fn test_figment() -> Figment {
    use crate::model::common::Principal;

    rocket::Config::figment()
        .merge(("log_level", "off"))
        .merge(("auth_ttl", 3600))
        .merge(("root_principal", Principal::example_root().to_string()))
        .merge(("strict_options", false))
        .merge(("max_page_size", 100))
        .merge(("jwt_secret", "test jwt secret"))
        .merge(("hmac_secret", "test hmac secret"))
}
