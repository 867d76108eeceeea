use std::sync::Arc;

use chrono::Duration;
use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    clock::Clock,
    common::Principal,
    ledger::Ledger,
    voting::OptionPolicy,
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    root_principal: Principal,
    #[serde(default)]
    strict_options: bool,
    #[serde(default = "default_max_page_size")]
    max_page_size: usize,
    // secrets
    jwt_secret: String,
    hmac_secret: String,
}

fn default_max_page_size() -> usize {
    100
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// The principal holding root authority.
    pub fn root_principal(&self) -> Principal {
        self.root_principal
    }

    /// Whether votes must name one of the poll's declared options.
    pub fn option_policy(&self) -> OptionPolicy {
        OptionPolicy::from_strict(self.strict_options)
    }

    /// Largest page a listing endpoint will return.
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Secret key used to encrypt JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Secret key used to derive login keys.
    pub fn hmac_secret(&self) -> &[u8] {
        self.hmac_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(err) => {
                error!("Failed to load application config: {err}");
                return Err(rocket);
            }
        };
        info!("Loaded config, root authority is {}", config.root_principal);

        Ok(rocket.manage(config))
    }
}

/// A fairing that builds an empty [`Ledger`] from the managed [`Config`] and
/// places it into managed state. Must be attached after [`ConfigFairing`].
pub struct LedgerFairing {
    clock: Arc<dyn Clock>,
}

impl LedgerFairing {
    /// Build the ledger over the given clock instead of the wall clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[rocket::async_trait]
impl Fairing for LedgerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Ledger",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let ledger = match rocket.state::<Config>() {
            Some(config) => Ledger::new(
                config.root_principal(),
                config.option_policy(),
                self.clock.clone(),
            ),
            None => {
                error!("Cannot build the ledger without a loaded config");
                return Err(rocket);
            }
        };
        info!("Ledger online at {}", ledger.now());

        Ok(rocket.manage(ledger))
    }
}
