use rocket::{
    http::{CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::auth::{AuthToken, LoginRequest, WhoAmI, AUTH_TOKEN_COOKIE},
        ledger::Ledger,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![login, whoami, logout]
}

#[post("/auth", data = "<request>", format = "json")]
async fn login(
    request: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
) -> Result<()> {
    if !request.verify(config.hmac_secret()) {
        return Err(Error::Unauthorized(format!(
            "Incorrect login key for {}",
            request.principal
        )));
    }

    let token = AuthToken::new(request.principal);
    cookies.add(token.into_cookie(config)?);

    Ok(())
}

#[get("/auth")]
async fn whoami(token: AuthToken, ledger: &State<Ledger>) -> Json<WhoAmI> {
    let principal = token.principal();
    Json(WhoAmI {
        principal,
        capabilities: ledger.capabilities(&principal),
    })
}

#[delete("/auth")]
fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(AUTH_TOKEN_COOKIE);
    Status::Ok
}

/// Log the client in as `principal`, using the key the operator would issue.
#[cfg(test)]
pub(crate) async fn login_as(
    client: &rocket::local::asynchronous::Client,
    principal: crate::model::common::Principal,
) {
    use rocket::{http::ContentType, serde::json::serde_json::json};

    let config = client.rocket().state::<Config>().unwrap();
    let request = LoginRequest::for_principal(principal, config.hmac_secret());
    let response = client
        .post(uri!(login))
        .header(ContentType::JSON)
        .body(json!(request).to_string())
        .dispatch()
        .await;
    assert_eq!(Status::Ok, response.status());
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client, serde::json::serde_json::json};

    use crate::model::{authority::Capability, common::Principal};

    use super::*;

    #[backend_test]
    async fn login_with_valid_key(client: Client) {
        login_as(&client, Principal::example_voter()).await;
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
    }

    #[backend_test]
    async fn login_with_invalid_key(client: Client) {
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(LoginRequest::example_invalid()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
    }

    #[backend_test]
    async fn key_for_another_secret_is_rejected(client: Client) {
        let request = LoginRequest::for_principal(Principal::example_voter(), b"wrong secret");
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(request).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(root)]
    async fn whoami_root(client: Client) {
        let response = client.get(uri!(whoami)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let me: WhoAmI = response.into_json().await.unwrap();
        assert_eq!(
            WhoAmI {
                principal: Principal::example_root(),
                capabilities: vec![Capability::RootAuthority],
            },
            me
        );
    }

    #[backend_test(voter)]
    async fn party_rights_apply_without_new_login(client: Client) {
        let voter = Principal::example_voter();
        let me: WhoAmI = client
            .get(uri!(whoami))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert!(me.capabilities.is_empty());

        client
            .rocket()
            .state::<Ledger>()
            .unwrap()
            .register_party(&Principal::example_root(), voter)
            .unwrap();

        let me: WhoAmI = client
            .get(uri!(whoami))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(vec![Capability::Party], me.capabilities);
    }

    #[backend_test]
    async fn whoami_not_logged_in(client: Client) {
        let response = client.get(uri!(whoami)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(party)]
    async fn logout_party(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));

        let response = client.get(uri!(whoami)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn logout_not_logged_in(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
    }
}
