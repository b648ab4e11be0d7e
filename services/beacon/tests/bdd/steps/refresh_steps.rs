//! BDD step definitions for access token refresh

use cucumber::{given, then};
use serde_json::json;

use beacon::io::HttpMethod;
use beacon::token::REFRESH_ERROR;

use crate::world::BeaconWorld;

#[given(expr = "the backend refreshes tokens to {string} with a {int} second lifetime")]
fn backend_refreshes(world: &mut BeaconWorld, access_token: String, expires_in: u64) {
    world.backend().respond(
        HttpMethod::Post,
        "/auth/refresh-token",
        200,
        json!({"data": {"accessToken": access_token, "expiresIn": expires_in}}).to_string(),
    );
}

#[given(expr = "the backend rotates tokens to {string} and {string}")]
fn backend_rotates(world: &mut BeaconWorld, access_token: String, refresh_token: String) {
    world.backend().respond(
        HttpMethod::Post,
        "/auth/refresh-token",
        200,
        json!({"data": {
            "accessToken": access_token,
            "refreshToken": refresh_token,
            "expiresIn": 900
        }})
        .to_string(),
    );
}

#[given("the backend rejects token refresh")]
fn backend_rejects_refresh(world: &mut BeaconWorld) {
    world.backend().respond(
        HttpMethod::Post,
        "/auth/refresh-token",
        401,
        json!({"message": "Refresh token expired"}).to_string(),
    );
}

#[then(expr = "the stored access token should be {string}")]
async fn stored_access_token(world: &mut BeaconWorld, token: String) {
    let record = world.stored_record().await.expect("no stored session");
    assert_eq!(record.access_token(), token);
}

#[then(expr = "the stored refresh token should be {string}")]
async fn stored_refresh_token(world: &mut BeaconWorld, token: String) {
    let record = world.stored_record().await.expect("no stored session");
    assert_eq!(record.refresh_token(), token);
}

#[then("the stored session should carry the refresh error")]
async fn stored_refresh_error(world: &mut BeaconWorld) {
    let record = world.stored_record().await.expect("no stored session");
    assert_eq!(record.error(), Some(REFRESH_ERROR));
}

#[then(expr = "the session should report the error {string}")]
fn session_reports_error(world: &mut BeaconWorld, error: String) {
    assert_eq!(world.response().json()["error"], error.as_str());
}
