//! BDD step definitions for sign-in and sign-out

use cucumber::{given, then, when};
use serde_json::json;

use beacon::io::HttpMethod;

use crate::world::BeaconWorld;

fn sign_in_body(email: &str, name: &str, expires_in: u64) -> String {
    json!({
        "status": true,
        "data": {
            "user": {"id": "u1", "name": name, "email": email},
            "accessToken": "at",
            "refreshToken": "rt",
            "expiresIn": expires_in
        }
    })
    .to_string()
}

#[given("a running gateway")]
fn running_gateway(world: &mut BeaconWorld) {
    world.start(BeaconWorld::config());
}

#[given("a running gateway that keeps sessions after failed refreshes")]
fn running_gateway_keeping_sessions(world: &mut BeaconWorld) {
    let mut config = BeaconWorld::config();
    config.session.sign_out_on_refresh_error = false;
    world.start(config);
}

#[given(expr = "the backend accepts sign-in for {string} as {string} with a {int} second token")]
fn backend_accepts_password(world: &mut BeaconWorld, email: String, name: String, expires_in: u64) {
    world.backend().respond(
        HttpMethod::Post,
        "/auth/login",
        200,
        sign_in_body(&email, &name, expires_in),
    );
}

#[given(
    expr = "the backend accepts one-time code sign-in for {string} as {string} with a {int} second token"
)]
fn backend_accepts_otp(world: &mut BeaconWorld, email: String, name: String, expires_in: u64) {
    world.backend().respond(
        HttpMethod::Post,
        "/auth/verify-otp",
        200,
        sign_in_body(&email, &name, expires_in),
    );
}

#[given(expr = "the backend rejects sign-in with {string}")]
fn backend_rejects(world: &mut BeaconWorld, message: String) {
    world.backend().respond(
        HttpMethod::Post,
        "/auth/login",
        401,
        json!({"status": false, "message": message}).to_string(),
    );
}

#[given(expr = "the backend answers sign-in with status {int} but no success flag")]
fn backend_answers_without_status(world: &mut BeaconWorld, status: u16) {
    world.backend().respond(
        HttpMethod::Post,
        "/auth/login",
        status,
        json!({"message": "Account not verified"}).to_string(),
    );
}

#[given(expr = "the user is signed in as {string} with a {int} second token")]
async fn user_signed_in(world: &mut BeaconWorld, name: String, expires_in: u64) {
    world.sign_in_directly(&name, expires_in).await;
}

#[when(expr = "the user signs in with email {string} and password {string}")]
async fn sign_in_with_password(world: &mut BeaconWorld, email: String, password: String) {
    world
        .send(
            "POST",
            "/api/auth/login",
            Some(json!({"email": email, "password": password})),
        )
        .await;
    adopt_session_cookie(world);
}

#[when(expr = "the user signs in with email {string} and code {string}")]
async fn sign_in_with_code(world: &mut BeaconWorld, email: String, otp: String) {
    world
        .send(
            "POST",
            "/api/auth/login",
            Some(json!({"email": email, "otp": otp, "loginType": "otp"})),
        )
        .await;
    adopt_session_cookie(world);
}

#[when("the user signs out")]
async fn sign_out(world: &mut BeaconWorld) {
    world.send("POST", "/api/auth/logout", None).await;
}

/// Keep the session id from a `Set-Cookie` the way a browser would
fn adopt_session_cookie(world: &mut BeaconWorld) {
    let cookie_name = world.gateway().session_config.cookie_name.clone();
    let id = world
        .response()
        .set_cookie
        .as_deref()
        .and_then(|c| c.split(';').next())
        .and_then(|pair| pair.strip_prefix(&format!("{}=", cookie_name)))
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    if id.is_some() {
        world.session_id = id;
    }
}

#[then("a session cookie should be set")]
fn cookie_set(world: &mut BeaconWorld) {
    let cookie = world
        .response()
        .set_cookie
        .as_deref()
        .expect("no Set-Cookie header");
    assert!(cookie.starts_with("beacon_session="), "cookie: {}", cookie);
    assert!(cookie.contains("HttpOnly"), "cookie: {}", cookie);
    assert!(world.session_id.is_some());
}

#[then("no session cookie should be set")]
fn cookie_not_set(world: &mut BeaconWorld) {
    assert_eq!(world.response().set_cookie, None);
}

#[then("the session cookie should be cleared")]
fn cookie_cleared(world: &mut BeaconWorld) {
    let cookie = world
        .response()
        .set_cookie
        .as_deref()
        .expect("no Set-Cookie header");
    assert!(cookie.contains("Max-Age=0"), "cookie: {}", cookie);
}

#[then("the session should be gone")]
async fn session_gone(world: &mut BeaconWorld) {
    assert!(world.stored_record().await.is_none());
    assert!(world.gateway().sessions.is_empty().await);
}

#[then(expr = "the stored session name should be {string}")]
async fn stored_name(world: &mut BeaconWorld, name: String) {
    let record = world.stored_record().await.expect("no stored session");
    assert_eq!(record.name, name);
}

#[then("the sign-in request should not contain a password")]
fn no_password_sent(world: &mut BeaconWorld) {
    let requests = world.backend().requests_to("/auth/verify-otp");
    assert_eq!(requests.len(), 1);
    let body = requests[0].body.as_ref().expect("no request body");
    assert!(body.get("password").is_none(), "body: {}", body);
    assert!(body.get("otp").is_some());
}
