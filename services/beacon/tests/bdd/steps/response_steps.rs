//! BDD step definitions shared by every feature: requests and responses

use cucumber::{given, then, when};

use beacon::io::HttpMethod;

use crate::world::BeaconWorld;

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("Unknown method: {}", other),
    }
}

#[given(expr = "the backend answers {word} {string} with status {int} and body {string}")]
fn backend_answers(world: &mut BeaconWorld, method: String, path: String, status: u16, body: String) {
    world
        .backend()
        .respond(parse_method(&method), &path, status, body);
}

#[when(expr = "the user requests {string}")]
async fn user_requests(world: &mut BeaconWorld, uri: String) {
    world.send("GET", &uri, None).await;
}

#[then(expr = "the response status should be {int}")]
fn response_status(world: &mut BeaconWorld, status: u16) {
    let response = world.response();
    assert_eq!(
        response.status, status,
        "unexpected status, body: {}",
        response.body
    );
}

#[then(expr = "the response message should be {string}")]
fn response_message(world: &mut BeaconWorld, message: String) {
    assert_eq!(world.response().json()["message"], message.as_str());
}

#[then(expr = "the response should contain {string}")]
fn response_contains(world: &mut BeaconWorld, expected: String) {
    let body = &world.response().body;
    assert!(
        body.contains(&expected),
        "Expected response to contain '{}', but it didn't.\nResponse body:\n{}",
        expected,
        body
    );
}

#[then(expr = "the response body should have field {string}")]
fn response_has_field(world: &mut BeaconWorld, field: String) {
    let json = world.response().json();
    assert!(
        json.get(&field).is_some(),
        "Expected field '{}' in response body:\n{}",
        field,
        world.response().body
    );
}

#[then(expr = "the response body should not have field {string}")]
fn response_lacks_field(world: &mut BeaconWorld, field: String) {
    let json = world.response().json();
    assert!(
        json.get(&field).is_none(),
        "Expected no field '{}' in response body:\n{}",
        field,
        world.response().body
    );
}

#[then(expr = "the backend should have received {int} request(s) to {string}")]
fn backend_request_count(world: &mut BeaconWorld, count: usize, path: String) {
    assert_eq!(world.backend().requests_to(&path).len(), count);
}

#[then(expr = "the last request to {string} should carry bearer {string}")]
fn last_request_bearer(world: &mut BeaconWorld, path: String, token: String) {
    let requests = world.backend().requests_to(&path);
    let last = requests.last().expect("no request to path");
    assert_eq!(last.bearer.as_deref(), Some(token.as_str()));
}
