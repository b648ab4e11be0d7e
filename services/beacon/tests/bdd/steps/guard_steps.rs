//! BDD step definitions for the route guard

use cucumber::then;

use crate::world::BeaconWorld;

#[then(expr = "the user should be redirected to {string}")]
fn redirected_to(world: &mut BeaconWorld, target: String) {
    let response = world.response();
    assert_eq!(response.status, 303, "body: {}", response.body);
    assert_eq!(response.location.as_deref(), Some(target.as_str()));
}

#[then("the user should not be redirected")]
fn not_redirected(world: &mut BeaconWorld) {
    let response = world.response();
    assert_ne!(response.status, 303, "redirected to {:?}", response.location);
    assert_eq!(response.location, None);
}
