//! BDD test entry point for beacon gateway

#[path = "bdd/world.rs"]
mod world;

#[path = "bdd/steps/mod.rs"]
mod steps;

use cucumber::World as _;
use world::BeaconWorld;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    BeaconWorld::run("tests/features").await;
}
