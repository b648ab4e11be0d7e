//! BDD step definitions for profile and password changes

use cucumber::when;
use serde_json::json;

use crate::world::BeaconWorld;

#[when(expr = "the user changes their name to {string}")]
async fn change_name(world: &mut BeaconWorld, name: String) {
    world
        .send("PATCH", "/api/auth/profile", Some(json!({ "name": name })))
        .await;
}

#[when(expr = "the user changes their password to {string} confirmed as {string}")]
async fn change_password(world: &mut BeaconWorld, new_password: String, confirm: String) {
    world
        .send(
            "PATCH",
            "/api/auth/password",
            Some(json!({
                "currentPassword": "secret1",
                "newPassword": new_password,
                "confirmPassword": confirm,
            })),
        )
        .await;
}
