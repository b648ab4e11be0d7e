//! BDD step definitions for beacon gateway

pub mod guard_steps;
pub mod login_steps;
pub mod profile_steps;
pub mod refresh_steps;
pub mod response_steps;
