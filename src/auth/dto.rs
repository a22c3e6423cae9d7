use serde::{Deserialize, Serialize};

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Plain confirmation body used by register, login and logout.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
