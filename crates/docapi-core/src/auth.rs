use serde::{Deserialize, Serialize};

/// Credentials for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Optional; the server assigns a default privilege set when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privilege_set_name: Option<String>,
}

/// Token plus user metadata returned by login and register.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub privilege_set_id: Option<String>,
    #[serde(default)]
    pub privilege_set_name: Option<String>,
}
