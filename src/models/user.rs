use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A known user, as provided by the users file.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct UserFile {
    #[serde(alias = "usuarios", default)]
    pub users: Vec<User>,
}

/// Request for logging in
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

/// Response for a successful login
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub user: User,
}
