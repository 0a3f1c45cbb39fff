use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::utils::serde_helpers::empty_string_as_none;

/// The identity resolved for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    /// Link to the employee record, present for employee-role users.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub employee_id: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// Payload for creating a login account.
#[derive(Clone, Serialize)]
pub struct UserRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegistrationResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user_id: String,
}
