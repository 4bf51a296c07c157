use serde::{Deserialize, Serialize};

/// Body of `POST /api/login` and `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

pub mod paths {
    pub const EMPLOYEES: &str = "api/employees";
    pub const POSITIONS: &str = "api/positions";
    pub const LOGIN: &str = "api/login";
    pub const REGISTER: &str = "api/register";

    pub fn employee(id: crate::domain::EmployeeId) -> String {
        format!("{EMPLOYEES}/{id}")
    }
}
