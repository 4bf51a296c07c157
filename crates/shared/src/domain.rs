use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(EmployeeId);

/// Editable fields of an employee, as sent in create and update bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
    /// Calendar date kept as the server sends it (`YYYY-MM-DD`).
    pub birth_date: String,
}

impl EmployeeDraft {
    /// Strips surrounding whitespace from every field, so what is validated is what is sent.
    pub fn trimmed(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            position: self.position.trim().to_string(),
            email: self.email.trim().to_string(),
            birth_date: self.birth_date.trim().to_string(),
        }
    }
}

/// A directory entry as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
    pub birth_date: String,
}

impl EmployeeRecord {
    pub fn from_draft(id: EmployeeId, draft: EmployeeDraft) -> Self {
        Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            position: draft.position,
            email: draft.email,
            birth_date: draft.birth_date,
        }
    }

    /// Pre-fills an edit form with the current values.
    pub fn to_draft(&self) -> EmployeeDraft {
        EmployeeDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            position: self.position.clone(),
            email: self.email.clone(),
            birth_date: self.birth_date.clone(),
        }
    }

    pub fn first_name_contains(&self, needle_lower: &str) -> bool {
        self.first_name.to_lowercase().contains(needle_lower)
    }
}
