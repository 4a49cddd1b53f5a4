use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("user name cannot be empty")]
    EmptyName,

    #[error("department cannot be empty")]
    EmptyDepartment,
}

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A registered learner or administrator.
///
/// Only `last_activity` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    department: String,
    role: Role,
    last_activity: DateTime<Utc>,
}

impl User {
    /// Creates a user with trimmed name and department.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyName` or `UserError::EmptyDepartment` when the
    /// respective field is blank.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        department: impl Into<String>,
        role: Role,
        last_activity: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        let department = department.into().trim().to_owned();
        if department.is_empty() {
            return Err(UserError::EmptyDepartment);
        }

        Ok(Self {
            id,
            name,
            department,
            role,
            last_activity,
        })
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn department(&self) -> &str {
        &self.department
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Refresh the last-activity timestamp.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_activity = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn user_new_trims_fields() {
        let user = User::new(
            UserId::new("u1"),
            "  Ivan Petrov ",
            " Sales ",
            Role::Student,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(user.name(), "Ivan Petrov");
        assert_eq!(user.department(), "Sales");
        assert!(user.is_student());
    }

    #[test]
    fn user_new_rejects_blank_fields() {
        let err = User::new(UserId::new("u1"), " ", "IT", Role::Student, fixed_now()).unwrap_err();
        assert_eq!(err, UserError::EmptyName);

        let err = User::new(UserId::new("u1"), "Anna", "", Role::Admin, fixed_now()).unwrap_err();
        assert_eq!(err, UserError::EmptyDepartment);
    }

    #[test]
    fn user_deserializes_stored_shape() {
        let json = r#"{"id":"admin","name":"Admin","department":"IT","role":"admin","lastActivity":"2024-01-02T03:04:05.000Z"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id().as_str(), "admin");
        assert_eq!(user.role(), Role::Admin);
        assert!(!user.is_student());
    }
}
