//! User domain model.
//!
//! # Responsibility
//! - Define the `User` record and its validation rule.
//! - Convert users to and from datastore entity properties.
//!
//! # Invariants
//! - `email` must be non-empty for a user to be valid.
//! - Property names are `Name` and `Email`, matching the stored entity shape.

use crate::datastore::Properties;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Entity kind under which users are stored.
pub const USER_KIND: &str = "User";

/// A stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name. No format constraint.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Natural key of the record.
    #[serde(rename = "Email")]
    pub email: String,
}

/// Validation errors for user records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyEmail,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "user email must not be empty"),
        }
    }
}

impl Error for UserValidationError {}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Checks the record can be persisted.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.email.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        Ok(())
    }

    /// Encodes this user as entity properties (`Name`, `Email`).
    pub fn to_properties(&self) -> Result<Properties, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "user encoded to non-object value `{other}`"
            ))),
        }
    }

    /// Decodes a user from stored entity properties.
    ///
    /// A missing `Name` decodes as an empty string; a missing `Email` is an
    /// error.
    pub fn from_properties(properties: Properties) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(properties))
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserValidationError};
    use serde_json::json;

    #[test]
    fn validate_rejects_empty_email() {
        let user = User::new("Pedro Costa", "");
        assert_eq!(user.validate(), Err(UserValidationError::EmptyEmail));
    }

    #[test]
    fn validate_accepts_any_name() {
        assert!(User::new("", "someone@example.com").validate().is_ok());
    }

    #[test]
    fn properties_use_entity_field_names() {
        let user = User::new("Pedro Costa", "pedro@pedrocelso.com.br");
        let props = user.to_properties().expect("user should encode");

        assert_eq!(props.len(), 2);
        assert_eq!(props["Name"], json!("Pedro Costa"));
        assert_eq!(props["Email"], json!("pedro@pedrocelso.com.br"));
    }

    #[test]
    fn from_properties_defaults_missing_name() {
        let props = json!({ "Email": "a@b.c" })
            .as_object()
            .cloned()
            .expect("literal is an object");
        let user = User::from_properties(props).expect("user should decode");
        assert_eq!(user, User::new("", "a@b.c"));
    }

    #[test]
    fn from_properties_requires_email() {
        let props = json!({ "Name": "nobody" })
            .as_object()
            .cloned()
            .expect("literal is an object");
        assert!(User::from_properties(props).is_err());
    }
}
