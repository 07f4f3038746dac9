use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct ParseChoiceError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

macro_rules! choice_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseChoiceError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(ParseChoiceError {
                    kind: $kind,
                    value: value.to_string(),
                    expected: concat!($($text, " "),+).trim_ascii_end(),
                })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

choice_enum!(Gender, "gender", { Male => "male", Female => "female" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

choice_enum!(UserStatus, "status", { Active => "active", Inactive => "inactive" });

/// A user as the remote service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub status: UserStatus,
}

/// Unsaved field values of a create or edit form. Also the request body sent on
/// create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
}

impl UserDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::EmptyName);
        }
        if !EMAIL_SHAPE.is_match(self.email.trim()) {
            return Err(DraftError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    /// Sets a field by its form name. Used by text-driven editors.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), DraftFieldError> {
        match field.trim().to_ascii_lowercase().as_str() {
            "name" => self.name = value.trim().to_string(),
            "email" => self.email = value.trim().to_string(),
            "gender" => self.gender = value.parse()?,
            "status" => self.status = value.parse()?,
            other => return Err(DraftFieldError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftFieldError {
    #[error("unknown field '{0}', expected one of: name email gender status")]
    UnknownField(String),
    #[error(transparent)]
    Choice(#[from] ParseChoiceError),
}

impl From<&UserRecord> for UserDraft {
    fn from(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            gender: record.gender,
            status: record.status,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
