//! Local, read-only view filtering over the mirrored collection.

use std::{fmt, str::FromStr};

use shared::domain::{Gender, ParseChoiceError, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenderFilter {
    #[default]
    All,
    Only(Gender),
}

impl GenderFilter {
    fn admits(self, gender: Gender) -> bool {
        match self {
            GenderFilter::All => true,
            GenderFilter::Only(wanted) => wanted == gender,
        }
    }
}

impl fmt::Display for GenderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenderFilter::All => f.write_str("all"),
            GenderFilter::Only(gender) => write!(f, "{gender}"),
        }
    }
}

impl FromStr for GenderFilter {
    type Err = ParseChoiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(GenderFilter::All);
        }
        value.parse().map(GenderFilter::Only)
    }
}

impl From<Gender> for GenderFilter {
    fn from(gender: Gender) -> Self {
        GenderFilter::Only(gender)
    }
}

/// View parameters chosen by the operator. Never persisted or sent anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub gender: GenderFilter,
    pub name: String,
}

impl FilterCriteria {
    pub fn with_gender(mut self, gender: impl Into<GenderFilter>) -> Self {
        self.gender = gender.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.gender == GenderFilter::All && self.name.is_empty()
    }

    pub fn matches(&self, record: &UserRecord) -> bool {
        self.gender.admits(record.gender)
            && (self.name.is_empty() || contains_ignore_case(&record.name, &self.name))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Records of `collection` that pass `criteria`, in collection order.
pub fn apply<'a>(collection: &'a [UserRecord], criteria: &FilterCriteria) -> Vec<&'a UserRecord> {
    if criteria.is_unfiltered() {
        return collection.iter().collect();
    }
    collection
        .iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
