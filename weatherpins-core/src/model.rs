use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Store-assigned document identifier. Opaque to the rest of the app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the id names a single document: non-empty and free of `/`.
    pub fn validate(&self) -> Result<(), InvalidLocationId> {
        if self.0.trim().is_empty() || self.0.contains('/') {
            return Err(InvalidLocationId(self.0.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid location id {0:?}: must be non-empty and contain no '/'")]
pub struct InvalidLocationId(pub String);

impl FromStr for LocationId {
    type Err = InvalidLocationId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self::new(s);
        id.validate()?;
        Ok(id)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A saved place with contact metadata and its last known temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub username: String,
    pub email: String,
    pub current_temp: Option<f64>,
    /// Server write time; `None` for documents written without one.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Fields submitted when creating a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub username: String,
    pub email: String,
    pub current_temp: Option<f64>,
}

/// Partial update of an existing location.
///
/// Only fields set to `Some` are written; everything else on the stored
/// document is left as is. The write time is refreshed either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationPatch {
    pub address: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub current_temp: Option<f64>,
}

impl LocationPatch {
    /// General edit: address and contact fields, never the temperature.
    pub fn details(address: String, username: String, email: String) -> Self {
        Self {
            address: Some(address),
            username: Some(username),
            email: Some(email),
            current_temp: None,
        }
    }

    /// Narrow update used by the temperature refresh action.
    pub fn temperature(current_temp: f64) -> Self {
        Self { current_temp: Some(current_temp), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.current_temp.is_none()
    }
}
