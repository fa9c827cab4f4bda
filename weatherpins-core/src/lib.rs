//! Core library for the `weatherpins` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider client (current temperature by coordinates)
//! - The document store client for saved locations
//! - Application state, its transitions, and the controller that drives them
//!
//! It is used by `weatherpins-cli`, but can also be reused by other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod state;
pub mod store;

pub use config::{Config, StoreConfig, StoreSettings, WeatherConfig};
pub use controller::Controller;
pub use error::{FetchError, StoreError};
pub use model::{InvalidLocationId, Location, LocationId, LocationPatch, NewLocation};
pub use provider::{WeatherProvider, openmeteo::OpenMeteoProvider};
pub use state::{AppState, EditMode, FieldEdit, Intent, Message};
pub use store::{LocationStore, firestore::FirestoreStore};
