//! Application state and the transitions over it.
//!
//! Intents and outcomes go in, effects come out. Nothing in here performs
//! I/O; [`crate::controller::Controller`] runs the effects and feeds the
//! results back through [`AppState::apply`].

use crate::{
    error::{FetchError, StoreError},
    model::{Location, LocationId, LocationPatch, NewLocation},
};

pub const DEFAULT_LATITUDE: f64 = 13.7563;
pub const DEFAULT_LONGITUDE: f64 = 100.5018;

/// Fields of the "new location" form, plus the coordinates used for lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub username: String,
    pub email: String,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            address: String::new(),
            username: String::new(),
            email: String::new(),
        }
    }
}

/// Fields being revised while in edit mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditForm {
    pub address: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Idle,
    Editing(LocationId),
}

/// Status line shown to the user. A new message replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Success(String),
    Error(String),
}

impl Message {
    pub fn text(&self) -> &str {
        match self {
            Message::Success(text) | Message::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Message::Error(_))
    }
}

/// Raw edits to transient fields. Not validated until an action runs.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Latitude(f64),
    Longitude(f64),
    Address(String),
    Username(String),
    Email(String),
    EditAddress(String),
    EditUsername(String),
    EditEmail(String),
}

/// User intents, one per action the presentation layer can trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Edit(FieldEdit),
    LoadLocations,
    LookupWeather,
    AddLocation,
    BeginEdit(LocationId),
    CommitEdit,
    CancelEdit,
    DeleteLocation(LocationId),
    RefreshTemperature { id: LocationId, latitude: f64, longitude: f64 },
}

/// Why a temperature is being fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPurpose {
    /// Standalone lookup for the form coordinates.
    Lookup,
    /// Refresh of a saved location's temperature.
    Refresh(LocationId),
}

/// Remote calls requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchTemperature { latitude: f64, longitude: f64, purpose: FetchPurpose },
    CreateLocation(NewLocation),
    UpdateDetails { id: LocationId, patch: LocationPatch },
    UpdateTemperature { id: LocationId, temperature: f64 },
    DeleteLocation(LocationId),
    ListLocations { token: u64 },
}

/// Results of executed effects.
#[derive(Debug)]
pub enum Outcome {
    TemperatureFetched { purpose: FetchPurpose, result: Result<f64, FetchError> },
    Created { location: NewLocation, result: Result<LocationId, StoreError> },
    DetailsUpdated { id: LocationId, result: Result<(), StoreError> },
    TemperatureStored { id: LocationId, temperature: f64, result: Result<(), StoreError> },
    Deleted { id: LocationId, result: Result<(), StoreError> },
    Listed { token: u64, result: Result<Vec<Location>, StoreError> },
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub form: Form,
    /// Result of the last standalone lookup.
    pub temperature: Option<f64>,
    /// Possibly stale copy of the store, replaced wholesale on every listing.
    pub locations: Vec<Location>,
    pub edit_mode: EditMode,
    pub edit: EditForm,
    pub message: Option<Message>,
    list_token: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token of the most recently issued listing.
    pub fn latest_list_token(&self) -> u64 {
        self.list_token
    }

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| &l.id == id)
    }

    pub fn dispatch(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::Edit(edit) => {
                self.apply_field_edit(edit);
                Vec::new()
            }
            Intent::LoadLocations => vec![self.list_effect()],
            Intent::LookupWeather => vec![Effect::FetchTemperature {
                latitude: self.form.latitude,
                longitude: self.form.longitude,
                purpose: FetchPurpose::Lookup,
            }],
            Intent::AddLocation => self.add_location(),
            Intent::BeginEdit(id) => {
                self.begin_edit(id);
                Vec::new()
            }
            Intent::CommitEdit => self.commit_edit(),
            Intent::CancelEdit => {
                self.exit_edit_mode();
                Vec::new()
            }
            Intent::DeleteLocation(id) => vec![Effect::DeleteLocation(id)],
            Intent::RefreshTemperature { id, latitude, longitude } => {
                vec![Effect::FetchTemperature { latitude, longitude, purpose: FetchPurpose::Refresh(id) }]
            }
        }
    }

    pub fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::TemperatureFetched { purpose, result } => match (purpose, result) {
                (FetchPurpose::Lookup, Ok(temperature)) => {
                    self.temperature = Some(temperature);
                    Vec::new()
                }
                (FetchPurpose::Refresh(id), Ok(temperature)) => {
                    vec![Effect::UpdateTemperature { id, temperature }]
                }
                (_, Err(err)) => self.fail(format!("Could not fetch weather: {err}")),
            },

            Outcome::Created { location, result } => match result {
                Ok(_) => {
                    self.succeed(format!(
                        "Saved {} for {} ({})",
                        location.address, location.username, location.email
                    ));
                    self.form.address.clear();
                    self.form.username.clear();
                    self.form.email.clear();
                    vec![self.list_effect()]
                }
                Err(err) => self.fail(format!("Could not save location: {err}")),
            },

            Outcome::DetailsUpdated { id, result } => match result {
                Ok(()) => {
                    self.succeed("Location updated".to_string());
                    if self.edit_mode == EditMode::Editing(id) {
                        self.exit_edit_mode();
                    }
                    vec![self.list_effect()]
                }
                Err(err) => self.fail(format!("Could not update location: {err}")),
            },

            Outcome::TemperatureStored { id: _, temperature, result } => match result {
                Ok(()) => {
                    self.succeed(format!("Temperature updated to {temperature:.1}°C"));
                    vec![self.list_effect()]
                }
                Err(err) => self.fail(format!("Could not update temperature: {err}")),
            },

            Outcome::Deleted { id, result } => match result {
                Ok(()) => {
                    self.succeed("Location deleted".to_string());
                    if self.edit_mode == EditMode::Editing(id) {
                        self.exit_edit_mode();
                    }
                    vec![self.list_effect()]
                }
                Err(err) => self.fail(format!("Could not delete location: {err}")),
            },

            Outcome::Listed { token, result } => {
                if token < self.list_token {
                    tracing::debug!(token, latest = self.list_token, "discarding stale listing");
                    return Vec::new();
                }
                match result {
                    Ok(locations) => {
                        self.locations = locations;
                        Vec::new()
                    }
                    Err(err) => self.fail(format!("Could not load locations: {err}")),
                }
            }
        }
    }

    fn apply_field_edit(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Latitude(v) => self.form.latitude = v,
            FieldEdit::Longitude(v) => self.form.longitude = v,
            FieldEdit::Address(v) => self.form.address = v,
            FieldEdit::Username(v) => self.form.username = v,
            FieldEdit::Email(v) => self.form.email = v,
            FieldEdit::EditAddress(v) => self.edit.address = v,
            FieldEdit::EditUsername(v) => self.edit.username = v,
            FieldEdit::EditEmail(v) => self.edit.email = v,
        }
    }

    fn add_location(&mut self) -> Vec<Effect> {
        let missing: Vec<&str> = [
            ("address", &self.form.address),
            ("username", &self.form.username),
            ("email", &self.form.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return self.fail(format!("Please fill in {}", missing.join(", ")));
        }

        vec![Effect::CreateLocation(NewLocation {
            latitude: self.form.latitude,
            longitude: self.form.longitude,
            address: self.form.address.clone(),
            username: self.form.username.clone(),
            email: self.form.email.clone(),
            current_temp: self.temperature,
        })]
    }

    fn begin_edit(&mut self, id: LocationId) {
        let Some(location) = self.location(&id) else {
            self.fail(format!("Location {id} is not in the current list"));
            return;
        };

        self.edit = EditForm {
            address: location.address.clone(),
            username: location.username.clone(),
            email: location.email.clone(),
        };
        self.edit_mode = EditMode::Editing(id);
    }

    fn commit_edit(&mut self) -> Vec<Effect> {
        let EditMode::Editing(id) = &self.edit_mode else {
            return self.fail("No location is being edited".to_string());
        };

        if self.edit.address.trim().is_empty() {
            return self.fail("Address must not be empty".to_string());
        }

        vec![Effect::UpdateDetails {
            id: id.clone(),
            patch: LocationPatch::details(
                self.edit.address.clone(),
                self.edit.username.clone(),
                self.edit.email.clone(),
            ),
        }]
    }

    fn exit_edit_mode(&mut self) {
        self.edit_mode = EditMode::Idle;
        self.edit = EditForm::default();
    }

    fn list_effect(&mut self) -> Effect {
        self.list_token += 1;
        Effect::ListLocations { token: self.list_token }
    }

    fn succeed(&mut self, text: String) {
        self.message = Some(Message::Success(text));
    }

    fn fail(&mut self, text: String) -> Vec<Effect> {
        tracing::debug!(%text, "action failed");
        self.message = Some(Message::Error(text));
        Vec::new()
    }
}
