//! Drives [`AppState`] against the weather provider and the location store.

use std::{collections::VecDeque, sync::Arc};

use tracing::instrument;

use crate::{
    model::{LocationId, LocationPatch},
    provider::WeatherProvider,
    state::{AppState, Effect, FieldEdit, Intent, Outcome},
    store::LocationStore,
};

/// Owns the application state and executes the effects its transitions
/// request, one at a time and in issue order.
#[derive(Debug)]
pub struct Controller {
    state: AppState,
    weather: Arc<dyn WeatherProvider>,
    store: Arc<dyn LocationStore>,
}

impl Controller {
    pub fn new(weather: Arc<dyn WeatherProvider>, store: Arc<dyn LocationStore>) -> Self {
        Self { state: AppState::new(), weather, store }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply one intent and run every effect it leads to.
    #[instrument(skip(self), level = "debug")]
    pub async fn dispatch(&mut self, intent: Intent) {
        let mut queue: VecDeque<Effect> = self.state.dispatch(intent).into();

        while let Some(effect) = queue.pop_front() {
            let outcome = self.execute(effect).await;
            queue.extend(self.state.apply(outcome));
        }
    }

    pub async fn edit_field(&mut self, edit: FieldEdit) {
        self.dispatch(Intent::Edit(edit)).await;
    }

    pub async fn load_locations(&mut self) {
        self.dispatch(Intent::LoadLocations).await;
    }

    pub async fn lookup_weather(&mut self) {
        self.dispatch(Intent::LookupWeather).await;
    }

    pub async fn add_location(&mut self) {
        self.dispatch(Intent::AddLocation).await;
    }

    pub async fn begin_edit(&mut self, id: LocationId) {
        self.dispatch(Intent::BeginEdit(id)).await;
    }

    pub async fn commit_edit(&mut self) {
        self.dispatch(Intent::CommitEdit).await;
    }

    pub async fn cancel_edit(&mut self) {
        self.dispatch(Intent::CancelEdit).await;
    }

    pub async fn delete_location(&mut self, id: LocationId) {
        self.dispatch(Intent::DeleteLocation(id)).await;
    }

    pub async fn refresh_location_temperature(&mut self, id: LocationId, latitude: f64, longitude: f64) {
        self.dispatch(Intent::RefreshTemperature { id, latitude, longitude }).await;
    }

    async fn execute(&self, effect: Effect) -> Outcome {
        tracing::debug!(?effect, "executing effect");

        match effect {
            Effect::FetchTemperature { latitude, longitude, purpose } => {
                let result = self.weather.fetch_temperature(latitude, longitude).await;
                Outcome::TemperatureFetched { purpose, result }
            }
            Effect::CreateLocation(location) => {
                let result = self.store.create(&location).await;
                Outcome::Created { location, result }
            }
            Effect::UpdateDetails { id, patch } => {
                let result = self.store.update(&id, &patch).await;
                Outcome::DetailsUpdated { id, result }
            }
            Effect::UpdateTemperature { id, temperature } => {
                let result = self.store.update(&id, &LocationPatch::temperature(temperature)).await;
                Outcome::TemperatureStored { id, temperature, result }
            }
            Effect::DeleteLocation(id) => {
                let result = self.store.delete(&id).await;
                Outcome::Deleted { id, result }
            }
            Effect::ListLocations { token } => {
                let result = self.store.list_all().await;
                Outcome::Listed { token, result }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FetchError, StoreError},
        model::{Location, NewLocation},
        state::EditMode,
    };
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    #[derive(Debug, Default)]
    struct FakeWeather {
        temperature: Mutex<Option<f64>>,
        calls: AtomicUsize,
    }

    impl FakeWeather {
        fn returning(temperature: f64) -> Self {
            Self { temperature: Mutex::new(Some(temperature)), ..Self::default() }
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn fetch_temperature(&self, _: f64, _: f64) -> Result<f64, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.temperature.lock().unwrap().ok_or(FetchError::MissingTemperature)
        }
    }

    #[derive(Debug, Default)]
    struct FakeStore {
        docs: Mutex<Vec<Location>>,
        created: Mutex<Vec<NewLocation>>,
        next_id: AtomicUsize,
        fail_writes: AtomicBool,
        list_calls: AtomicUsize,
        write_calls: AtomicUsize,
    }

    impl FakeStore {
        fn writes(&self) -> usize {
            self.write_calls.load(Ordering::SeqCst)
        }

        fn lists(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        fn rejection(&self) -> Option<StoreError> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.fail_writes
                .load(Ordering::SeqCst)
                .then(|| StoreError::Rejected { status: 503, message: "backend unavailable".into() })
        }
    }

    #[async_trait]
    impl LocationStore for FakeStore {
        async fn list_all(&self) -> Result<Vec<Location>, StoreError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.docs.lock().unwrap().clone())
        }

        async fn create(&self, location: &NewLocation) -> Result<LocationId, StoreError> {
            if let Some(err) = self.rejection() {
                return Err(err);
            }
            let id = LocationId::new(format!("loc-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
            self.created.lock().unwrap().push(location.clone());
            self.docs.lock().unwrap().push(Location {
                id: id.clone(),
                latitude: location.latitude,
                longitude: location.longitude,
                address: location.address.clone(),
                username: location.username.clone(),
                email: location.email.clone(),
                current_temp: location.current_temp,
                timestamp: Some(chrono::Utc::now()),
            });
            Ok(id)
        }

        async fn update(&self, id: &LocationId, patch: &LocationPatch) -> Result<(), StoreError> {
            if let Some(err) = self.rejection() {
                return Err(err);
            }
            let mut docs = self.docs.lock().unwrap();
            let doc = docs
                .iter_mut()
                .find(|d| &d.id == id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            if let Some(address) = &patch.address {
                doc.address = address.clone();
            }
            if let Some(username) = &patch.username {
                doc.username = username.clone();
            }
            if let Some(email) = &patch.email {
                doc.email = email.clone();
            }
            if let Some(temp) = patch.current_temp {
                doc.current_temp = Some(temp);
            }
            doc.timestamp = Some(chrono::Utc::now());
            Ok(())
        }

        async fn delete(&self, id: &LocationId) -> Result<(), StoreError> {
            if let Some(err) = self.rejection() {
                return Err(err);
            }
            self.docs.lock().unwrap().retain(|d| &d.id != id);
            Ok(())
        }
    }

    fn controller(weather: FakeWeather) -> (Controller, Arc<FakeWeather>, Arc<FakeStore>) {
        let weather = Arc::new(weather);
        let store = Arc::new(FakeStore::default());
        (Controller::new(weather.clone(), store.clone()), weather, store)
    }

    async fn fill_form(ctl: &mut Controller, address: &str, username: &str, email: &str) {
        ctl.edit_field(FieldEdit::Address(address.into())).await;
        ctl.edit_field(FieldEdit::Username(username.into())).await;
        ctl.edit_field(FieldEdit::Email(email.into())).await;
    }

    async fn add_bangkok(ctl: &mut Controller) -> LocationId {
        ctl.edit_field(FieldEdit::Latitude(13.7563)).await;
        ctl.edit_field(FieldEdit::Longitude(100.5018)).await;
        fill_form(ctl, "Bangkok", "eka", "eka@example.com").await;
        ctl.add_location().await;
        ctl.state().locations.last().expect("listed after add").id.clone()
    }

    #[tokio::test]
    async fn add_with_blank_fields_never_calls_store() {
        let (mut ctl, _, store) = controller(FakeWeather::default());

        for (address, username, email) in
            [("", "eka", "e@x.io"), ("Bangkok", "  ", "e@x.io"), ("Bangkok", "eka", "\t")]
        {
            fill_form(&mut ctl, address, username, email).await;
            ctl.add_location().await;
            assert!(ctl.state().message.as_ref().is_some_and(|m| m.is_error()));
        }

        assert_eq!(store.writes(), 0);
        assert_eq!(store.lists(), 0);
    }

    #[tokio::test]
    async fn add_creates_once_clears_fields_and_relists() {
        let (mut ctl, _, store) = controller(FakeWeather::default());
        fill_form(&mut ctl, "Bangkok", "eka", "eka@example.com").await;
        let lists_before = store.lists();

        ctl.add_location().await;

        assert_eq!(store.writes(), 1);
        assert!(store.lists() > lists_before);
        let state = ctl.state();
        assert!(state.form.address.is_empty());
        assert!(state.form.username.is_empty());
        assert!(state.form.email.is_empty());
        let msg = state.message.as_ref().expect("success message");
        assert!(!msg.is_error());
        assert!(msg.text().contains("Bangkok"));
        assert!(msg.text().contains("eka@example.com"));
    }

    #[tokio::test]
    async fn bangkok_without_lookup_is_stored_with_null_temperature() {
        let (mut ctl, weather, store) = controller(FakeWeather::default());

        let id = add_bangkok(&mut ctl).await;

        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.created.lock().unwrap()[0].current_temp, None);

        let listed = ctl.state().location(&id).expect("record listed");
        assert!(!listed.id.as_str().is_empty());
        assert_eq!(listed.latitude, 13.7563);
        assert_eq!(listed.longitude, 100.5018);
        assert_eq!(listed.address, "Bangkok");
        assert_eq!(listed.username, "eka");
        assert_eq!(listed.email, "eka@example.com");
        assert_eq!(listed.current_temp, None);
    }

    #[tokio::test]
    async fn lookup_then_add_stores_fetched_temperature() {
        let (mut ctl, weather, store) = controller(FakeWeather::returning(32.1));

        ctl.lookup_weather().await;
        assert_eq!(ctl.state().temperature, Some(32.1));
        add_bangkok(&mut ctl).await;

        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.created.lock().unwrap()[0].current_temp, Some(32.1));
    }

    #[tokio::test]
    async fn failed_lookup_surfaces_error() {
        let (mut ctl, _, _) = controller(FakeWeather::default());

        ctl.lookup_weather().await;

        assert_eq!(ctl.state().temperature, None);
        let msg = ctl.state().message.as_ref().expect("error message");
        assert!(msg.is_error());
        assert!(msg.text().contains("no current temperature"));
    }

    #[tokio::test]
    async fn failed_add_keeps_fields_for_retry() {
        let (mut ctl, _, store) = controller(FakeWeather::default());
        store.fail_writes.store(true, Ordering::SeqCst);
        fill_form(&mut ctl, "Bangkok", "eka", "eka@example.com").await;

        ctl.add_location().await;

        assert_eq!(ctl.state().form.address, "Bangkok");
        let msg = ctl.state().message.as_ref().expect("error message");
        assert!(msg.is_error());
        assert!(msg.text().contains("backend unavailable"));
        assert_eq!(store.lists(), 0);
    }

    #[tokio::test]
    async fn begin_edit_prefills_and_cancel_makes_no_store_call() {
        let (mut ctl, _, store) = controller(FakeWeather::default());
        let id = add_bangkok(&mut ctl).await;
        let writes = store.writes();
        let lists = store.lists();

        ctl.begin_edit(id.clone()).await;
        assert_eq!(ctl.state().edit_mode, EditMode::Editing(id));
        assert_eq!(ctl.state().edit.address, "Bangkok");
        assert_eq!(ctl.state().edit.username, "eka");

        ctl.cancel_edit().await;
        assert_eq!(ctl.state().edit_mode, EditMode::Idle);
        assert_eq!(store.writes(), writes);
        assert_eq!(store.lists(), lists);
    }

    #[tokio::test]
    async fn commit_with_empty_address_never_calls_store() {
        let (mut ctl, _, store) = controller(FakeWeather::default());
        let id = add_bangkok(&mut ctl).await;
        let writes = store.writes();

        ctl.begin_edit(id.clone()).await;
        ctl.edit_field(FieldEdit::EditAddress(String::new())).await;
        ctl.commit_edit().await;

        assert_eq!(store.writes(), writes);
        assert_eq!(ctl.state().edit_mode, EditMode::Editing(id));
    }

    #[tokio::test]
    async fn commit_updates_details_and_returns_to_idle() {
        let (mut ctl, _, store) = controller(FakeWeather::returning(30.0));
        ctl.lookup_weather().await;
        let id = add_bangkok(&mut ctl).await;

        ctl.begin_edit(id.clone()).await;
        ctl.edit_field(FieldEdit::EditAddress("Krung Thep".into())).await;
        ctl.edit_field(FieldEdit::EditEmail("eka@example.org".into())).await;
        ctl.commit_edit().await;

        let state = ctl.state();
        assert_eq!(state.edit_mode, EditMode::Idle);
        assert!(state.edit.address.is_empty() && state.edit.email.is_empty());
        let listed = state.location(&id).expect("still listed");
        assert_eq!(listed.address, "Krung Thep");
        assert_eq!(listed.email, "eka@example.org");
        assert_eq!(listed.current_temp, Some(30.0));
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn failed_commit_stays_in_edit_mode() {
        let (mut ctl, _, store) = controller(FakeWeather::default());
        let id = add_bangkok(&mut ctl).await;
        ctl.begin_edit(id.clone()).await;
        ctl.edit_field(FieldEdit::EditAddress("Krung Thep".into())).await;
        store.fail_writes.store(true, Ordering::SeqCst);

        ctl.commit_edit().await;

        assert_eq!(ctl.state().edit_mode, EditMode::Editing(id));
        assert_eq!(ctl.state().edit.address, "Krung Thep");
        assert!(ctl.state().message.as_ref().is_some_and(|m| m.is_error()));
    }

    #[tokio::test]
    async fn deleted_record_is_not_listed_again() {
        let (mut ctl, _, _) = controller(FakeWeather::default());
        let id = add_bangkok(&mut ctl).await;

        ctl.delete_location(id.clone()).await;

        assert!(ctl.state().location(&id).is_none());
        ctl.load_locations().await;
        assert!(ctl.state().location(&id).is_none());
        assert_eq!(ctl.state().message.as_ref().map(|m| m.text()), Some("Location deleted"));
    }

    #[tokio::test]
    async fn failed_delete_keeps_record_and_skips_listing() {
        let (mut ctl, _, store) = controller(FakeWeather::default());
        let id = add_bangkok(&mut ctl).await;
        let lists_before = store.lists();
        store.fail_writes.store(true, Ordering::SeqCst);

        ctl.delete_location(id.clone()).await;

        let msg = ctl.state().message.as_ref().expect("error message");
        assert!(msg.is_error());
        assert!(msg.text().starts_with("Could not delete location"));
        assert_eq!(store.lists(), lists_before);
        assert!(ctl.state().location(&id).is_some());
    }

    #[tokio::test]
    async fn refresh_changes_only_temperature() {
        let (mut ctl, weather, _) = controller(FakeWeather::default());
        let id = add_bangkok(&mut ctl).await;
        let before = ctl.state().location(&id).cloned().expect("listed");

        *weather.temperature.lock().unwrap() = Some(27.5);
        ctl.refresh_location_temperature(id.clone(), before.latitude, before.longitude).await;

        let after = ctl.state().location(&id).cloned().expect("listed");
        assert_eq!(after.current_temp, Some(27.5));
        assert_eq!(after.address, before.address);
        assert_eq!(after.username, before.username);
        assert_eq!(after.email, before.email);
        assert_eq!(after.latitude, before.latitude);
        assert_eq!(after.longitude, before.longitude);
        assert_eq!(ctl.state().edit_mode, EditMode::Idle);
        assert_eq!(ctl.state().temperature, None);
    }

    #[tokio::test]
    async fn refresh_of_missing_record_reports_not_found() {
        let (mut ctl, _, _) = controller(FakeWeather::returning(20.0));

        ctl.refresh_location_temperature(LocationId::from("ghost"), 0.0, 0.0).await;

        let msg = ctl.state().message.as_ref().expect("error message");
        assert!(msg.is_error());
        assert!(msg.text().contains("ghost"));
    }
}
