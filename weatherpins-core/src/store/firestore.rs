//! Cloud Firestore REST (v1) backend for saved locations.
//!
//! Writes go through `documents:commit` so that the `timestamp` field can be
//! stamped server-side with `REQUEST_TIME`, the same way the client SDKs
//! implement server timestamps. New document ids are generated client-side.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::{
    config::StoreSettings,
    error::{StoreError, truncate_body},
    model::{Location, LocationId, LocationPatch, NewLocation},
};

use super::LocationStore;

const TIMESTAMP_FIELD: &str = "timestamp";

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    settings: StoreSettings,
    http: Client,
}

impl FirestoreStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self { settings, http: Client::new() }
    }

    /// `projects/{p}/databases/{db}/documents`, the prefix of every document name.
    fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.settings.project_id, self.settings.database
        )
    }

    fn document_name(&self, id: &LocationId) -> String {
        format!("{}/{}/{}", self.documents_path(), self.settings.collection, id)
    }

    fn collection_url(&self) -> String {
        format!("{}/{}/{}", self.settings.base_url, self.documents_path(), self.settings.collection)
    }

    fn commit_url(&self) -> String {
        format!("{}/{}:commit", self.settings.base_url, self.documents_path())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(key) = &self.settings.api_key {
            req = req.query(&[("key", key.as_str())]);
        }
        if let Some(token) = &self.settings.access_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn commit(&self, write: Value, id: &LocationId) -> Result<(), StoreError> {
        let res = self
            .request(Method::POST, &self.commit_url())
            .json(&json!({ "writes": [write] }))
            .send()
            .await?;

        read_body(res, Some(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl LocationStore for FirestoreStore {
    #[instrument(skip(self), level = "debug")]
    async fn list_all(&self) -> Result<Vec<Location>, StoreError> {
        let url = self.collection_url();
        let mut locations = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.request(Method::GET, &url);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let body = read_body(req.send().await?, None).await?;
            let page: FsListResponse = serde_json::from_str(&body)?;

            for doc in page.documents {
                match doc.into_location() {
                    Ok(location) => locations.push(location),
                    Err(err) => tracing::warn!(%err, "skipping undecodable document"),
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(count = locations.len(), "listed locations");
        Ok(locations)
    }

    #[instrument(skip(self, location), level = "debug", fields(address = %location.address))]
    async fn create(&self, location: &NewLocation) -> Result<LocationId, StoreError> {
        let id = LocationId::new(uuid::Uuid::new_v4().simple().to_string());

        let fields = json!({
            "latitude": double_value(location.latitude),
            "longitude": double_value(location.longitude),
            "address": string_value(&location.address),
            "username": string_value(&location.username),
            "email": string_value(&location.email),
            "currentTemp": optional_double_value(location.current_temp),
        });

        let write = json!({
            "update": { "name": self.document_name(&id), "fields": fields },
            "currentDocument": { "exists": false },
            "updateTransforms": [server_timestamp()],
        });

        self.commit(write, &id).await?;
        tracing::info!(%id, "created location");
        Ok(id)
    }

    #[instrument(skip(self, patch), level = "debug")]
    async fn update(&self, id: &LocationId, patch: &LocationPatch) -> Result<(), StoreError> {
        id.validate()?;
        let mut fields = serde_json::Map::new();
        if let Some(address) = &patch.address {
            fields.insert("address".into(), string_value(address));
        }
        if let Some(username) = &patch.username {
            fields.insert("username".into(), string_value(username));
        }
        if let Some(email) = &patch.email {
            fields.insert("email".into(), string_value(email));
        }
        if let Some(temp) = patch.current_temp {
            fields.insert("currentTemp".into(), double_value(temp));
        }
        let field_paths: Vec<&String> = fields.keys().collect();

        let write = json!({
            "update": { "name": self.document_name(id), "fields": &fields },
            "updateMask": { "fieldPaths": field_paths },
            "currentDocument": { "exists": true },
            "updateTransforms": [server_timestamp()],
        });

        self.commit(write, id).await?;
        tracing::info!(%id, "updated location");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, id: &LocationId) -> Result<(), StoreError> {
        id.validate()?;
        let url = format!("{}/{}", self.collection_url(), id);
        let res = self.request(Method::DELETE, &url).send().await?;
        read_body(res, Some(id)).await?;

        tracing::info!(%id, "deleted location");
        Ok(())
    }
}

/// Returns the body of a successful response, or maps the failure.
async fn read_body(res: Response, id: Option<&LocationId>) -> Result<String, StoreError> {
    let status = res.status();
    let body = res.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let envelope = serde_json::from_str::<FsErrorEnvelope>(&body).ok();
    let not_found = status.as_u16() == 404
        || envelope.as_ref().is_some_and(|e| e.error.status.as_deref() == Some("NOT_FOUND"));

    if let (true, Some(id)) = (not_found, id) {
        return Err(StoreError::NotFound(id.clone()));
    }

    let message = envelope
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| truncate_body(&body));

    tracing::debug!(%status, %message, "store request rejected");
    Err(StoreError::Rejected { status: status.as_u16(), message })
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn double_value(value: f64) -> Value {
    json!({ "doubleValue": value })
}

fn optional_double_value(value: Option<f64>) -> Value {
    match value {
        Some(v) => double_value(v),
        None => json!({ "nullValue": null }),
    }
}

fn server_timestamp() -> Value {
    json!({ "fieldPath": TIMESTAMP_FIELD, "setToServerValue": "REQUEST_TIME" })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FsListResponse {
    #[serde(default)]
    documents: Vec<FsDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FsDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FsErrorEnvelope {
    error: FsError,
}

#[derive(Debug, Deserialize)]
struct FsError {
    message: Option<String>,
    status: Option<String>,
}

impl FsDocument {
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn string(&self, key: &str) -> String {
        self.fields
            .get(key)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Numbers may be stored as doubles, (string-encoded) integers, or as
    /// plain strings written by form-based clients.
    fn number(&self, key: &str) -> Option<f64> {
        let value = self.fields.get(key)?;
        if let Some(d) = value.get("doubleValue") {
            return d.as_f64().or_else(|| d.as_str().and_then(|s| s.parse().ok()));
        }
        if let Some(int) = value.get("integerValue") {
            return int
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .or_else(|| int.as_i64())
                .map(|i| i as f64);
        }
        value
            .get("stringValue")?
            .as_str()?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.fields.get(key)?.get("timestampValue")?.as_str()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
    }

    fn into_location(self) -> Result<Location, StoreError> {
        let coordinate = |key: &str| {
            self.number(key).ok_or_else(|| StoreError::InvalidDocument {
                id: self.id().to_string(),
                reason: format!("missing numeric `{key}`"),
            })
        };

        Ok(Location {
            id: LocationId::new(self.id()),
            latitude: coordinate("latitude")?,
            longitude: coordinate("longitude")?,
            address: self.string("address"),
            username: self.string("username"),
            email: self.string("email"),
            current_temp: self.number("currentTemp"),
            timestamp: self.timestamp(TIMESTAMP_FIELD),
        })
    }
}
