//! REST client for the health model API
//!
//! Fetches entity health states and normalizes the API payloads into
//! [`HealthRecord`]s. Authentication is a caller-supplied bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::models::{HealthRecord, HealthState};
use crate::snapshot::HealthSnapshot;

pub const DEFAULT_BASE_URL: &str = "https://management.azure.com";
pub const DEFAULT_API_VERSION: &str = "2025-05-01-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TIMELINE_HOURS: u32 = 24;
pub const DEFAULT_TIMELINE_INTERVAL_MINUTES: u32 = 5;

/// Entity id of the workload root in the API
pub const ROOT_ENTITY_ID: &str = "root";

/// Where a health model lives and how to reach it
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub subscription_id: String,
    pub resource_group: String,
    pub health_model_name: String,
    pub auth_token: String,
    pub base_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        health_model_name: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            health_model_name: health_model_name.into(),
            auth_token: auth_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Anything that can produce health records
///
/// Implemented by the REST client and by an in-memory [`HealthSnapshot`],
/// so the same aggregation code runs online and offline.
#[async_trait]
pub trait HealthSource: Send + Sync {
    /// Health of every entity the source knows about
    async fn fetch_all(&self) -> Result<HealthSnapshot, ApiError>;

    /// Current health of one entity
    async fn fetch_entity(&self, entity_id: &str) -> Result<HealthRecord, ApiError>;

    /// Health history of one entity; empty when the source keeps none
    async fn fetch_timeline(
        &self,
        _entity_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _interval_minutes: u32,
    ) -> Result<Vec<HealthRecord>, ApiError> {
        Ok(Vec::new())
    }
}

/// Health model REST API client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HealthStateClient {
    client: Client,
    settings: ApiSettings,
}

impl HealthStateClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        // Fail early on a base URL we cannot build paths on
        Self::model_url(&settings, &[])?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.auth_token))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn model_url(settings: &ApiSettings, endpoint: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&settings.base_url)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                settings.subscription_id.as_str(),
                "resourceGroups",
                settings.resource_group.as_str(),
                "providers",
                "Microsoft.CloudHealth",
                "healthmodels",
                settings.health_model_name.as_str(),
            ])
            .extend(endpoint);
        Ok(url)
    }

    async fn get_json(
        &self,
        endpoint: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let url = Self::model_url(&self.settings, endpoint)?;
        let url_str = url.to_string();
        debug!(url = %url_str, "GET health model endpoint");

        let response = self
            .client
            .get(url)
            .query(&[("api-version", self.settings.api_version.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url_str.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                url: url_str,
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|source| ApiError::Decode { url: url_str, source })
    }

    /// Health state of one entity, optionally at a past point in time
    pub async fn entity_health(
        &self,
        entity_id: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<HealthRecord, ApiError> {
        let query: Vec<_> = at.map(|t| ("timestamp", t.to_rfc3339())).into_iter().collect();
        let data = self.get_json(&["entities", entity_id], &query).await?;

        let mut record = normalize(&data);
        record.entity_id.get_or_insert_with(|| entity_id.to_string());
        Ok(record)
    }

    /// Health state of the workload root entity
    pub async fn root_health(&self, at: Option<DateTime<Utc>>) -> Result<HealthRecord, ApiError> {
        self.entity_health(ROOT_ENTITY_ID, at).await
    }

    /// Health states of one entity over a time range
    ///
    /// `start` defaults to 24 hours before `end`, `end` to now.
    pub async fn entity_timeline(
        &self,
        entity_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        interval_minutes: u32,
    ) -> Result<Vec<HealthRecord>, ApiError> {
        let end = end.unwrap_or_else(Utc::now);
        let start = start.unwrap_or(end - Duration::hours(i64::from(DEFAULT_TIMELINE_HOURS)));
        let query = [
            ("startTime", start.to_rfc3339()),
            ("endTime", end.to_rfc3339()),
            ("intervalMinutes", interval_minutes.to_string()),
        ];
        let data = self
            .get_json(&["entities", entity_id, "timeline"], &query)
            .await?;

        Ok(items(&data, "values").map(normalize).collect())
    }

    /// Health states of every entity in the model, in API order
    pub async fn all_entities_health(
        &self,
        at: Option<DateTime<Utc>>,
    ) -> Result<HealthSnapshot, ApiError> {
        let query: Vec<_> = at.map(|t| ("timestamp", t.to_rfc3339())).into_iter().collect();
        let data = self.get_json(&["entities"], &query).await?;

        let mut snapshot = HealthSnapshot::new();
        for item in items(&data, "value") {
            match item.get("id").and_then(Value::as_str) {
                Some(id) => snapshot.insert(id, normalize(item)),
                None => debug!("Skipping entity without id in API response"),
            }
        }
        Ok(snapshot)
    }

    /// Fetch several entities concurrently
    ///
    /// The snapshot is keyed and ordered by `entity_ids`. An entity whose
    /// fetch fails gets an `Unknown` record carrying the error.
    pub async fn entities_health(&self, entity_ids: &[String]) -> HealthSnapshot {
        let mut tasks = JoinSet::new();
        for (index, entity_id) in entity_ids.iter().enumerate() {
            let client = self.clone();
            let entity_id = entity_id.clone();
            tasks.spawn(async move {
                let result = client.entity_health(&entity_id, None).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<HealthRecord>> = vec![None; entity_ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(record))) => results[index] = Some(record),
                Ok((index, Err(e))) => {
                    warn!(
                        event = "entity_fetch_failed",
                        entity_id = %entity_ids[index],
                        error = %e,
                        "Failed to fetch entity health"
                    );
                    results[index] = Some(HealthRecord::from_error(&entity_ids[index], e.to_string()));
                }
                Err(e) => warn!(error = %e, "Entity fetch task failed"),
            }
        }

        entity_ids
            .iter()
            .zip(results)
            .map(|(id, record)| {
                let record = record
                    .unwrap_or_else(|| HealthRecord::from_error(id, "fetch task did not complete"));
                (id.clone(), record)
            })
            .collect()
    }
}

#[async_trait]
impl HealthSource for HealthStateClient {
    async fn fetch_all(&self) -> Result<HealthSnapshot, ApiError> {
        self.all_entities_health(None).await
    }

    async fn fetch_entity(&self, entity_id: &str) -> Result<HealthRecord, ApiError> {
        self.entity_health(entity_id, None).await
    }

    async fn fetch_timeline(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: u32,
    ) -> Result<Vec<HealthRecord>, ApiError> {
        self.entity_timeline(entity_id, Some(start), Some(end), interval_minutes)
            .await
    }
}

#[async_trait]
impl<T: HealthSource + ?Sized> HealthSource for Box<T> {
    async fn fetch_all(&self) -> Result<HealthSnapshot, ApiError> {
        (**self).fetch_all().await
    }

    async fn fetch_entity(&self, entity_id: &str) -> Result<HealthRecord, ApiError> {
        (**self).fetch_entity(entity_id).await
    }

    async fn fetch_timeline(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: u32,
    ) -> Result<Vec<HealthRecord>, ApiError> {
        (**self)
            .fetch_timeline(entity_id, start, end, interval_minutes)
            .await
    }
}

#[async_trait]
impl HealthSource for HealthSnapshot {
    async fn fetch_all(&self) -> Result<HealthSnapshot, ApiError> {
        Ok(self.clone())
    }

    async fn fetch_entity(&self, entity_id: &str) -> Result<HealthRecord, ApiError> {
        Ok(self.record_for(entity_id))
    }
}

fn items<'a>(data: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|v| v.as_slice())
        .unwrap_or_default()
        .iter()
}

/// Map an API entity payload to a [`HealthRecord`]
///
/// Unrecognized or missing states become `Unknown`. A missing timestamp is
/// replaced with the current time.
pub fn normalize(data: &Value) -> HealthRecord {
    let properties = data
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);

    let state = properties
        .get("healthState")
        .and_then(Value::as_str)
        .map(HealthState::parse)
        .unwrap_or_default();

    let mut record = HealthRecord::placeholder();
    record.set_state(state);
    record.entity_id = data.get("id").and_then(Value::as_str).map(String::from);
    record.entity_name = data.get("name").and_then(Value::as_str).map(String::from);
    record.timestamp = Some(
        properties
            .get("timestamp")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    );
    record.signals = properties
        .get("signals")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    record.details = properties;
    record
}
