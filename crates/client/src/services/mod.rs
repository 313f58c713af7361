//! REST data services for CampEase resources.
//!
//! Each resource maps the backend's inconsistent field casing onto one
//! canonical model through serde aliases. Services are plain request/response
//! mappers: no retries, no caching.

use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::http::{ApiClient, ApiError};

pub mod blogs;
pub mod camps;
pub mod notifications;
pub mod vehicles;

pub use blogs::{Blog, BlogDraft, BlogService, Blogs};
pub use camps::{Camp, CampDraft, CampService, Camps};
pub use notifications::{Notification, NotificationService};
pub use vehicles::{Vehicle, VehicleDraft, VehicleService, Vehicles};

/// A CRUD resource exposed under a single collection path.
pub trait Resource {
    /// Collection path, e.g. `/api/camps`.
    const PATH: &'static str;

    type Model: DeserializeOwned + Send;
    type Draft: Serialize + Sync;
}

pub struct ResourceService<R> {
    client: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub async fn list(&self) -> Result<Vec<R::Model>, ApiError> {
        let list: ListResponse<R::Model> = self.client.get_json(R::PATH).await?;
        Ok(list.into_vec())
    }

    pub async fn get(&self, id: i64) -> Result<R::Model, ApiError> {
        self.client.get_json(&item_path(R::PATH, id)).await
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<R::Model, ApiError> {
        self.client.post_json(R::PATH, draft).await
    }

    /// Some endpoints answer an update with `204 No Content`; that yields `None`.
    pub async fn update(&self, id: i64, draft: &R::Draft) -> Result<Option<R::Model>, ApiError> {
        self.client.put_json(&item_path(R::PATH, id), draft).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(R::PATH, id)).await
    }
}

fn item_path(collection: &str, id: i64) -> String {
    format!("{collection}/{id}")
}

/// Collections come back bare or wrapped, depending on the endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "Data", alias = "items", alias = "Items", alias = "$values")]
        data: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) | ListResponse::Wrapped { data: items } => items,
        }
    }
}

/// Accepts `2025-07-01`, `2025-07-01T00:00:00` and RFC 3339 timestamps.
pub(crate) fn flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid date '{raw}': {e}")))
}

/// Accepts RFC 3339 or offset-less timestamps (read as UTC).
pub(crate) fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Dated {
        #[serde(default, deserialize_with = "flexible_date")]
        day: Option<NaiveDate>,
        #[serde(default, deserialize_with = "flexible_timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn list_accepts_bare_and_wrapped_shapes() {
        let bare: ListResponse<i32> = serde_json::from_value(json!([1, 2])).unwrap();
        let wrapped: ListResponse<i32> = serde_json::from_value(json!({ "data": [3] })).unwrap();
        let dotnet: ListResponse<i32> = serde_json::from_value(json!({ "$values": [4, 5] })).unwrap();

        assert_eq!(bare.into_vec(), [1, 2]);
        assert_eq!(wrapped.into_vec(), [3]);
        assert_eq!(dotnet.into_vec(), [4, 5]);
    }

    #[test]
    fn dates_accept_several_shapes() {
        let d: Dated = serde_json::from_value(json!({
            "day": "2025-07-01T00:00:00",
            "at": "2025-07-01T08:30:00"
        }))
        .unwrap();
        assert_eq!(d.day, NaiveDate::from_ymd_opt(2025, 7, 1));
        assert_eq!(d.at.unwrap().to_rfc3339(), "2025-07-01T08:30:00+00:00");

        let d: Dated = serde_json::from_value(json!({ "day": null, "at": "2025-07-01T08:30:00+02:00" })).unwrap();
        assert_eq!(d.day, None);
        assert_eq!(d.at.unwrap().to_rfc3339(), "2025-07-01T06:30:00+00:00");

        let d: Dated = serde_json::from_value(json!({})).unwrap();
        assert!(d.day.is_none() && d.at.is_none());
    }

    #[test]
    fn item_paths_append_id() {
        assert_eq!(item_path("/api/camps", 12), "/api/camps/12");
    }
}
